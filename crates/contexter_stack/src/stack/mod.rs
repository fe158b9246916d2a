//! The resource stack manager.
//!
//! [`Contexter`] keeps a stack of scopes. Each [`activate`](Contexter::activate)
//! pushes a scope, resources registered afterwards land in it, and
//! [`deactivate`](Contexter::deactivate) pops it and releases its resources
//! in reverse registration order.
//!
//! # Error Propagation
//!
//! Releasing a scope starts from the error passed to `deactivate` (the body
//! error) and walks the entries newest-first:
//!
//! | Step outcome | Effect on the pending error |
//! |--------------|-----------------------------|
//! | `exit` returns `Ok(true)` | Cleared |
//! | `exit` returns `Ok(false)`, `close` returns `Ok(())` | Unchanged |
//! | Any `Err(e)` | Replaced by `e`, even after a clear |
//!
//! Every entry is released even when earlier steps fail. Whatever error is
//! pending at the end is returned.
//!
//! # Example
//!
//! ```
//! use contexter_stack::resource::Callback;
//! use contexter_stack::stack::Contexter;
//!
//! let mut stack = Contexter::default();
//! let outcome = stack.scope(|stack| {
//!     stack.register(Callback::new(|| Ok(())))?;
//!     stack.register(Callback::new(|| Ok(())))?;
//!     assert_eq!(stack.len(), 2);
//!     Ok("done")
//! });
//!
//! assert_eq!(outcome.unwrap(), Some("done"));
//! assert!(!stack.is_active());
//! ```

mod release;
mod view;

use crate::error::{BoxError, StackError};
use crate::resource::{
    Callback, Close, Closing, ContextManager, ExitCallback, IntoResource, IntoResources, Managed,
    ResourceHandle,
};
use core::any::Any;
use release::{Entry, Released, Scope};
use std::borrow::Cow;

/// Alias matching the callback-oriented naming of the stack's helpers.
pub type ExitStack = Contexter;

/// Resources supplied at construction, entered once at first activation.
#[derive(Default)]
struct Prepared {
    handles: Vec<Result<ResourceHandle, StackError>>,
    consumed: bool,
}

impl Prepared {
    fn consumed() -> Self {
        Self {
            handles: Vec::new(),
            consumed: true,
        }
    }

    /// Drains the list, or returns `None` if it was already drained.
    fn take(&mut self) -> Option<Vec<Result<ResourceHandle, StackError>>> {
        if self.consumed {
            return None;
        }
        self.consumed = true;
        Some(core::mem::take(&mut self.handles))
    }
}

/// A dynamic stack of scoped resources.
///
/// See the [module documentation](self) for the release algorithm.
///
/// # Reuse
///
/// Activating an already active stack pushes another scope, so the same
/// instance can be used in nested contexts; each deactivation only releases
/// the innermost scope. Resources passed to [`Contexter::new`] are entered
/// on the first activation only.
///
/// # Drop
///
/// Dropping a stack that still holds scopes releases them innermost-first
/// with no incoming error. Errors raised at that point cannot propagate
/// and are logged instead.
#[derive(Default)]
pub struct Contexter {
    label: Option<Cow<'static, str>>,
    prepared: Prepared,
    scopes: Vec<Scope>,
}

impl Contexter {
    /// Creates an inactive stack holding `resources` unentered.
    ///
    /// Accepts a single resource, a tuple or `Vec` of resources, or `()`.
    #[must_use]
    pub fn new(resources: impl IntoResources) -> Self {
        Self {
            label: None,
            prepared: Prepared {
                handles: resources.into_resources(),
                consumed: false,
            },
            scopes: Vec::new(),
        }
    }

    /// Attaches a label reported in every tracing event of this stack.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns `true` if at least one scope is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.scopes.is_empty()
    }

    /// Returns the number of active scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Returns the number of entries in the innermost scope, `0` if inactive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.last().map_or(0, Scope::len)
    }

    /// Returns `true` if the innermost scope holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or_default()
    }

    /// Pushes a new scope.
    ///
    /// On the first activation of the stack's lifetime the resources passed
    /// to [`Contexter::new`] are registered into the new scope, in order.
    ///
    /// # Errors
    ///
    /// If a prepared resource cannot be entered, the ones already entered
    /// are released, the scope is popped and the failure is returned. A
    /// cleanup error raised during that release takes its place.
    pub fn activate(&mut self) -> Result<&mut Self, BoxError> {
        self.scopes.push(Scope::default());
        let depth = self.scopes.len();
        tracing::debug!(label = self.label_str(), depth, "scope activated");

        if depth == 1
            && let Some(prepared) = self.prepared.take()
        {
            for handle in prepared {
                if let Err(error) = handle.and_then(|handle| self.register(handle).map(|_| ())) {
                    return Err(self.abort_activation(error));
                }
            }
        }

        Ok(self)
    }

    fn abort_activation(&mut self, error: StackError) -> BoxError {
        let error: BoxError = error.into();
        let scope = self.scopes.pop().unwrap_or_default();
        tracing::debug!(
            label = self.label_str(),
            entries = scope.len(),
            %error,
            "activation failed, releasing prepared resources"
        );
        match release::release(scope, Some(&error), self.label_str()) {
            Released::Raised(cleanup) => cleanup,
            Released::Clear | Released::Incoming => error,
        }
    }

    /// Enters `resource` into the innermost scope and returns its value.
    ///
    /// Managed resources yield the value produced by `enter`; closeable
    /// resources yield themselves.
    ///
    /// # Errors
    ///
    /// - [`StackError::Inactive`] if no scope is active; the resource is not entered
    /// - [`StackError::UnsupportedResourceKind`] if the resource has no protocol
    /// - [`StackError::Enter`] if acquiring the resource fails
    pub fn register<R: IntoResource>(&mut self, resource: R) -> Result<&mut dyn Any, StackError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(StackError::Inactive);
        };
        let handle = resource.into_resource()?;
        let entry = Entry::enter(handle)?;
        tracing::trace!(
            label = self.label.as_deref().unwrap_or_default(),
            resource = entry.type_name(),
            position = scope.len(),
            "resource registered"
        );
        Ok(scope.push(entry).value_mut())
    }

    /// Registers several resources in order.
    ///
    /// Resources registered before a failing one stay in the scope.
    ///
    /// # Errors
    ///
    /// The first registration error; later resources are dropped unentered.
    pub fn extend(&mut self, resources: impl IntoResources) -> Result<&mut Self, StackError> {
        for handle in resources.into_resources() {
            self.register(handle?)?;
        }
        Ok(self)
    }

    /// Enters a context manager and returns its typed value.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn enter_context<C: ContextManager>(
        &mut self,
        resource: C,
    ) -> Result<&mut C::Value, StackError> {
        let index = self.signed_len();
        self.register(Managed(resource))?
            .downcast_mut::<C::Value>()
            .ok_or(StackError::ValueType {
                index,
                expected: core::any::type_name::<C::Value>(),
            })
    }

    /// Registers a closeable resource and returns it, typed.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn closing<C: Close>(&mut self, resource: C) -> Result<&mut C, StackError> {
        let index = self.signed_len();
        self.register(Closing(resource))?
            .downcast_mut::<C>()
            .ok_or(StackError::ValueType {
                index,
                expected: core::any::type_name::<C>(),
            })
    }

    /// Registers an exit-style closure that may suppress the pending error.
    ///
    /// # Errors
    ///
    /// [`StackError::Inactive`] if no scope is active.
    pub fn push_exit<F>(&mut self, exit: F) -> Result<(), StackError>
    where
        F: FnMut(Option<&BoxError>) -> Result<bool, BoxError> + Send + 'static,
    {
        self.register(ExitCallback::new(exit)).map(|_| ())
    }

    /// Registers a closure to run when the innermost scope is released.
    ///
    /// # Errors
    ///
    /// [`StackError::Inactive`] if no scope is active.
    pub fn callback<F>(&mut self, call: F) -> Result<(), StackError>
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.register(Callback::new(call)).map(|_| ())
    }

    /// Registers a closure with arguments bound now and passed at release.
    ///
    /// # Errors
    ///
    /// [`StackError::Inactive`] if no scope is active.
    pub fn callback_with<F, A>(&mut self, call: F, args: A) -> Result<(), StackError>
    where
        F: FnOnce(A) -> Result<(), BoxError> + Send + 'static,
        A: Send + 'static,
    {
        self.register(Callback::with_args(call, args)).map(|_| ())
    }

    /// Pops the innermost scope and releases its entries newest-first.
    ///
    /// `error` is the error raised by the body of the scope, if any.
    ///
    /// # Errors
    ///
    /// The error still pending after every entry has been released, or
    /// [`StackError::Inactive`] if no scope is active.
    pub fn deactivate(&mut self, error: Option<BoxError>) -> Result<(), BoxError> {
        let Some(scope) = self.scopes.pop() else {
            tracing::warn!(label = self.label_str(), "deactivate called on an inactive stack");
            return Err(StackError::Inactive.into());
        };
        tracing::debug!(
            label = self.label_str(),
            depth = self.scopes.len() + 1,
            entries = scope.len(),
            body_error = error.is_some(),
            "scope deactivated"
        );

        match release::release(scope, error.as_ref(), self.label_str()) {
            Released::Clear => Ok(()),
            Released::Incoming => error.map_or(Ok(()), Err),
            Released::Raised(cleanup) => Err(cleanup),
        }
    }

    /// Deactivates the innermost scope outside of a structured block.
    ///
    /// Prefer [`scope`](Self::scope) or pairing [`activate`](Self::activate)
    /// with [`deactivate`](Self::deactivate). Closing while an enclosing
    /// block still expects its scope to be present desynchronizes the stack,
    /// so every call is reported at `warn` level.
    ///
    /// # Errors
    ///
    /// Same as [`deactivate`](Self::deactivate) with no body error.
    pub fn close(&mut self) -> Result<(), BoxError> {
        tracing::warn!(
            label = self.label_str(),
            depth = self.scopes.len(),
            "explicit close bypasses structured scoping"
        );
        self.deactivate(None)
    }

    /// Moves every entry of the innermost scope into a new, active stack.
    ///
    /// The innermost scope of `self` is replaced by an empty one, so a later
    /// deactivation of `self` releases none of the moved resources. The
    /// returned stack holds them in their original order, in its single
    /// scope, and releases them when deactivated or dropped.
    ///
    /// # Errors
    ///
    /// [`StackError::Inactive`] if no scope is active.
    pub fn detach_all(&mut self) -> Result<Self, StackError> {
        let scope = self.scopes.last_mut().ok_or(StackError::Inactive)?;
        let detached = core::mem::take(scope);
        tracing::debug!(
            label = self.label.as_deref().unwrap_or_default(),
            entries = detached.len(),
            "scope detached"
        );

        Ok(Self {
            label: self.label.clone(),
            prepared: Prepared::consumed(),
            scopes: vec![detached],
        })
    }

    /// Runs `body` inside a fresh scope.
    ///
    /// The scope is activated before `body` runs and deactivated afterwards
    /// with the body's error, if any.
    ///
    /// Returns `Ok(Some(value))` on success and `Ok(None)` when the body
    /// failed but a resource suppressed the error.
    ///
    /// # Errors
    ///
    /// The activation error, or the error pending after release.
    pub fn scope<T, F>(&mut self, body: F) -> Result<Option<T>, BoxError>
    where
        F: FnOnce(&mut Self) -> Result<T, BoxError>,
    {
        self.activate()?;
        match body(self) {
            Ok(value) => self.deactivate(None).map(|()| Some(value)),
            Err(error) => self.deactivate(Some(error)).map(|()| None),
        }
    }

    fn signed_len(&self) -> isize {
        isize::try_from(self.len()).unwrap_or(isize::MAX)
    }
}

/// A stack is itself a context manager, so stacks can be nested.
///
/// Entering activates the stack. Exiting releases its innermost scope
/// against the outer pending error and reports a clear as suppression.
impl ContextManager for Contexter {
    type Value = ();

    fn enter(&mut self) -> Result<(), BoxError> {
        self.activate().map(|_| ())
    }

    fn exit(&mut self, error: Option<&BoxError>) -> Result<bool, BoxError> {
        let scope = self.scopes.pop().ok_or(StackError::Inactive)?;
        match release::release(scope, error, self.label_str()) {
            Released::Clear => Ok(error.is_some()),
            Released::Incoming => Ok(false),
            Released::Raised(cleanup) => Err(cleanup),
        }
    }
}

impl Drop for Contexter {
    fn drop(&mut self) {
        while self.is_active() {
            if let Err(error) = self.deactivate(None) {
                tracing::error!(
                    label = self.label_str(),
                    %error,
                    "release failed while dropping stack"
                );
            }
        }
    }
}

impl core::fmt::Debug for Contexter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Contexter")
            .field("label", &self.label)
            .field("depth", &self.depth())
            .field("len", &self.len())
            .field("prepared_consumed", &self.prepared.consumed)
            .finish()
    }
}

/// Creates a stack that enters `resources` on first activation.
#[must_use]
pub fn nested(resources: impl IntoResources) -> Contexter {
    Contexter::new(resources)
}

/// Creates a stack that closes `resource` when deactivated.
#[must_use]
pub fn closing<C: Close>(resource: C) -> Contexter {
    Contexter::new(Closing(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn logging(log: &Log, name: &'static str) -> Callback {
        let log = Arc::clone(log);
        Callback::new(move || {
            log.lock().push(name);
            Ok(())
        })
    }

    #[test]
    fn register_requires_active_scope() {
        let mut stack = Contexter::default();
        assert!(matches!(
            stack.register(Callback::new(|| Ok(()))),
            Err(StackError::Inactive)
        ));
    }

    #[test]
    fn deactivate_inactive_fails() {
        let mut stack = Contexter::default();
        let error = stack.deactivate(None).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StackError>(),
            Some(StackError::Inactive)
        ));
    }

    #[test]
    fn prepared_list_drains_once() {
        let log = Log::default();
        let mut stack = Contexter::new((logging(&log, "a"), logging(&log, "b")));

        stack.activate().unwrap();
        assert_eq!(stack.len(), 2);
        stack.deactivate(None).unwrap();

        stack.activate().unwrap();
        assert_eq!(stack.len(), 0);
        stack.deactivate(None).unwrap();

        assert_eq!(*log.lock(), vec!["b", "a"]);
    }

    #[test]
    fn close_matches_deactivate() {
        let log = Log::default();
        let mut stack = Contexter::default();
        stack.activate().unwrap();
        stack.register(logging(&log, "a")).unwrap();

        stack.close().unwrap();
        assert!(!stack.is_active());
        assert_eq!(*log.lock(), vec!["a"]);
    }

    #[test]
    fn drop_releases_remaining_scopes() {
        let log = Log::default();
        {
            let mut stack = Contexter::default();
            stack.activate().unwrap();
            stack.register(logging(&log, "outer")).unwrap();
            stack.activate().unwrap();
            stack.register(logging(&log, "inner")).unwrap();
        }
        assert_eq!(*log.lock(), vec!["inner", "outer"]);
    }

    #[test]
    fn drop_continues_after_failure() {
        let log = Log::default();
        {
            let mut stack = Contexter::default();
            stack.activate().unwrap();
            stack.register(logging(&log, "outer")).unwrap();
            stack.activate().unwrap();
            stack.callback(|| Err("inner failed".into())).unwrap();
        }
        assert_eq!(*log.lock(), vec!["outer"]);
    }

    #[test]
    fn label_is_kept_by_detached_stack() {
        let mut stack = Contexter::default().with_label("requests");
        stack.activate().unwrap();

        let detached = stack.detach_all().unwrap();
        assert_eq!(detached.label(), Some("requests"));
        assert_eq!(detached.depth(), 1);
    }

    #[test]
    fn closing_returns_typed_resource() {
        struct Pipe {
            open: bool,
        }

        impl Close for Pipe {
            fn close(&mut self) -> Result<(), BoxError> {
                self.open = false;
                Ok(())
            }
        }

        let mut stack = Contexter::default();
        stack.activate().unwrap();
        let pipe = stack.closing(Pipe { open: true }).unwrap();
        assert!(pipe.open);
        stack.deactivate(None).unwrap();
    }

    #[test]
    fn debug_reports_state() {
        let mut stack = Contexter::default().with_label("dbg");
        stack.activate().unwrap();
        let debug = format!("{stack:?}");
        assert!(debug.contains("depth: 1"));
        assert!(debug.contains("dbg"));
    }
}
