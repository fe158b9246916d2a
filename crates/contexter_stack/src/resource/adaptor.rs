//! Adaptors that turn plain closures into resources.

use super::{Close, ContextManager, IntoResource, ResourceHandle};
use crate::error::{BoxError, StackError};

/// An exit-style closure registered under the enter/exit protocol.
///
/// Entering is a no-op producing `()`. On release the closure receives the
/// pending error and its return value decides suppression, exactly like
/// [`ContextManager::exit`].
///
/// # Example
///
/// ```
/// use contexter_stack::resource::ExitCallback;
/// use contexter_stack::stack::Contexter;
///
/// let mut stack = Contexter::default();
/// stack.activate().unwrap();
/// stack
///     .register(ExitCallback::new(|error| Ok(error.is_some())))
///     .unwrap();
///
/// // The callback suppresses the body error.
/// assert!(stack.deactivate(Some("boom".into())).is_ok());
/// ```
pub struct ExitCallback<F> {
    exit: F,
}

impl<F> ExitCallback<F>
where
    F: FnMut(Option<&BoxError>) -> Result<bool, BoxError> + Send + 'static,
{
    /// Wraps `exit`.
    #[must_use]
    pub fn new(exit: F) -> Self {
        Self { exit }
    }
}

impl<F> ContextManager for ExitCallback<F>
where
    F: FnMut(Option<&BoxError>) -> Result<bool, BoxError> + Send + 'static,
{
    type Value = ();

    fn enter(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn exit(&mut self, error: Option<&BoxError>) -> Result<bool, BoxError> {
        (self.exit)(error)
    }
}

impl<F> IntoResource for ExitCallback<F>
where
    F: FnMut(Option<&BoxError>) -> Result<bool, BoxError> + Send + 'static,
{
    fn into_resource(self) -> Result<ResourceHandle, StackError> {
        Ok(ResourceHandle::managed(self))
    }
}

impl<F> core::fmt::Debug for ExitCallback<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExitCallback").finish_non_exhaustive()
    }
}

type DeferredCall = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// A deferred closure registered under the close-only protocol.
///
/// The closure runs at most once, when the owning scope is released. It
/// cannot suppress a pending error.
///
/// # Example
///
/// ```
/// use contexter_stack::resource::Callback;
/// use contexter_stack::stack::Contexter;
///
/// let mut stack = Contexter::default();
/// stack.activate().unwrap();
///
/// let path = String::from("/tmp/scratch");
/// stack
///     .register(Callback::with_args(|path: String| {
///         assert_eq!(path, "/tmp/scratch");
///         Ok(())
///     }, path))
///     .unwrap();
///
/// stack.deactivate(None).unwrap();
/// ```
pub struct Callback {
    call: Option<DeferredCall>,
}

impl Callback {
    /// Defers `call` until release.
    #[must_use]
    pub fn new<F>(call: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        Self {
            call: Some(Box::new(call)),
        }
    }

    /// Defers `call`, binding `args` now and passing them at release.
    #[must_use]
    pub fn with_args<F, A>(call: F, args: A) -> Self
    where
        F: FnOnce(A) -> Result<(), BoxError> + Send + 'static,
        A: Send + 'static,
    {
        Self::new(move || call(args))
    }

    /// Returns `true` once the closure has run.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.call.is_none()
    }
}

impl Close for Callback {
    fn close(&mut self) -> Result<(), BoxError> {
        match self.call.take() {
            Some(call) => call(),
            None => Ok(()),
        }
    }
}

impl IntoResource for Callback {
    fn into_resource(self) -> Result<ResourceHandle, StackError> {
        Ok(ResourceHandle::closeable(self))
    }
}

impl core::fmt::Debug for Callback {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Callback")
            .field("spent", &self.is_spent())
            .finish()
    }
}
