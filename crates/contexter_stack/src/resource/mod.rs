//! Resource protocols and the handles the stack stores for them.
//!
//! A resource takes part in a [`Contexter`](crate::stack::Contexter) through
//! exactly one of two protocols:
//!
//! | Protocol | Trait | Produced value | Can suppress errors |
//! |----------|-------|----------------|---------------------|
//! | Enter/exit | [`ContextManager`] | Whatever `enter` returns | Yes |
//! | Close-only | [`Close`] | The resource itself | No |
//!
//! The protocol is fixed when the resource is converted into a
//! [`ResourceHandle`]; the stack stores the resulting [`ResourceKind`] tag
//! and never inspects the resource again.
//!
//! # Example
//!
//! ```
//! use contexter_stack::error::BoxError;
//! use contexter_stack::resource::{Close, ContextManager, ResourceHandle, ResourceKind};
//!
//! struct Transaction;
//!
//! impl ContextManager for Transaction {
//!     type Value = u64;
//!
//!     fn enter(&mut self) -> Result<u64, BoxError> {
//!         Ok(7)
//!     }
//!
//!     fn exit(&mut self, _error: Option<&BoxError>) -> Result<bool, BoxError> {
//!         Ok(false)
//!     }
//! }
//!
//! struct Socket;
//!
//! impl Close for Socket {
//!     fn close(&mut self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! assert_eq!(ResourceHandle::managed(Transaction).kind(), ResourceKind::Managed);
//! assert_eq!(ResourceHandle::closeable(Socket).kind(), ResourceKind::Closeable);
//! ```

mod adaptor;
mod set;

pub use adaptor::{Callback, ExitCallback};
pub use set::IntoResources;

use crate::error::{BoxError, StackError};
use core::any::Any;
use downcast_rs::{Downcast, impl_downcast};

/// A resource with an acquire step and a release step.
///
/// `enter` acquires the resource and produces the value handed back by
/// [`Contexter::register`](crate::stack::Contexter::register). `exit`
/// receives the error pending at release time, if any, and returns `true`
/// to suppress it.
pub trait ContextManager: Send + 'static {
    /// The value produced by [`enter`](Self::enter).
    type Value: Send + 'static;

    /// Acquires the resource.
    ///
    /// # Errors
    ///
    /// Returns the acquisition failure. The resource is not held by the
    /// stack when this fails.
    fn enter(&mut self) -> Result<Self::Value, BoxError>;

    /// Releases the resource.
    ///
    /// # Errors
    ///
    /// A returned error replaces whatever error was pending.
    fn exit(&mut self, error: Option<&BoxError>) -> Result<bool, BoxError>;
}

/// A resource that only needs to be released.
///
/// Closeable resources have no acquire step; the resource itself is the
/// value exposed by the stack.
pub trait Close: Downcast + Send {
    /// Releases the resource.
    ///
    /// # Errors
    ///
    /// A returned error replaces whatever error was pending. Closing never
    /// suppresses a pending error.
    fn close(&mut self) -> Result<(), BoxError>;
}

impl_downcast!(Close);

/// Object-safe form of [`ContextManager`] with the produced value boxed.
pub(crate) trait ErasedManaged: Send {
    fn enter(&mut self) -> Result<Box<dyn Any + Send>, BoxError>;

    fn exit(&mut self, error: Option<&BoxError>) -> Result<bool, BoxError>;
}

impl<C: ContextManager> ErasedManaged for C {
    fn enter(&mut self) -> Result<Box<dyn Any + Send>, BoxError> {
        let value = ContextManager::enter(self)?;
        Ok(Box::new(value))
    }

    fn exit(&mut self, error: Option<&BoxError>) -> Result<bool, BoxError> {
        ContextManager::exit(self, error)
    }
}

/// The protocol a [`ResourceHandle`] was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Enter/exit protocol; may suppress errors.
    Managed,
    /// Close-only protocol; never suppresses errors.
    Closeable,
}

pub(crate) enum Protocol {
    Managed(Box<dyn ErasedManaged>),
    Closeable(Box<dyn Close>),
}

/// A not-yet-entered resource, tagged with its protocol.
pub struct ResourceHandle {
    type_name: &'static str,
    protocol: Protocol,
}

impl ResourceHandle {
    /// Wraps a resource using the enter/exit protocol.
    #[must_use]
    pub fn managed<C: ContextManager>(resource: C) -> Self {
        Self {
            type_name: core::any::type_name::<C>(),
            protocol: Protocol::Managed(Box::new(resource)),
        }
    }

    /// Wraps a resource using the close-only protocol.
    #[must_use]
    pub fn closeable<C: Close>(resource: C) -> Self {
        Self::from_boxed_close(core::any::type_name::<C>(), Box::new(resource))
    }

    fn from_boxed_close(type_name: &'static str, resource: Box<dyn Close>) -> Self {
        Self {
            type_name,
            protocol: Protocol::Closeable(resource),
        }
    }

    /// Returns the protocol this handle was created with.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self.protocol {
            Protocol::Managed(_) => ResourceKind::Managed,
            Protocol::Closeable(_) => ResourceKind::Closeable,
        }
    }

    /// Returns the type name of the wrapped resource for debugging purposes.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn into_parts(self) -> (&'static str, Protocol) {
        (self.type_name, self.protocol)
    }
}

impl core::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Conversion into a [`ResourceHandle`], deciding the resource's protocol.
///
/// Statically typed resources pick their protocol through the [`Managed`]
/// and [`Closing`] wrappers or the callback adaptors. Type-erased values
/// (`Box<dyn Any + Send>`) are probed at runtime and fail with
/// [`StackError::UnsupportedResourceKind`] when they carry neither protocol.
pub trait IntoResource {
    /// Converts `self` into a handle.
    ///
    /// # Errors
    ///
    /// [`StackError::UnsupportedResourceKind`] if the value implements
    /// neither protocol.
    fn into_resource(self) -> Result<ResourceHandle, StackError>;
}

impl IntoResource for ResourceHandle {
    fn into_resource(self) -> Result<ResourceHandle, StackError> {
        Ok(self)
    }
}

/// Registers the wrapped value under the enter/exit protocol.
#[derive(Debug)]
pub struct Managed<C>(pub C);

impl<C: ContextManager> IntoResource for Managed<C> {
    fn into_resource(self) -> Result<ResourceHandle, StackError> {
        Ok(ResourceHandle::managed(self.0))
    }
}

/// Registers the wrapped value under the close-only protocol.
#[derive(Debug)]
pub struct Closing<C>(pub C);

impl<C: Close> IntoResource for Closing<C> {
    fn into_resource(self) -> Result<ResourceHandle, StackError> {
        Ok(ResourceHandle::closeable(self.0))
    }
}

impl IntoResource for Box<dyn Close> {
    fn into_resource(self) -> Result<ResourceHandle, StackError> {
        Ok(ResourceHandle::from_boxed_close("Box<dyn Close>", self))
    }
}

impl IntoResource for Box<dyn Any + Send> {
    fn into_resource(self) -> Result<ResourceHandle, StackError> {
        let value = match self.downcast::<ResourceHandle>() {
            Ok(handle) => return Ok(*handle),
            Err(value) => value,
        };
        let value = match value.downcast::<Box<dyn Close>>() {
            Ok(resource) => return (*resource).into_resource(),
            Err(value) => value,
        };
        match value.downcast::<Callback>() {
            Ok(callback) => (*callback).into_resource(),
            Err(_) => Err(StackError::UnsupportedResourceKind("Box<dyn Any + Send>")),
        }
    }
}
