//! Scope storage and the release loop.

use crate::error::{BoxError, StackError};
use crate::resource::{Close, ErasedManaged, Protocol, ResourceHandle};
use core::any::Any;
use downcast_rs::Downcast;

/// An entered resource together with the value it produced.
pub(crate) enum Entry {
    Managed {
        type_name: &'static str,
        resource: Box<dyn ErasedManaged>,
        value: Box<dyn Any + Send>,
    },
    Closeable {
        type_name: &'static str,
        resource: Box<dyn Close>,
    },
}

impl Entry {
    /// Enters `handle`, producing an entry ready to be pushed onto a scope.
    pub(crate) fn enter(handle: ResourceHandle) -> Result<Self, StackError> {
        let (type_name, protocol) = handle.into_parts();
        match protocol {
            Protocol::Managed(mut resource) => {
                let value = resource.enter().map_err(|source| StackError::Enter {
                    resource: type_name,
                    source,
                })?;
                Ok(Self::Managed {
                    type_name,
                    resource,
                    value,
                })
            }
            Protocol::Closeable(resource) => Ok(Self::Closeable {
                type_name,
                resource,
            }),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Managed { type_name, .. } | Self::Closeable { type_name, .. } => type_name,
        }
    }

    /// The produced value; a closeable resource is its own value.
    pub(crate) fn value(&self) -> &dyn Any {
        match self {
            Self::Managed { value, .. } => {
                let value: &dyn Any = &**value;
                value
            }
            Self::Closeable { resource, .. } => Downcast::as_any(&**resource),
        }
    }

    pub(crate) fn value_mut(&mut self) -> &mut dyn Any {
        match self {
            Self::Managed { value, .. } => {
                let value: &mut dyn Any = &mut **value;
                value
            }
            Self::Closeable { resource, .. } => Downcast::as_any_mut(&mut **resource),
        }
    }

    /// Releases the resource, returning whether the pending error is suppressed.
    fn release(mut self, error: Option<&BoxError>) -> Result<bool, BoxError> {
        match &mut self {
            Self::Managed { resource, .. } => resource.exit(error),
            Self::Closeable { resource, .. } => resource.close().map(|()| false),
        }
    }
}

/// One activation's entries, in registration order.
#[derive(Default)]
pub(crate) struct Scope {
    entries: Vec<Entry>,
}

impl Scope {
    pub(crate) fn push(&mut self, entry: Entry) -> &mut Entry {
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Final state of the pending error after a scope has been released.
#[derive(Debug)]
pub(crate) enum Released {
    /// No error is pending, either because none came in or it was suppressed.
    Clear,
    /// The incoming error is still pending.
    Incoming,
    /// A release step raised this error and nothing suppressed it afterwards.
    Raised(BoxError),
}

enum Pending<'e> {
    Clear,
    Incoming(&'e BoxError),
    Raised(BoxError),
}

impl Pending<'_> {
    fn current(&self) -> Option<&BoxError> {
        match self {
            Self::Clear => None,
            Self::Incoming(error) => Some(*error),
            Self::Raised(error) => Some(error),
        }
    }
}

/// Releases every entry of `scope` in reverse registration order.
///
/// Each step sees the error pending at that point. A step returning `true`
/// clears it; a step returning an error replaces it, even after a clear.
/// Every entry is visited regardless of earlier failures.
pub(crate) fn release(scope: Scope, incoming: Option<&BoxError>, label: &str) -> Released {
    let mut pending = incoming.map_or(Pending::Clear, Pending::Incoming);

    for entry in scope.entries.into_iter().rev() {
        let resource = entry.type_name();
        match entry.release(pending.current()) {
            Ok(true) => {
                if let Some(error) = pending.current() {
                    tracing::debug!(label, resource, %error, "pending error suppressed");
                }
                pending = Pending::Clear;
            }
            Ok(false) => {}
            Err(error) => {
                if let Some(superseded) = pending.current() {
                    tracing::debug!(
                        label,
                        resource,
                        %superseded,
                        %error,
                        "cleanup error replaces pending error"
                    );
                }
                pending = Pending::Raised(error);
            }
        }
    }

    match pending {
        Pending::Clear => Released::Clear,
        Pending::Incoming(_) => Released::Incoming,
        Pending::Raised(error) => Released::Raised(error),
    }
}
