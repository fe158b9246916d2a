//! Error types for stack operations.

/// A type-erased error raised by a resource or by the body of a scope.
///
/// Body errors and cleanup errors are carried as `BoxError` through the
/// release loop. Callers recover the concrete type with
/// [`downcast_ref`](core::error::Error::downcast_ref).
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors raised by the stack itself, as opposed to the resources it holds.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// The object implements neither the enter/exit nor the close protocol.
    #[error(
        "unsupported resource kind `{0}`: only context managers or closeable resources are supported"
    )]
    UnsupportedResourceKind(&'static str),

    /// A scope or entry lookup used an index that does not exist.
    #[error("{what} index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// What was indexed (`"scope"` or `"entry"`).
        what: &'static str,
        /// The index as supplied, possibly negative.
        index: isize,
        /// The length of the indexed sequence.
        len: usize,
    },

    /// The value at the given index is not of the requested type.
    #[error("value at index {index} is not a `{expected}`")]
    ValueType {
        /// The index as supplied, possibly negative.
        index: isize,
        /// The requested type name.
        expected: &'static str,
    },

    /// The operation requires an active scope but the stack has none.
    #[error("stack is not active")]
    Inactive,

    /// Acquiring a resource failed.
    #[error("failed to enter resource `{resource}`")]
    Enter {
        /// The type name of the resource.
        resource: &'static str,
        /// The error returned by the resource.
        #[source]
        source: BoxError,
    },
}

impl StackError {
    pub(crate) fn scope_out_of_range(index: isize, len: usize) -> Self {
        Self::IndexOutOfRange {
            what: "scope",
            index,
            len,
        }
    }

    pub(crate) fn entry_out_of_range(index: isize, len: usize) -> Self {
        Self::IndexOutOfRange {
            what: "entry",
            index,
            len,
        }
    }
}
