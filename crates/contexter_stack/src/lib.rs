//! A dynamic, composable stack of scoped resources.
//!
//! `contexter_stack` provides the primitives for managing resources whose
//! number and kind are only known at runtime:
//!
//! - [`resource`] - The enter/exit and close-only protocols, handles and adaptors
//! - [`stack`] - The [`Contexter`](stack::Contexter) manager and its release algorithm
//! - [`error`] - Stack errors and the boxed error type carried through releases
//! - [`info`] - Build metadata
//!
//! # Example
//!
//! ```
//! use contexter_stack::error::BoxError;
//! use contexter_stack::resource::{Close, Closing};
//! use contexter_stack::stack::Contexter;
//!
//! struct Connection {
//!     name: &'static str,
//! }
//!
//! impl Close for Connection {
//!     fn close(&mut self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut stack = Contexter::new((
//!     Closing(Connection { name: "primary" }),
//!     Closing(Connection { name: "replica" }),
//! ));
//!
//! stack.activate().unwrap();
//! assert_eq!(stack.value::<Connection>(-1).unwrap().name, "replica");
//!
//! // Resources acquired later join the same scope.
//! stack.callback(|| Ok(())).unwrap();
//! assert_eq!(stack.len(), 3);
//!
//! // Released newest-first.
//! stack.deactivate(None).unwrap();
//! ```

/// Stack errors.
pub mod error;

/// Build metadata.
pub mod info;

/// Resource protocols, handles and adaptors.
pub mod resource;

/// The resource stack manager.
pub mod stack;

pub use info::{DESCRIPTION, VERSION};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::*;
    pub use crate::resource::*;
    pub use crate::stack::*;
}
