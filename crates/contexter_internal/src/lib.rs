//! # Contexter Internal Library
//!
//! Re-exports the Contexter crates for convenience.

/// The resource stack and its protocols.
pub use contexter_stack;

/// Tracing subscriber setup.
#[cfg(feature = "tracing")]
pub use contexter_tracing;

pub use contexter_stack::{DESCRIPTION, VERSION};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use contexter_stack::prelude::*;

    #[cfg(feature = "tracing")]
    pub use contexter_tracing::{TracingConfig, TracingFormat, TracingSetup};
}
