//! A dynamic, composable stack of scoped resources.
//!

pub use contexter_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use contexter_internal::prelude::*;
}
