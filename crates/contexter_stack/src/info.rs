//! Build metadata for the stack crate.

/// Crate version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate description from `Cargo.toml`.
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information, for logging at startup.
///
/// # Example
///
/// ```
/// use contexter_stack::info::BuildInfo;
///
/// let info = BuildInfo::current();
/// assert!(!info.version.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Crate version string.
    pub version: &'static str,
    /// Crate description string.
    pub description: &'static str,
    /// Whether the crate was compiled with debug assertions.
    pub debug: bool,
}

impl BuildInfo {
    /// Returns the information for this build.
    #[must_use]
    pub fn current() -> Self {
        Self::default()
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            description: DESCRIPTION,
            debug: cfg!(debug_assertions),
        }
    }
}
