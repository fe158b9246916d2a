//! Tracing setup for Contexter.
//!
//! The stack crate emits `tracing` events (scope activation, release,
//! suppressed and superseded errors) but never installs a subscriber.
//! [`TracingSetup`] installs one, built from an explicit configuration.
//!
//! # Example
//!
//! ```
//! use contexter_tracing::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! let config = TracingSetup::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! assert_eq!(config.level, Level::DEBUG);
//! ```

use contexter_stack::info::BuildInfo;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of the configuration a subscriber was installed with.
///
/// Returned by [`TracingSetup::init`] so callers can adapt their own
/// logging to the configured level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for the global `tracing` subscriber.
///
/// # Configuration Options
///
/// ```
/// use contexter_tracing::{TracingFormat, TracingSetup};
/// use tracing::Level;
///
/// // Development: Pretty colored output with debug level
/// let dev = TracingSetup::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON output, only warnings from the stack
/// let prod = TracingSetup::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("contexter_stack=warn,info");
/// ```
#[derive(Debug, Clone)]
pub struct TracingSetup {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "`contexter_stack=debug`").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a new `TracingSetup` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An invalid filter falls back
    /// to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configuration this setup installs.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Installation is attempted once per process; if a subscriber is
    /// already installed the call leaves it in place.
    pub fn init(&self) -> TracingConfig {
        let env_filter = self.env_filter();

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() ignores errors if already initialized
        match self.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }

        let info = BuildInfo::current();
        tracing::info!(
            version = info.version,
            debug = info.debug,
            level = %self.level,
            format = ?self.format,
            "tracing initialized"
        );

        self.config()
    }
}
