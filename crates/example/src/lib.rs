//! Example file concatenation built with Contexter.
//!
//! Every input is opened into the same scope as the staged output, so one
//! failure anywhere closes all inputs and discards the partial output.
//!
//! ```text
//!  scope ─┬─ callback        (released last: logs the outcome)
//!         ├─ StagedOutput    (commit on success, discard on error)
//!         ├─ InputFile #0
//!         ├─ InputFile #1
//!         └─ ...             (released first)
//! ```

mod files;
mod sandbox;

pub use files::{InputFile, StagedOutput};
pub use sandbox::Sandbox;

use contexter_stack::prelude::{BoxError, Contexter};
use std::io::Write;

/// Errors raised by [`Concat`] itself. Resource failures pass through as-is.
#[derive(Debug, thiserror::Error)]
pub enum ConcatError {
    /// A path resolved outside the sandbox.
    #[error("path '{0}' escapes sandbox")]
    Escapes(String),
    /// The output grew past the configured limit.
    #[error("output exceeds {limit} bytes")]
    LimitExceeded {
        /// The configured limit.
        limit: u64,
    },
    /// No inputs were given.
    #[error("no input files")]
    NoInputs,
}

/// Concatenates files inside a [`Sandbox`].
#[derive(Debug, Clone)]
pub struct Concat {
    sandbox: Sandbox,
    limit: Option<u64>,
}

impl Concat {
    /// Creates a concatenation confined to `sandbox`.
    #[must_use]
    pub fn new(sandbox: Sandbox) -> Self {
        Self {
            sandbox,
            limit: None,
        }
    }

    /// Fails once the output would grow past `limit` bytes.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Writes the contents of `inputs`, in order, to `output`.
    ///
    /// Returns the number of bytes written. The output only appears once
    /// every input was copied.
    ///
    /// # Errors
    ///
    /// Returns the first failure, or a cleanup failure that replaced it.
    pub fn run(&self, output: &str, inputs: &[&str]) -> Result<u64, BoxError> {
        if inputs.is_empty() {
            return Err(ConcatError::NoInputs.into());
        }
        let target = self.resolve(output)?;

        let mut stack = Contexter::default().with_label("concat");
        let written = stack.scope(|stack| {
            let label = output.to_owned();
            stack.callback(move || {
                tracing::info!(output = %label, "concat scope released");
                Ok(())
            })?;

            let mut out = stack.enter_context(StagedOutput::new(target))?.try_clone()?;
            let mut total = 0;
            for input in inputs {
                let path = self.resolve(input)?;
                let file = stack.closing(InputFile::open(path)?)?;
                total += file.copy_to(&mut out)?;
                if let Some(limit) = self.limit
                    && total > limit
                {
                    return Err(ConcatError::LimitExceeded { limit }.into());
                }
            }
            out.flush()?;
            Ok(total)
        })?;

        // No resource in this stack suppresses, so a body error always propagates.
        Ok(written.unwrap_or_default())
    }

    fn resolve(&self, path: &str) -> Result<std::path::PathBuf, ConcatError> {
        self.sandbox
            .resolve(path)
            .ok_or_else(|| ConcatError::Escapes(path.to_owned()))
    }
}
