//! File resources held by the concatenation stack.

use contexter_stack::prelude::{BoxError, Close, ContextManager};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// An input file that stays open until its scope is released.
#[derive(Debug)]
pub struct InputFile {
    path: PathBuf,
    file: Option<File>,
    bytes_read: u64,
}

impl InputFile {
    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening the file.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            file: Some(file),
            bytes_read: 0,
        })
    }

    /// The path this file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Copies the remaining contents into `writer`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error, or [`io::ErrorKind::NotConnected`] if the file
    /// was already closed.
    pub fn copy_to(&mut self, writer: &mut impl Write) -> io::Result<u64> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "input file closed"))?;
        let copied = io::copy(file, writer)?;
        self.bytes_read += copied;
        Ok(copied)
    }
}

impl Close for InputFile {
    fn close(&mut self) -> Result<(), BoxError> {
        if self.file.take().is_some() {
            tracing::debug!(path = %self.path.display(), bytes = self.bytes_read, "input closed");
        }
        Ok(())
    }
}

/// An output written to a staging file and moved into place on success.
///
/// Entering creates `<target>.partial`. A clean exit renames it onto the
/// target; an exit with a pending error removes it, leaving any existing
/// target untouched.
#[derive(Debug)]
pub struct StagedOutput {
    target: PathBuf,
    staging: PathBuf,
}

impl StagedOutput {
    /// Stages writes for `target`.
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        let mut staging = target.clone().into_os_string();
        staging.push(".partial");
        Self {
            target,
            staging: PathBuf::from(staging),
        }
    }

    /// The final destination.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The staging file written while the scope is live.
    #[must_use]
    pub fn staging(&self) -> &Path {
        &self.staging
    }
}

impl ContextManager for StagedOutput {
    type Value = File;

    fn enter(&mut self) -> Result<File, BoxError> {
        Ok(File::create(&self.staging)?)
    }

    fn exit(&mut self, error: Option<&BoxError>) -> Result<bool, BoxError> {
        match error {
            Some(error) => {
                tracing::warn!(
                    target_path = %self.target.display(),
                    %error,
                    "discarding staged output"
                );
                std::fs::remove_file(&self.staging)?;
            }
            None => {
                std::fs::rename(&self.staging, &self.target)?;
                tracing::debug!(target_path = %self.target.display(), "output committed");
            }
        }
        Ok(false)
    }
}
