//! Error types for archive extraction operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Errors that can occur during archive extraction.
///
/// Per-entry security problems never surface here during a normal pipeline
/// run: they are turned into a [`Rejection`](crate::security::Rejection) and
/// reported through the warning sink. The variants below are what the
/// pipeline returns to its caller when the whole extraction has to stop.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive is corrupted or invalid.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// The archive stream ended while an entry was still open.
    #[error("unexpected end of input while reading {path}")]
    UnexpectedEof {
        /// Path of the last entry read, empty if the stream ended before
        /// the first one.
        path: PathBuf,
    },

    /// Path traversal attempt detected.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The path that attempted traversal.
        path: PathBuf,
    },

    /// Resolved path falls outside the extraction root.
    #[error("path escaped extraction target: {path} resolved to {resolved} outside {root}")]
    PathEscape {
        /// The path as it appeared in the archive.
        path: PathBuf,
        /// Where the path resolved to.
        resolved: PathBuf,
        /// The extraction root.
        root: PathBuf,
    },

    /// Operation not permitted by security policy.
    #[error("operation denied by security policy: {reason}")]
    SecurityViolation {
        /// Reason for the violation.
        reason: String,
    },

    /// The pipeline already failed and accepts no more entries.
    #[error("extraction pipeline closed after a previous error")]
    PipelineClosed,
}

impl ExtractionError {
    /// Returns `true` if this error represents a security violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use targuard_core::ExtractionError;
    ///
    /// let err = ExtractionError::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = ExtractionError::PipelineClosed;
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal { .. } | Self::PathEscape { .. } | Self::SecurityViolation { .. }
        )
    }

    /// Returns `true` if extraction could continue with the next entry.
    ///
    /// Stream-level failures (truncated input, corrupted headers, writer
    /// I/O) are never recoverable.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use targuard_core::ExtractionError;
    ///
    /// let err = ExtractionError::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_recoverable());
    ///
    /// let err = ExtractionError::UnexpectedEof {
    ///     path: PathBuf::from("file.txt"),
    /// };
    /// assert!(!err.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.is_security_violation()
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::SecurityViolation { reason } => Some(reason),
            _ => None,
        }
    }

    /// Maps a decoder I/O error. A short read becomes `UnexpectedEof`, a
    /// malformed header `InvalidArchive`.
    pub(crate) fn from_decoder(err: std::io::Error, path: PathBuf) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::UnexpectedEof { path },
            std::io::ErrorKind::Other | std::io::ErrorKind::InvalidData => {
                Self::InvalidArchive(err.to_string())
            }
            _ => Self::Io(err),
        }
    }
}
