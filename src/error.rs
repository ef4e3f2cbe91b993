//! Error types for the launch classifier.
//!
//! A probe deciding "this is not actually a launcher" is never an error:
//! probes report that as `Ok(None)` and the sniffer falls through to the
//! next test. The variants here cover real failures only — I/O trouble
//! while walking or reading, and permission fixes that did not stick.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for the launch classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while walking the install folder.
    #[error("walking {}: {source}", .path.display())]
    Walk {
        /// Root that was being walked.
        path: PathBuf,
        /// Underlying walker error.
        #[source]
        source: walkdir::Error,
    },

    /// Error while sniffing a specific file.
    #[error("sniffing {path}: {source}")]
    Sniff {
        /// Path of the file being sniffed, relative to the scan root.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error while changing a file's mode bits.
    #[error("fixing permissions of {path}: {source}")]
    FixPermissions {
        /// Path of the candidate being fixed, relative to the base path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for classifier operations.
pub type Result<T> = std::result::Result<T, ClassifyError>;
