//! Error types for address counting.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error returned by counting operations.
///
/// Only start-up failures are reported here. Malformed lines and read errors
/// inside a span are absorbed by the worker and show up in its
/// [`SpanReport`](crate::SpanReport) instead, unless strict mode is enabled.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UniqIpError {
    /// The input file could not be opened or its metadata read.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// Path of the input file.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// Memory mapping failed.
    #[cfg(feature = "mmap")]
    #[error("memory map error: {0}")]
    Mmap(#[source] io::Error),

    /// The provided input is invalid for this operation.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what is invalid about the input.
        message: String,
    },

    /// One or more spans stopped early on a read error (strict mode only).
    #[error("{spans} span(s) were truncated by read errors")]
    Truncated {
        /// Number of truncated spans.
        spans: usize,
    },
}

impl UniqIpError {
    /// Creates an Io error for the given path.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        UniqIpError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        UniqIpError::InvalidInput {
            message: message.into(),
        }
    }
}
