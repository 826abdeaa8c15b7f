//! Error types for field import and mesh export.
//!
//! Extraction itself performs no I/O and never returns these; precondition
//! violations inside the algorithm panic instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IsoError {
    /// Opening, reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stream ended before the header or all samples were read.
    #[error("truncated volume data: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// A stream error that is not tied to a file path.
    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),
}

impl IsoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type IsoResult<T> = Result<T, IsoError>;
