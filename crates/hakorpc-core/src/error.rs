//! # Error Types
//!
//! Structured errors for loading configuration documents. The `Display`
//! output of each variant is the exact diagnostic line reported to the
//! operator, so callers can push `err.to_string()` straight into a
//! [`Diagnostics`](crate::Diagnostics) list.

use std::path::PathBuf;

use thiserror::Error;

/// A configuration document could not be turned into a JSON value.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be opened or read.
    #[error("{}: read error: {source}", path.display())]
    Read {
        /// Path of the document that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The file was read but is not valid JSON.
    #[error("{}: JSON parse error: {source}", path.display())]
    Parse {
        /// Path of the document that failed to parse.
        path: PathBuf,
        /// Underlying parser failure, with line and column.
        source: serde_json::Error,
    },
}

impl DocumentError {
    /// Path of the document this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }

    /// Returns true for the read (I/O) variant.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }
}
