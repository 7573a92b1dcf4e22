//! Setup errors.
//!
//! Per-document findings are diagnostics, never errors. What stops a run is
//! a validator that cannot be set up at all, or inputs that cannot be
//! listed.

use std::path::PathBuf;

use thiserror::Error;

use hakorpc_schema::SchemaError;

/// The validation run cannot start.
#[derive(Error, Debug)]
pub enum SetupError {
    /// A required schema is missing, unreadable, or not a valid schema.
    #[error("cannot load required schema: {0}")]
    Schema(#[from] SchemaError),

    /// An input directory could not be listed.
    #[error("{}: cannot read directory: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
