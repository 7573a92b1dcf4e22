//! # hakorpc-cli: Command-Line Validator
//!
//! Provides the `hakorpc` binary for operators and CI pipelines.
//!
//! ## Subcommands
//!
//! - `hakorpc validate`: schema, reference, and semantic checks over one
//!   or more service documents or directories of them.
//!
//! ```bash
//! hakorpc validate config/rpc/
//! hakorpc validate --skip-endpoint-validation service.json
//! hakorpc -v validate --format json config/rpc/ > report.json
//! ```

pub mod validate;

/// Every document is clean.
pub const EXIT_OK: u8 = 0;

/// At least one diagnostic was reported.
pub const EXIT_DIAGNOSTICS: u8 = 1;

/// The run could not start: schemas missing or invalid, inputs unreadable.
pub const EXIT_SETUP_ERROR: u8 = 2;
