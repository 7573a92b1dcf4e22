//! # hakorpc-core: Foundational Types for the RPC Config Validator
//!
//! This crate is the leaf of the hakorpc workspace. It holds the pieces every
//! checker needs and that carry no validation policy of their own.
//!
//! ## Key Design Principles
//!
//! 1. **Tolerant field access.** Configuration documents are inspected as
//!    raw `serde_json::Value` trees through the [`access`] helpers. Every
//!    read yields `Option`, so "absent", "wrong type", and "present" are
//!    handled at each call site instead of assuming well-formedness.
//!
//! 2. **Diagnostics accumulate.** [`Diagnostics`] only grows. Nothing in
//!    the workspace removes a finding once it has been recorded.
//!
//! 3. **References keep their spelling.** [`path::resolve_ref`] turns a raw
//!    reference into an absolute path for existence checks, but callers
//!    report the original text.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `hakorpc-*` crates.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod access;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod path;

// Re-export primary types for ergonomic imports.
pub use diagnostic::Diagnostics;
pub use document::load_json;
pub use error::DocumentError;
pub use path::{document_dir, resolve_ref};
