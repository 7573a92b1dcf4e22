//! # hakorpc-schema: Schema Validation
//!
//! Runtime JSON Schema validation for RPC configuration documents.
//!
//! ## Runtime Validation (`validate`)
//!
//! The [`validate`] module compiles a schema file once into a
//! [`SchemaValidator`] and checks parsed documents against it, yielding
//! [`Violation`]s ordered by their location in the instance. A
//! [`SchemaSet`] bundles the two schemas every run needs: one for service
//! documents and one for endpoints documents.
//!
//! ## Crate Policy
//!
//! - Depends only on `hakorpc-core` internally.
//! - Schema problems (missing file, invalid JSON, uncompilable schema) are
//!   setup errors and surface as [`SchemaError`]. Document problems are
//!   never errors here: they are violations.

pub mod validate;

pub use validate::{SchemaError, SchemaSet, SchemaValidator, Violation};
