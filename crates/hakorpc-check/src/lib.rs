//! # hakorpc-check: Reference and Semantic Checks
//!
//! The heart of the validator: everything that looks across documents.
//!
//! ## Components (leaves first)
//!
//! - [`index`]: builds the node → endpoint id lookup from an endpoints
//!   document.
//! - [`collect`]: gathers per-endpoint `config_path` references from an
//!   endpoints document.
//! - [`references`]: resolves and existence-checks every file a service
//!   document points at, and establishes which endpoints document applies.
//! - [`semantics`]: service-level invariants (metadata size, unique
//!   names, capacity, channel exclusivity) and endpoint bindings.
//! - [`endpoint`]: the external per-endpoint validator seam.
//! - [`pipeline`]: drives schema validation and all of the above over a
//!   set of input paths, accumulating every finding.
//!
//! ## Crate Policy
//!
//! - Checks never stop at the first finding; every problem in a document is
//!   reported in one run.
//! - Malformed input is walked tolerantly: entries that are not the
//!   expected shape are skipped, since schema validation reports them.
//! - Configuration is passed in through [`ValidatorConfig`]; nothing in
//!   this crate reads the environment.

pub mod collect;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod references;
pub mod semantics;

pub use collect::{collect_endpoint_configs, EndpointConfigRef};
pub use config::{EndpointSchemaSource, ValidatorCommand, ValidatorConfig};
pub use endpoint::{EndpointValidator, ProcessEndpointValidator, StaticEndpointValidator};
pub use error::SetupError;
pub use index::{build_endpoint_index, EndpointIndex, EndpointLookup};
pub use pipeline::{expand_inputs, DocumentReport, RunReport, ValidationPipeline};
pub use references::{check_service_file, check_service_references, ReferenceReport};
pub use semantics::{check_semantics, PDU_METADATA_SIZE};
