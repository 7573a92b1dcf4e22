//! # Validation Pipeline
//!
//! Drives every check over a set of input paths and accumulates the
//! findings per document.
//!
//! For each service document, in order:
//!
//! 1. schema validation against the service schema;
//! 2. file reference checks (and the endpoints document they establish);
//! 3. schema validation of an endpoints file loaded through
//!    `endpoints_config_path`;
//! 4. once an endpoints document is established: the external endpoint
//!    validator for each existing endpoint config, then the semantic
//!    checks against that endpoints document.
//!
//! A document that cannot be read or parsed gets one diagnostic and
//! nothing else. No step gates a later one otherwise.

use std::path::{Path, PathBuf};

use serde::Serialize;

use hakorpc_core::{load_json, Diagnostics};
use hakorpc_schema::SchemaSet;

use crate::collect::EndpointConfigRef;
use crate::config::ValidatorConfig;
use crate::endpoint::{EndpointValidator, ProcessEndpointValidator};
use crate::error::SetupError;
use crate::references::check_service_references;
use crate::semantics::check_semantics;

/// Findings for one service document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub ok: bool,
    pub diagnostics: Diagnostics,
}

impl DocumentReport {
    fn new(path: &Path, diagnostics: Diagnostics) -> Self {
        Self {
            path: path.to_path_buf(),
            ok: diagnostics.is_empty(),
            diagnostics,
        }
    }

    /// Returns true if the document produced no diagnostics.
    pub fn ok(&self) -> bool {
        self.ok
    }
}

/// Findings for a whole run, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub passed: bool,
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    fn new(documents: Vec<DocumentReport>) -> Self {
        Self {
            passed: documents.iter().all(DocumentReport::ok),
            documents,
        }
    }

    /// Returns true if every document is clean.
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn failed_count(&self) -> usize {
        self.documents.iter().filter(|d| !d.ok()).count()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.documents.iter().map(|d| d.diagnostics.len()).sum()
    }
}

/// Expand input paths into the list of documents to validate.
///
/// Directories are walked recursively for `*.json` files, which are
/// sorted. Anything else, including paths that do not exist, passes
/// through so it is reported when loaded.
pub fn expand_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, SetupError> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            collect_json_files(path, &mut found)?;
            found.sort();
            tracing::debug!(dir = %path.display(), files = found.len(), "expanded directory");
            out.extend(found);
        } else {
            out.push(path.clone());
        }
    }
    Ok(out)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SetupError> {
    let read_err = |source| SetupError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(read_err)?;
        if file_type.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// Validates service documents with a fixed set of schemas and an
/// endpoint validator.
pub struct ValidationPipeline {
    config: ValidatorConfig,
    schemas: SchemaSet,
    endpoint_validator: Box<dyn EndpointValidator>,
}

impl std::fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("config", &self.config)
            .field("schemas", &self.schemas)
            .finish_non_exhaustive()
    }
}

impl ValidationPipeline {
    pub fn new(
        config: ValidatorConfig,
        schemas: SchemaSet,
        endpoint_validator: Box<dyn EndpointValidator>,
    ) -> Self {
        Self {
            config,
            schemas,
            endpoint_validator,
        }
    }

    /// Load the schemas named by `config` and use the external program for
    /// endpoint configs.
    pub fn from_config(config: ValidatorConfig) -> Result<Self, SetupError> {
        let schemas = SchemaSet::load(&config.service_schema, &config.endpoints_schema)?;
        let endpoint_validator = Box::new(ProcessEndpointValidator::from_config(&config));
        Ok(Self::new(config, schemas, endpoint_validator))
    }

    /// Run every check on one service document.
    pub fn validate_document(&self, path: &Path) -> DocumentReport {
        tracing::debug!(document = %path.display(), "validating");
        let mut diags = Diagnostics::new();

        let service = match load_json(path) {
            Ok(service) => service,
            Err(e) => {
                diags.push(e.to_string());
                return DocumentReport::new(path, diags);
            }
        };

        diags.extend(
            self.schemas
                .service
                .validate(&service)
                .iter()
                .map(|v| v.diagnostic(path)),
        );

        let mut refs = check_service_references(&service, path);
        diags.merge(std::mem::take(&mut refs.diagnostics));

        if let Some(file) = &refs.endpoints_file {
            diags.extend(
                self.schemas
                    .endpoints
                    .validate(&file.document)
                    .iter()
                    .map(|v| v.diagnostic(&file.path)),
            );
        }

        if let Some(endpoints) = refs.endpoints_document() {
            if self.config.skip_endpoint_validation {
                tracing::debug!("endpoint validation skipped");
            } else {
                self.validate_endpoint_configs(&refs.endpoint_configs, &mut diags);
            }
            diags.merge(check_semantics(path, &service, endpoints));
        } else {
            tracing::debug!(document = %path.display(), "no endpoints document; identifier checks skipped");
        }

        DocumentReport::new(path, diags)
    }

    /// Existing configs go to the external validator. A validator that is
    /// not ready is reported once for the document instead of per config.
    fn validate_endpoint_configs(&self, configs: &[EndpointConfigRef], diags: &mut Diagnostics) {
        let mut existing = configs.iter().filter(|c| c.path.exists()).peekable();
        if existing.peek().is_none() {
            return;
        }
        if let Err(lines) = self.endpoint_validator.check_ready() {
            diags.extend(lines);
            return;
        }
        for config in existing {
            diags.extend(self.endpoint_validator.validate(&config.path));
        }
    }

    /// Validate each document in turn.
    pub fn run(&self, documents: &[PathBuf]) -> RunReport {
        let report = RunReport::new(
            documents
                .iter()
                .map(|path| self.validate_document(path))
                .collect(),
        );
        tracing::info!(
            documents = report.documents.len(),
            failed = report.failed_count(),
            diagnostics = report.diagnostic_count(),
            "validation finished"
        );
        report
    }
}
