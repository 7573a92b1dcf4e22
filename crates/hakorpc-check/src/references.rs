//! # Service Reference Checker
//!
//! Resolves every file a service document points at and reports the ones
//! that do not exist. Along the way it establishes which endpoints
//! document the later identifier checks run against.
//!
//! ## Resolution order
//!
//! 1. `endpoints_config_path`: checked against the service document's
//!    directory. If the file loads, it becomes the endpoints document and
//!    its own directory is the base for the endpoint `config_path`s it
//!    contains.
//! 2. inline `endpoints`: becomes the endpoints document (taking over from
//!    step 1), with the service document's directory as base. Config paths
//!    queued by step 1 are kept.
//! 3. `pdu_config_path`: checked against the service document's directory.
//! 4. every queued endpoint config path.
//!
//! A missing file is reported with the reference text as written in the
//! document, not the resolved absolute path.

use std::path::{Path, PathBuf};

use serde_json::Value;

use hakorpc_core::{access, document_dir, load_json, resolve_ref, Diagnostics};

use crate::collect::{collect_endpoint_configs, EndpointConfigRef};

/// An endpoints document loaded through `endpoints_config_path`.
#[derive(Debug, Clone)]
pub struct EndpointsFile {
    /// Reference text from the service document.
    pub raw: String,
    /// Resolved location of the file.
    pub path: PathBuf,
    /// Parsed content.
    pub document: Value,
}

/// Everything the reference check learned about one service document.
#[derive(Debug, Clone, Default)]
pub struct ReferenceReport {
    /// Missing files and endpoints-file load failures.
    pub diagnostics: Diagnostics,
    /// Endpoints document loaded from `endpoints_config_path`, if any.
    pub endpoints_file: Option<EndpointsFile>,
    /// Inline `endpoints` array, if any.
    pub inline_endpoints: Option<Value>,
    /// Endpoint config references gathered from both forms, in the order
    /// they were queued.
    pub endpoint_configs: Vec<EndpointConfigRef>,
}

impl ReferenceReport {
    /// The endpoints document identifier checks should use. The inline
    /// form takes precedence over the file form.
    pub fn endpoints_document(&self) -> Option<&Value> {
        self.inline_endpoints
            .as_ref()
            .or(self.endpoints_file.as_ref().map(|f| &f.document))
    }
}

/// Check every file reference in an already parsed service document.
pub fn check_service_references(service: &Value, service_path: &Path) -> ReferenceReport {
    let mut report = ReferenceReport::default();
    let base_dir = document_dir(service_path);
    let missing = |raw: &str| format!("{}: missing referenced file: {raw}", service_path.display());

    if let Some(raw) = access::str_field(service, "endpoints_config_path") {
        let resolved = resolve_ref(&base_dir, raw);
        tracing::debug!(reference = raw, resolved = %resolved.display(), "endpoints_config_path");
        if !resolved.exists() {
            report.diagnostics.push(missing(raw));
        } else {
            match load_json(&resolved) {
                Ok(document) => {
                    let endpoints_dir = document_dir(&resolved);
                    report
                        .endpoint_configs
                        .extend(collect_endpoint_configs(&document, &endpoints_dir));
                    report.endpoints_file = Some(EndpointsFile {
                        raw: raw.to_string(),
                        path: resolved,
                        document,
                    });
                }
                Err(e) => report.diagnostics.push(e.to_string()),
            }
        }
    }

    if let Some(inline) = access::field(service, "endpoints").filter(|v| v.is_array()) {
        if report.endpoints_file.is_some() {
            tracing::debug!("inline endpoints take precedence over endpoints_config_path");
        }
        report
            .endpoint_configs
            .extend(collect_endpoint_configs(inline, &base_dir));
        report.inline_endpoints = Some(inline.clone());
    }

    if let Some(raw) = access::str_field(service, "pdu_config_path") {
        let resolved = resolve_ref(&base_dir, raw);
        tracing::debug!(reference = raw, resolved = %resolved.display(), "pdu_config_path");
        if !resolved.exists() {
            report.diagnostics.push(missing(raw));
        }
    }

    for config in &report.endpoint_configs {
        if !config.path.exists() {
            report.diagnostics.push(missing(&config.raw));
        }
    }

    report
}

/// Load the service document at `service_path` and check its references.
///
/// A document that cannot be read or parsed yields a single diagnostic and
/// no further checks.
pub fn check_service_file(service_path: &Path) -> ReferenceReport {
    match load_json(service_path) {
        Ok(service) => check_service_references(&service, service_path),
        Err(e) => {
            let mut report = ReferenceReport::default();
            report.diagnostics.push(e.to_string());
            report
        }
    }
}
