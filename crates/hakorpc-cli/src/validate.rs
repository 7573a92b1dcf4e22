//! # Validate Subcommand
//!
//! Runs the validation pipeline over the given paths and renders the
//! findings.
//!
//! Text output prints `<path>: OK` on stdout for clean documents and every
//! diagnostic on stderr. JSON output writes one report object on stdout.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use hakorpc_check::config::{ENDPOINT_SCHEMA_ENV, SERVICE_SCHEMA_FILE};
use hakorpc_check::{
    expand_inputs, EndpointSchemaSource, RunReport, ValidationPipeline, ValidatorCommand,
    ValidatorConfig,
};

use crate::{EXIT_DIAGNOSTICS, EXIT_OK};

/// Environment variable naming the bundled schema directory.
pub const SCHEMA_DIR_ENV: &str = "HAKORPC_SCHEMA_DIR";

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `<path>: OK` lines on stdout, diagnostics on stderr.
    #[default]
    Text,
    /// A single JSON report on stdout.
    Json,
}

/// Arguments for the `hakorpc validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Service documents, or directories searched recursively for `*.json`.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Do not run the external validator on endpoint config files.
    #[arg(long)]
    pub skip_endpoint_validation: bool,

    /// Endpoint schema handed to the external validator. Falls back to
    /// HAKO_PDU_ENDPOINT_SCHEMA, then the install location.
    #[arg(long, value_name = "FILE")]
    pub endpoint_schema: Option<PathBuf>,

    /// Directory holding service.schema.json and endpoints.schema.json.
    #[arg(long, value_name = "DIR", env = SCHEMA_DIR_ENV)]
    pub schema_dir: Option<PathBuf>,

    /// Program run as `<PROGRAM> --schema <FILE> --check-paths <CONFIG>`
    /// instead of the python module.
    #[arg(long, value_name = "PROGRAM")]
    pub endpoint_validator: Option<String>,

    /// Seconds before an external validator run is killed.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub validator_timeout: u64,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ValidateArgs {
    /// Build the pipeline configuration. `endpoint_schema_env` is the
    /// value of [`ENDPOINT_SCHEMA_ENV`], if set.
    pub fn to_config(&self, schema_dir: &Path, endpoint_schema_env: Option<&OsStr>) -> ValidatorConfig {
        let mut config = ValidatorConfig::from_schema_dir(schema_dir);
        config.endpoint_schema =
            EndpointSchemaSource::resolve(self.endpoint_schema.as_deref(), endpoint_schema_env);
        config.skip_endpoint_validation = self.skip_endpoint_validation;
        if let Some(program) = &self.endpoint_validator {
            config.validator_command = ValidatorCommand::program(program);
        }
        config.validator_timeout = Duration::from_secs(self.validator_timeout);
        config
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code 0 when every document is clean and 1 otherwise. An
/// error means the run could not be set up.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    run_validate_to(args, &mut io::stdout().lock(), &mut io::stderr().lock())
}

/// [`run_validate`] with the report written to `out` and `err` in place of
/// stdout and stderr.
pub fn run_validate_to(args: &ValidateArgs, out: &mut impl Write, err: &mut impl Write) -> Result<u8> {
    let schema_dir = locate_schema_dir(args.schema_dir.as_deref())?;
    tracing::debug!(schema_dir = %schema_dir.display(), "using bundled schemas");

    let endpoint_schema_env = std::env::var_os(ENDPOINT_SCHEMA_ENV);
    let config = args.to_config(&schema_dir, endpoint_schema_env.as_deref());
    tracing::debug!(endpoint_schema = ?config.endpoint_schema, "endpoint schema");

    let pipeline = ValidationPipeline::from_config(config).context("failed to set up validator")?;
    let documents = expand_inputs(&args.paths).context("failed to list input documents")?;
    let report = pipeline.run(&documents);

    match args.format {
        OutputFormat::Text => render_text(&report, out, err)?,
        OutputFormat::Json => render_json(&report, out)?,
    }

    Ok(if report.passed() {
        EXIT_OK
    } else {
        EXIT_DIAGNOSTICS
    })
}

/// Write `<path>: OK` to `out` for clean documents and each diagnostic to
/// `err` for the rest, in document order.
pub fn render_text(report: &RunReport, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
    for document in &report.documents {
        if document.ok() {
            writeln!(out, "{}: OK", document.path.display())?;
        } else {
            for line in &document.diagnostics {
                writeln!(err, "{line}")?;
            }
        }
    }
    out.flush()?;
    err.flush()
}

pub fn render_json(report: &RunReport, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).context("failed to serialize report")?;
    writeln!(out)?;
    Ok(())
}

/// Resolve the bundled schema directory.
///
/// An explicit directory (flag or [`SCHEMA_DIR_ENV`]) must hold both
/// schemas. Otherwise the nearest ancestor of the working directory with a
/// `schemas/` directory is used, then the same search from the executable.
pub fn locate_schema_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        if !ValidatorConfig::is_schema_dir(dir) {
            bail!(
                "{}: not a schema directory (expected {SERVICE_SCHEMA_FILE} and endpoints.schema.json)",
                dir.display()
            );
        }
        return Ok(dir.to_path_buf());
    }

    let cwd = std::env::current_dir().ok();
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    cwd.iter()
        .chain(exe_dir.iter())
        .find_map(|start| find_schema_dir(start))
        .with_context(|| {
            format!("cannot locate bundled schemas; pass --schema-dir or set {SCHEMA_DIR_ENV}")
        })
}

/// Nearest `schemas/` directory holding both schemas, searching `start`
/// and its ancestors.
pub fn find_schema_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("schemas"))
        .find(|candidate| ValidatorConfig::is_schema_dir(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use hakorpc_check::config::{DEFAULT_ENDPOINT_SCHEMA, ENDPOINTS_SCHEMA_FILE};
    use hakorpc_check::DocumentReport;
    use hakorpc_core::Diagnostics;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: ValidateArgs,
    }

    fn parse(argv: &[&str]) -> ValidateArgs {
        let argv = std::iter::once("validate").chain(argv.iter().copied());
        TestCli::try_parse_from(argv).unwrap().args
    }

    fn repo_root() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop(); // crates/
        dir.pop(); // repo root
        dir
    }

    fn report(docs: Vec<(&str, Vec<&str>)>) -> RunReport {
        let documents = docs
            .into_iter()
            .map(|(path, lines)| {
                let diagnostics: Diagnostics = lines.iter().map(|l| l.to_string()).collect();
                DocumentReport {
                    path: PathBuf::from(path),
                    ok: diagnostics.is_empty(),
                    diagnostics,
                }
            })
            .collect::<Vec<_>>();
        RunReport {
            passed: documents.iter().all(DocumentReport::ok),
            documents,
        }
    }

    #[test]
    fn defaults() {
        let args = parse(&["a.json", "dir/"]);
        assert_eq!(args.paths, [PathBuf::from("a.json"), PathBuf::from("dir/")]);
        assert!(!args.skip_endpoint_validation);
        assert_eq!(args.validator_timeout, 60);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.endpoint_validator.is_none());
    }

    #[test]
    fn all_flags() {
        let args = parse(&[
            "--skip-endpoint-validation",
            "--endpoint-schema",
            "/s/endpoint.json",
            "--schema-dir",
            "/opt/schemas",
            "--endpoint-validator",
            "my-validator",
            "--validator-timeout",
            "5",
            "--format",
            "json",
            "svc.json",
        ]);
        assert!(args.skip_endpoint_validation);
        assert_eq!(args.endpoint_schema, Some(PathBuf::from("/s/endpoint.json")));
        assert_eq!(args.schema_dir, Some(PathBuf::from("/opt/schemas")));
        assert_eq!(args.format, OutputFormat::Json);

        let config = args.to_config(Path::new("/opt/schemas"), None);
        assert!(config.skip_endpoint_validation);
        assert_eq!(config.validator_command, ValidatorCommand::program("my-validator"));
        assert_eq!(config.validator_timeout, Duration::from_secs(5));
        assert_eq!(
            config.endpoint_schema,
            EndpointSchemaSource::Flag("/s/endpoint.json".into())
        );
        assert_eq!(config.service_schema, PathBuf::from("/opt/schemas/service.schema.json"));
    }

    #[test]
    fn rejects_unknown_format() {
        let argv = ["validate", "--format", "yaml", "svc.json"];
        assert!(TestCli::try_parse_from(argv).is_err());
    }

    #[test]
    fn endpoint_schema_falls_back_to_environment_then_default() {
        let args = parse(&["svc.json"]);
        let from_env = args.to_config(Path::new("s"), Some(OsStr::new("/env/endpoint.json")));
        assert_eq!(from_env.endpoint_schema.path(), Path::new("/env/endpoint.json"));
        let default = args.to_config(Path::new("s"), None);
        assert_eq!(default.endpoint_schema.path(), Path::new(DEFAULT_ENDPOINT_SCHEMA));
        assert_eq!(default.validator_command, ValidatorCommand::default());
    }

    #[test]
    fn text_output_splits_ok_and_diagnostics() {
        let report = report(vec![
            ("a.json", vec![]),
            ("b.json", vec!["b.json: rpc.pduMetaDataSize: must be 24", "b.json: (root): oops"]),
            ("c.json", vec![]),
        ]);
        let (mut out, mut err) = (Vec::new(), Vec::new());
        render_text(&report, &mut out, &mut err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a.json: OK\nc.json: OK\n");
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "b.json: rpc.pduMetaDataSize: must be 24\nb.json: (root): oops\n"
        );
    }

    #[test]
    fn json_output_is_one_report() {
        let report = report(vec![("a.json", vec![]), ("b.json", vec!["b.json: bad"])]);
        let mut out = Vec::new();
        render_json(&report, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["passed"], false);
        assert_eq!(value["documents"][0]["ok"], true);
        assert_eq!(value["documents"][1]["diagnostics"][0], "b.json: bad");
    }

    #[test]
    fn finds_schema_dir_from_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        std::fs::create_dir_all(&schemas).unwrap();
        std::fs::write(schemas.join(SERVICE_SCHEMA_FILE), b"{}").unwrap();
        std::fs::write(schemas.join(ENDPOINTS_SCHEMA_FILE), b"{}").unwrap();
        let nested = dir.path().join("config/rpc");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_schema_dir(&nested), Some(schemas));
    }

    #[test]
    fn explicit_schema_dir_must_hold_both_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_schema_dir(Some(dir.path())).unwrap_err();
        assert!(err.to_string().contains("not a schema directory"), "{err}");
        let bundled = repo_root().join("schemas");
        assert_eq!(locate_schema_dir(Some(bundled.as_path())).unwrap(), bundled);
    }

    #[test]
    fn run_validate_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::write(&good, br#"{"services": []}"#).unwrap();
        std::fs::write(&bad, br#"{"services": "none"}"#).unwrap();
        let schema_dir = repo_root().join("schemas");
        let schema_dir = schema_dir.to_str().unwrap();

        let clean = parse(&["--schema-dir", schema_dir, good.to_str().unwrap()]);
        assert_eq!(run_validate(&clean).unwrap(), EXIT_OK);

        let dirty = parse(&["--schema-dir", schema_dir, good.to_str().unwrap(), bad.to_str().unwrap()]);
        assert_eq!(run_validate(&dirty).unwrap(), EXIT_DIAGNOSTICS);

        let broken = parse(&["--schema-dir", dir.path().to_str().unwrap(), good.to_str().unwrap()]);
        assert!(run_validate(&broken).is_err());
    }
}
