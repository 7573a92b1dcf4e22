//! Validator configuration.
//!
//! All file locations and collaborator settings a run needs, gathered into
//! one value that is handed to the pipeline at construction. The command
//! line layer is responsible for filling it from flags and the
//! environment.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the endpoint schema location.
pub const ENDPOINT_SCHEMA_ENV: &str = "HAKO_PDU_ENDPOINT_SCHEMA";

/// Install location of the endpoint schema when nothing overrides it.
pub const DEFAULT_ENDPOINT_SCHEMA: &str =
    "/usr/local/hakoniwa/share/hakoniwa-pdu-endpoint/schema/endpoint_schema.json";

/// File name of the service document schema inside a schema directory.
pub const SERVICE_SCHEMA_FILE: &str = "service.schema.json";

/// File name of the endpoints document schema inside a schema directory.
pub const ENDPOINTS_SCHEMA_FILE: &str = "endpoints.schema.json";

/// Default program for external endpoint validation.
pub const DEFAULT_VALIDATOR_PROGRAM: &str = "python3";

/// Arguments placed before `--schema` for the default program.
pub const DEFAULT_VALIDATOR_ARGS: &[&str] = &["-m", "hakoniwa_pdu_endpoint.validate_json"];

/// Upper bound on a single external validator invocation.
pub const DEFAULT_VALIDATOR_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the endpoint schema path came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSchemaSource {
    /// Given explicitly on the command line.
    Flag(PathBuf),
    /// Taken from [`ENDPOINT_SCHEMA_ENV`].
    Environment(PathBuf),
    /// [`DEFAULT_ENDPOINT_SCHEMA`].
    Default(PathBuf),
}

impl EndpointSchemaSource {
    /// Apply the precedence flag, then environment value, then default.
    /// An empty environment value counts as unset.
    pub fn resolve(flag: Option<&Path>, env_value: Option<&OsStr>) -> Self {
        if let Some(path) = flag {
            return Self::Flag(path.to_path_buf());
        }
        match env_value {
            Some(value) if !value.is_empty() => Self::Environment(PathBuf::from(value)),
            _ => Self::Default(PathBuf::from(DEFAULT_ENDPOINT_SCHEMA)),
        }
    }

    /// The resolved schema path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Flag(p) | Self::Environment(p) | Self::Default(p) => p,
        }
    }
}

impl Default for EndpointSchemaSource {
    fn default() -> Self {
        Self::Default(PathBuf::from(DEFAULT_ENDPOINT_SCHEMA))
    }
}

/// Program and leading arguments used to run the external endpoint
/// validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments placed before `--schema <schema> --check-paths <config>`.
    pub args: Vec<String>,
}

impl ValidatorCommand {
    /// A bare program with no leading arguments.
    pub fn program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

impl Default for ValidatorCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_VALIDATOR_PROGRAM.to_string(),
            args: DEFAULT_VALIDATOR_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Everything a [`ValidationPipeline`](crate::ValidationPipeline) is built
/// from.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Schema for service documents.
    pub service_schema: PathBuf,
    /// Schema for endpoints documents.
    pub endpoints_schema: PathBuf,
    /// Schema handed to the external endpoint validator.
    pub endpoint_schema: EndpointSchemaSource,
    /// Do not invoke the external endpoint validator.
    pub skip_endpoint_validation: bool,
    /// How to invoke the external endpoint validator.
    pub validator_command: ValidatorCommand,
    /// Per-invocation limit for the external endpoint validator.
    pub validator_timeout: Duration,
}

impl ValidatorConfig {
    /// Configuration using the bundled schemas found in `schema_dir` and
    /// defaults for everything else.
    pub fn from_schema_dir(schema_dir: &Path) -> Self {
        Self {
            service_schema: schema_dir.join(SERVICE_SCHEMA_FILE),
            endpoints_schema: schema_dir.join(ENDPOINTS_SCHEMA_FILE),
            endpoint_schema: EndpointSchemaSource::default(),
            skip_endpoint_validation: false,
            validator_command: ValidatorCommand::default(),
            validator_timeout: DEFAULT_VALIDATOR_TIMEOUT,
        }
    }

    /// Returns true if `dir` holds both bundled schema files.
    pub fn is_schema_dir(dir: &Path) -> bool {
        dir.join(SERVICE_SCHEMA_FILE).is_file() && dir.join(ENDPOINTS_SCHEMA_FILE).is_file()
    }
}
