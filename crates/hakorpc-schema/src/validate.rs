//! # Schema Validation
//!
//! Validates parsed JSON documents against JSON Schema (Draft 7)
//! definitions loaded from disk.
//!
//! ## Schema Resolution
//!
//! Cross-schema `$ref`s are resolved from the directory holding the root
//! schema, by file name. The validator never makes network requests: a
//! reference that does not name a local file resolves to a permissive
//! empty schema and is logged.
//!
//! ## Ordering
//!
//! Violations are reported sorted by instance location, segment by
//! segment, with array indices compared numerically. Violations at the
//! same location keep the order the validator produced them in.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;
use thiserror::Error;

use hakorpc_core::{load_json, DocumentError};

/// Local retriever that resolves `$ref` URIs to sibling schema files.
///
/// The last path segment of the URI is looked up in `schema_dir`. This
/// keeps every reference resolution on the local filesystem.
struct LocalSchemaRetriever {
    schema_dir: PathBuf,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);

        let candidate = self.schema_dir.join(filename);
        if !filename.is_empty() && candidate.is_file() {
            return Ok(load_json(&candidate)?);
        }

        tracing::warn!(uri = uri_str, "unresolved schema $ref; treating as permissive");
        Ok(serde_json::json!({}))
    }
}

/// Errors while loading or compiling a schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema file could not be read or parsed.
    #[error("schema load error for '{}': {reason}", path.display())]
    SchemaLoad {
        /// Path of the schema file.
        path: PathBuf,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The schema parsed as JSON but is not a valid schema.
    #[error("validator build error for schema '{}': {reason}", path.display())]
    ValidatorBuild {
        /// Path of the schema file.
        path: PathBuf,
        /// Reason the validator could not be built.
        reason: String,
    },
}

/// A single schema violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// Instance location as `services/0/name`, or `(root)` for the
    /// document itself.
    pub fn location(&self) -> String {
        let segments = pointer_segments(&self.instance_path);
        if segments.is_empty() {
            "(root)".to_string()
        } else {
            segments.join("/")
        }
    }

    /// Render as a diagnostic line attributed to `document`.
    pub fn diagnostic(&self, document: &Path) -> String {
        format!("{}: {}: {}", document.display(), self.location(), self.message)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self.message)
    }
}

/// A compiled schema.
pub struct SchemaValidator {
    path: PathBuf,
    validator: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Load and compile the schema at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::SchemaLoad` if the file cannot be read or is
    /// not JSON, and `SchemaError::ValidatorBuild` if it is not a valid
    /// Draft 7 schema.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref().to_path_buf();
        let schema = load_json(&path).map_err(|e| SchemaError::SchemaLoad {
            path: path.clone(),
            reason: match e {
                DocumentError::Read { source, .. } => format!("cannot read file: {source}"),
                DocumentError::Parse { source, .. } => format!("invalid JSON: {source}"),
            },
        })?;
        let schema_dir = hakorpc_core::document_dir(&path);
        Self::from_value(&schema, &path, &schema_dir)
    }

    /// Compile an in-memory schema. `$ref`s resolve against `schema_dir`.
    pub fn from_value(
        schema: &Value,
        origin: &Path,
        schema_dir: &Path,
    ) -> Result<Self, SchemaError> {
        let opts = build_options(schema_dir);
        let validator = opts.build(schema).map_err(|e| SchemaError::ValidatorBuild {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(schema = %origin.display(), "compiled schema");
        Ok(Self {
            path: origin.to_path_buf(),
            validator,
        })
    }

    /// Path the schema was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate `instance`, returning every violation in location order.
    /// An empty result means the document is valid.
    pub fn validate(&self, instance: &Value) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        violations.sort_by(|a, b| compare_locations(&a.instance_path, &b.instance_path));
        for v in &violations {
            tracing::debug!(
                schema = %self.path.display(),
                location = %v.location(),
                keyword = %v.schema_path,
                "schema violation"
            );
        }
        violations
    }
}

/// The schemas a validation run is set up with.
#[derive(Debug)]
pub struct SchemaSet {
    /// Schema for service documents.
    pub service: SchemaValidator,
    /// Schema for endpoints documents.
    pub endpoints: SchemaValidator,
}

impl SchemaSet {
    /// Load and compile both schemas.
    pub fn load(service: &Path, endpoints: &Path) -> Result<Self, SchemaError> {
        Ok(Self {
            service: SchemaValidator::from_file(service)?,
            endpoints: SchemaValidator::from_file(endpoints)?,
        })
    }
}

fn build_options(schema_dir: &Path) -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft7);
    opts.with_retriever(LocalSchemaRetriever {
        schema_dir: schema_dir.to_path_buf(),
    });
    opts
}

/// Split a JSON Pointer into unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Index(u64),
    Key(String),
}

fn location_key(pointer: &str) -> Vec<Segment> {
    pointer_segments(pointer)
        .into_iter()
        .map(|s| match s.parse::<u64>() {
            Ok(i) => Segment::Index(i),
            Err(_) => Segment::Key(s),
        })
        .collect()
}

fn compare_locations(a: &str, b: &str) -> Ordering {
    location_key(a).cmp(&location_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(schema: Value) -> SchemaValidator {
        SchemaValidator::from_value(&schema, Path::new("inline.schema.json"), Path::new("."))
            .unwrap()
    }

    #[test]
    fn valid_document_has_no_violations() {
        let v = compile(json!({"type": "object", "required": ["services"]}));
        assert!(v.validate(&json!({"services": []})).is_empty());
    }

    #[test]
    fn missing_required_property_reported_at_root() {
        let v = compile(json!({"type": "object", "required": ["services"]}));
        let violations = v.validate(&json!({}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location(), "(root)");
        assert!(violations[0].message.contains("services"));
    }

    #[test]
    fn violations_sorted_by_location_with_numeric_indices() {
        let v = compile(json!({
            "type": "array",
            "items": {"type": "object", "required": ["id"]}
        }));
        let mut items = vec![json!({"id": "ok"}); 12];
        items[10] = json!({});
        items[2] = json!({});
        let violations = v.validate(&Value::Array(items));
        let locations: Vec<String> = violations.iter().map(Violation::location).collect();
        assert_eq!(locations, ["2", "10"]);
    }

    #[test]
    fn diagnostic_names_document_and_location() {
        let violation = Violation {
            instance_path: "/services/0/name".to_string(),
            schema_path: "/properties/services/items/properties/name/type".to_string(),
            message: r#"5 is not of type "string""#.to_string(),
        };
        assert_eq!(
            violation.diagnostic(Path::new("svc.json")),
            r#"svc.json: services/0/name: 5 is not of type "string""#
        );
    }

    #[test]
    fn pointer_escapes_are_decoded() {
        let violation = Violation {
            instance_path: "/a~1b/c~0d".to_string(),
            schema_path: String::new(),
            message: "m".to_string(),
        };
        assert_eq!(violation.location(), "a/b/c~d");
    }

    #[test]
    fn keys_sort_after_indices() {
        assert_eq!(compare_locations("/0", "/name"), Ordering::Less);
        assert_eq!(compare_locations("", "/0"), Ordering::Less);
        assert_eq!(compare_locations("/services/1", "/services/1"), Ordering::Equal);
    }

    #[test]
    fn missing_schema_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SchemaValidator::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaLoad { .. }), "{err}");
    }

    #[test]
    fn invalid_schema_is_build_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.schema.json");
        std::fs::write(&path, br#"{"type": 12}"#).unwrap();
        let err = SchemaValidator::from_file(&path).unwrap_err();
        assert!(matches!(err, SchemaError::ValidatorBuild { .. }), "{err}");
    }

    #[test]
    fn sibling_ref_resolves_from_schema_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("name.schema.json"),
            br#"{"type": "string", "minLength": 1}"#,
        )
        .unwrap();
        let root = dir.path().join("root.schema.json");
        std::fs::write(
            &root,
            br#"{"type": "object", "properties": {"name": {"$ref": "name.schema.json"}}}"#,
        )
        .unwrap();
        let v = SchemaValidator::from_file(&root).unwrap();
        assert!(v.validate(&json!({"name": "svc"})).is_empty());
        assert_eq!(v.validate(&json!({"name": ""})).len(), 1);
    }
}
