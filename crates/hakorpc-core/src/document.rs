//! JSON document loading.

use std::path::Path;

use serde_json::Value;

use crate::error::DocumentError;

/// Read `path` and parse it as a JSON value.
///
/// The I/O and parse failure cases stay distinct so callers can report
/// "read error" and "JSON parse error" separately.
pub fn load_json(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| DocumentError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
