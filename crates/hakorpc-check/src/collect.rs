//! Per-endpoint config reference collection.

use std::path::{Path, PathBuf};

use serde_json::Value;

use hakorpc_core::{access, resolve_ref};

/// A `config_path` found in an endpoints document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfigRef {
    /// Reference text exactly as written in the document.
    pub raw: String,
    /// `raw` resolved against the endpoints document's directory.
    pub path: PathBuf,
}

/// Collect every endpoint `config_path` in document order (node order,
/// then endpoint order within the node), resolved against `base_dir`.
///
/// Nodes are visited whether or not they carry a valid `nodeId`. Non-array
/// documents, non-object nodes or endpoints, and non-string `config_path`
/// values are skipped.
pub fn collect_endpoint_configs(endpoints_doc: &Value, base_dir: &Path) -> Vec<EndpointConfigRef> {
    let Some(nodes) = endpoints_doc.as_array() else {
        return Vec::new();
    };

    nodes
        .iter()
        .filter_map(|node| access::array_field(node, "endpoints"))
        .flatten()
        .filter_map(|endpoint| access::str_field(endpoint, "config_path"))
        .map(|raw| EndpointConfigRef {
            raw: raw.to_string(),
            path: resolve_ref(base_dir, raw),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_in_document_order() {
        let doc = json!([
            {"nodeId": "b", "endpoints": [
                {"id": "1", "config_path": "b1.json"},
                {"id": "2", "config_path": "b2.json"}
            ]},
            {"nodeId": "a", "endpoints": [{"id": "1", "config_path": "/abs/a1.json"}]}
        ]);
        let refs = collect_endpoint_configs(&doc, Path::new("/cfg"));
        let raws: Vec<&str> = refs.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, ["b1.json", "b2.json", "/abs/a1.json"]);
        assert_eq!(refs[0].path, PathBuf::from("/cfg/b1.json"));
        assert_eq!(refs[2].path, PathBuf::from("/abs/a1.json"));
    }

    #[test]
    fn skips_malformed_shapes() {
        let doc = json!([
            "junk",
            {"nodeId": "n", "endpoints": "nope"},
            {"nodeId": "n", "endpoints": [
                7,
                {"id": "no-path"},
                {"id": "num", "config_path": 3},
                {"id": "ok", "config_path": "ep/ok.json"}
            ]},
            {"endpoints": [{"config_path": "anonymous.json"}]}
        ]);
        let refs = collect_endpoint_configs(&doc, Path::new("/root/cfg"));
        let raws: Vec<&str> = refs.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, ["ep/ok.json", "anonymous.json"]);
    }

    #[test]
    fn non_array_document_collects_nothing() {
        assert!(collect_endpoint_configs(&json!({"endpoints": []}), Path::new("/")).is_empty());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let doc = json!([{"nodeId": "n", "endpoints": [{"id": "e", "config_path": "../ep/e.json"}]}]);
        let refs = collect_endpoint_configs(&doc, Path::new("/cfg/rpc"));
        assert_eq!(refs[0].path, PathBuf::from("/cfg/ep/e.json"));
        assert_eq!(refs[0].raw, "../ep/e.json");
    }
}
