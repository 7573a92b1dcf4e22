//! # Endpoint Index
//!
//! Lookup from node id to the endpoint ids declared under it, derived from
//! an endpoints document.
//!
//! Every well-formed node becomes a key, even with no endpoints, so
//! "unknown node" and "known node, unknown endpoint" stay distinguishable.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use hakorpc_core::access;

/// Outcome of resolving an `(nodeId, endpointId)` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointLookup {
    /// The node exists and declares the endpoint.
    Found,
    /// No node with this id.
    UnknownNode,
    /// The node exists but does not declare the endpoint.
    UnknownEndpoint,
}

/// Node id → endpoint ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointIndex {
    nodes: BTreeMap<String, BTreeSet<String>>,
}

impl EndpointIndex {
    /// Resolve a reference. The node is checked first, so at most one kind
    /// of failure applies.
    pub fn lookup(&self, node_id: &str, endpoint_id: &str) -> EndpointLookup {
        match self.endpoints(node_id) {
            None => EndpointLookup::UnknownNode,
            Some(endpoints) if endpoints.contains(endpoint_id) => EndpointLookup::Found,
            Some(_) => EndpointLookup::UnknownEndpoint,
        }
    }

    /// Endpoint ids declared under `node_id`.
    pub fn endpoints(&self, node_id: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(node_id)
    }

    /// Number of declared nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Build the index from an endpoints document.
///
/// Anything malformed is skipped: a non-array document yields an empty
/// index, nodes need an object shape and a non-empty string `nodeId`,
/// endpoints need an object shape and a non-empty string `id`. A node
/// whose `endpoints` is missing or not an array is still registered.
pub fn build_endpoint_index(endpoints_doc: &Value) -> EndpointIndex {
    let mut index = EndpointIndex::default();
    let Some(nodes) = endpoints_doc.as_array() else {
        return index;
    };

    for node in nodes {
        let Some(node_id) = access::non_empty_str(node, "nodeId") else {
            continue;
        };
        let ids = index.nodes.entry(node_id.to_string()).or_default();
        let Some(endpoints) = access::array_field(node, "endpoints") else {
            continue;
        };
        for endpoint in endpoints {
            if let Some(id) = access::non_empty_str(endpoint, "id") {
                ids.insert(id.to_string());
            }
        }
    }

    index
}
