//! # Semantic Consistency Checks
//!
//! Service-level invariants and cross-document identifier bindings for a
//! parsed service document, checked against an endpoints document.
//!
//! ## Invariants
//!
//! - `pduMetaDataSize`, when it is an integer, equals [`PDU_METADATA_SIZE`].
//! - Service names are unique within the document.
//! - A service has no more `clients` than `maxClients`.
//! - Every server and client endpoint reference names a declared node and
//!   an endpoint declared under that node.
//! - Within one service, client names are unique and every
//!   `requestChannelId` / `responseChannelId` value is used once. Request
//!   and response ids share a single namespace.
//!
//! Each violation is reported on its own line. Nothing short-circuits: a
//! service with five problems yields five diagnostics.

use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;

use serde_json::Value;

use hakorpc_core::{access, Diagnostics};

use crate::index::{build_endpoint_index, EndpointIndex, EndpointLookup};

/// Fixed size of the PDU metadata header. Not configurable.
pub const PDU_METADATA_SIZE: i128 = 24;

const CHANNEL_FIELDS: [&str; 2] = ["requestChannelId", "responseChannelId"];

/// Run every semantic check on `service` against `endpoints`.
pub fn check_semantics(service_path: &Path, service: &Value, endpoints: &Value) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let document = service_path.display();

    if let Some(size) = access::int_field(service, "pduMetaDataSize") {
        if size != PDU_METADATA_SIZE {
            diags.push(format!(
                "{document}: rpc.pduMetaDataSize: must be {PDU_METADATA_SIZE}"
            ));
        }
    }

    let index = build_endpoint_index(endpoints);
    tracing::debug!(document = %document, nodes = index.node_count(), "endpoint index built");

    let Some(services) = access::array_field(service, "services") else {
        return diags;
    };

    let mut service_names: HashSet<&str> = HashSet::new();
    for (si, svc) in services.iter().enumerate() {
        if !svc.is_object() {
            continue;
        }

        let label = match access::non_empty_str(svc, "name") {
            Some(name) => {
                if !service_names.insert(name) {
                    diags.push(format!(
                        "{document}: rpc.services: duplicate service name '{name}'"
                    ));
                }
                name.to_string()
            }
            None => format!("<services[{si}]>"),
        };
        let scope = format!("{document}: rpc.services[{si}] '{label}'");

        check_capacity(&scope, svc, &mut diags);
        check_server_endpoints(&scope, svc, &index, &mut diags);
        check_clients(&scope, svc, &index, &mut diags);
    }

    diags
}

fn check_capacity(scope: &str, svc: &Value, diags: &mut Diagnostics) {
    let (Some(max_clients), Some(clients)) = (
        access::int_field(svc, "maxClients"),
        access::array_field(svc, "clients"),
    ) else {
        return;
    };
    // usize always fits in i128.
    let count = clients.len() as i128;
    if count > max_clients {
        diags.push(format!(
            "{scope}: clients.length({count}) > maxClients({max_clients})"
        ));
    }
}

/// `server_endpoints` if present, else the legacy singular
/// `server_endpoint` as a one-element list.
fn server_endpoints(svc: &Value) -> Vec<&Value> {
    match access::field(svc, "server_endpoints") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(_) => Vec::new(),
        None => access::field(svc, "server_endpoint")
            .filter(|v| v.is_object())
            .into_iter()
            .collect(),
    }
}

fn check_server_endpoints(scope: &str, svc: &Value, index: &EndpointIndex, diags: &mut Diagnostics) {
    for (ei, entry) in server_endpoints(svc).into_iter().enumerate() {
        let Some((node, endpoint)) = endpoint_ref(entry) else {
            continue;
        };
        let at = format!("{scope}: server_endpoints[{ei}]");
        report_lookup(&at, "server", node, endpoint, index, diags);
    }
}

fn check_clients(scope: &str, svc: &Value, index: &EndpointIndex, diags: &mut Diagnostics) {
    let Some(clients) = access::array_field(svc, "clients") else {
        return;
    };

    let mut client_names: HashSet<&str> = HashSet::new();
    let mut used_channels: HashSet<i128> = HashSet::new();

    for (ci, client) in clients.iter().enumerate() {
        if !client.is_object() {
            continue;
        }
        let at = format!("{scope}: clients[{ci}]");

        if let Some(name) = access::non_empty_str(client, "name") {
            if !client_names.insert(name) {
                diags.push(format!("{at}: duplicate client name '{name}'"));
            }
        }

        for key in CHANNEL_FIELDS {
            if let Some(channel) = access::int_field(client, key) {
                if !used_channels.insert(channel) {
                    diags.push(format!("{at}: channel collision: {channel} ({key})"));
                }
            }
        }

        if let Some((node, endpoint)) = access::field(client, "client_endpoint").and_then(endpoint_ref) {
            report_lookup(&at, "client", node, endpoint, index, diags);
        }
    }
}

/// `(nodeId, endpointId)` of an endpoint reference object, if both are
/// non-empty strings.
fn endpoint_ref(value: &Value) -> Option<(&str, &str)> {
    Some((
        access::non_empty_str(value, "nodeId")?,
        access::non_empty_str(value, "endpointId")?,
    ))
}

fn report_lookup(
    at: impl Display,
    role: &str,
    node: &str,
    endpoint: &str,
    index: &EndpointIndex,
    diags: &mut Diagnostics,
) {
    match index.lookup(node, endpoint) {
        EndpointLookup::Found => {}
        EndpointLookup::UnknownNode => diags.push(format!(
            "{at}: {role} nodeId '{node}' not found in rpc.endpoints"
        )),
        EndpointLookup::UnknownEndpoint => diags.push(format!(
            "{at}: {role} endpointId '{endpoint}' not found under node '{node}'"
        )),
    }
}
