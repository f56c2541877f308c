//! Networking resources: domains and routes.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{LocalObjectReference, ObjectReference};

/// A domain routes can be created under.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFDomain",
    plural = "cfdomains",
    namespaced,
    printcolumn = r#"{"name":"Domain","type":"string","jsonPath":".spec.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFDomainSpec {
    /// Fully qualified domain name, e.g. `apps.example.com`.
    pub name: String,
}

/// A route `<host>.<domain>[/<path>]` and the app processes it sends
/// traffic to.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFRoute",
    plural = "cfroutes",
    namespaced,
    printcolumn = r#"{"name":"Host","type":"string","jsonPath":".spec.host"}"#,
    printcolumn = r#"{"name":"Path","type":"string","jsonPath":".spec.path"}"#,
    printcolumn = r#"{"name":"Domain","type":"string","jsonPath":".spec.domainRef.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFRouteSpec {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub path: String,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    pub domain_ref: ObjectReference,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destinations: Vec<Destination>,
}

fn default_protocol() -> String {
    "http".to_string()
}

/// Where a route sends traffic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default)]
    pub guid: String,

    /// App in the route's namespace.
    pub app_ref: LocalObjectReference,

    #[serde(default = "default_process_type")]
    pub process_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

fn default_process_type() -> String {
    "web".to_string()
}
