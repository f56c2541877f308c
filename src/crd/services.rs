//! Service resources: instances and the bindings that attach them to apps.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{LocalObjectReference, ObjectReference};

/// A service instance, user-provided or brokered.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFServiceInstance",
    plural = "cfserviceinstances",
    namespaced,
    printcolumn = r#"{"name":"Display Name","type":"string","jsonPath":".spec.displayName"}"#,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFServiceInstanceSpec {
    /// Name shown to users, unique within the space.
    pub display_name: String,

    pub r#type: InstanceType,

    /// Secret holding the credentials.
    #[serde(default)]
    pub secret_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum InstanceType {
    #[default]
    #[serde(rename = "user-provided")]
    UserProvided,
    #[serde(rename = "managed")]
    Managed,
}

/// Attaches a service instance to an app.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFServiceBinding",
    plural = "cfservicebindings",
    namespaced,
    printcolumn = r#"{"name":"App","type":"string","jsonPath":".spec.appRef.name"}"#,
    printcolumn = r#"{"name":"Service","type":"string","jsonPath":".spec.service.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFServiceBindingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    pub app_ref: LocalObjectReference,

    /// The bound service instance.
    pub service: ObjectReference,
}
