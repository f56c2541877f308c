//! Workload resources: orgs, spaces, apps, packages and tasks.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{Condition, LocalObjectReference};

// ============================================================================
// CFOrg
// ============================================================================

/// An organization. Orgs live in the root namespace and own a namespace of
/// their own in which spaces are placed.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFOrg",
    plural = "cforgs",
    namespaced,
    printcolumn = r#"{"name":"Display Name","type":"string","jsonPath":".spec.displayName"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFOrgSpec {
    /// Human-readable org name, unique across the installation.
    pub display_name: String,
}

// ============================================================================
// CFSpace
// ============================================================================

/// A space inside an org.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFSpace",
    plural = "cfspaces",
    namespaced,
    printcolumn = r#"{"name":"Display Name","type":"string","jsonPath":".spec.displayName"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFSpaceSpec {
    /// Human-readable space name, unique within its org.
    pub display_name: String,
}

// ============================================================================
// CFApp
// ============================================================================

/// An application inside a space.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFApp",
    plural = "cfapps",
    namespaced,
    printcolumn = r#"{"name":"Display Name","type":"string","jsonPath":".spec.displayName"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".spec.desiredState"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFAppSpec {
    /// Human-readable app name, unique within its space.
    pub display_name: String,

    #[serde(default)]
    pub desired_state: DesiredState,

    #[serde(default)]
    pub lifecycle: Lifecycle,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_secret_name: Option<String>,
}

/// Whether the app should be running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DesiredState {
    Started,
    #[default]
    Stopped,
}

/// How the app's droplet is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle {
    #[serde(default)]
    pub r#type: LifecycleType,
    #[serde(default)]
    pub data: LifecycleData,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleType {
    #[default]
    Buildpack,
    Docker,
}

impl std::fmt::Display for LifecycleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleType::Buildpack => write!(f, "buildpack"),
            LifecycleType::Docker => write!(f, "docker"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buildpacks: Vec<String>,
    #[serde(default)]
    pub stack: String,
}

// ============================================================================
// CFPackage
// ============================================================================

/// Source bits or an image an app is built from.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFPackage",
    plural = "cfpackages",
    namespaced,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"App","type":"string","jsonPath":".spec.appRef.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFPackageSpec {
    pub r#type: PackageType,

    #[serde(default)]
    pub app_ref: LocalObjectReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PackageSource>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    Bits,
    Docker,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageSource {
    /// Image reference holding the uploaded bits.
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,
}

// ============================================================================
// CFTask
// ============================================================================

/// A one-off command run against an app's droplet.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "korifi.cloudfoundry.org",
    version = "v1alpha1",
    kind = "CFTask",
    plural = "cftasks",
    status = "CFTaskStatus",
    namespaced,
    printcolumn = r#"{"name":"App","type":"string","jsonPath":".spec.appRef.name"}"#,
    printcolumn = r#"{"name":"Sequence","type":"integer","jsonPath":".status.sequenceId"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CFTaskSpec {
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub app_ref: LocalObjectReference,

    #[serde(default)]
    pub canceled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CFTaskStatus {
    /// Per-app sequence number assigned on creation.
    #[serde(default)]
    pub sequence_id: i64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Condition set once the task command exited successfully
pub const TASK_SUCCEEDED_CONDITION: &str = "Succeeded";
/// Condition set once the task command failed or was killed
pub const TASK_FAILED_CONDITION: &str = "Failed";
