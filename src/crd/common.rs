//! Types shared by several CF resources.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of every CF resource
pub const GROUP: &str = "korifi.cloudfoundry.org";
/// API version of every CF resource
pub const VERSION: &str = "v1alpha1";

/// Label marking a namespace as the home of an org
pub const ORG_GUID_LABEL: &str = "korifi.cloudfoundry.org/org-guid";
/// Label marking a namespace as the home of a space
pub const SPACE_GUID_LABEL: &str = "korifi.cloudfoundry.org/space-guid";

/// Reference to a resource in the same namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalObjectReference {
    #[serde(default)]
    pub name: String,
}

impl LocalObjectReference {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Reference to a resource in any namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// Status condition, following the Kubernetes condition conventions.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition.
    pub r#type: String,
    /// Status of the condition ("True", "False", "Unknown").
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub last_transition_time: String,
}

impl Condition {
    pub fn new(condition_type: &str, status: bool, reason: &str, message: &str) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status: if status {
                "True".to_string()
            } else {
                "False".to_string()
            },
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: jiff::Timestamp::now().to_string(),
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Whether the condition of `condition_type` is present and true.
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    conditions
        .iter()
        .any(|c| c.r#type == condition_type && c.is_true())
}
