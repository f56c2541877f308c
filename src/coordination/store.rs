//! Coordination record storage.
//!
//! The registry only needs four atomic single-object operations. Kubernetes
//! provides them on `Lease` objects: create fails if the name is taken, and a
//! JSON patch with a leading `test` operation is applied atomically or
//! rejected.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use serde_json::json;
use tracing::debug;

use super::error::StoreError;

/// Annotation holding the entity type the name belongs to
pub const ENTITY_TYPE_ANNOTATION: &str = "coordination.cloudfoundry.org/entity-type";
/// Annotation holding the scope the name is unique within
pub const NAMESPACE_ANNOTATION: &str = "coordination.cloudfoundry.org/namespace";
/// Annotation holding the protected display name
pub const NAME_ANNOTATION: &str = "coordination.cloudfoundry.org/name";
/// Annotation holding the namespace of the resource that owns the name
pub const OWNER_NAMESPACE_ANNOTATION: &str = "coordination.cloudfoundry.org/owner-namespace";
/// Annotation holding the name of the resource that owns the name
pub const OWNER_NAME_ANNOTATION: &str = "coordination.cloudfoundry.org/owner-name";

/// Lock state of a coordination record, stored as the lease holder identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HolderState {
    #[default]
    Unlocked,
    Locked,
}

impl HolderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolderState::Unlocked => "none",
            HolderState::Locked => "locked",
        }
    }
}

impl std::fmt::Display for HolderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HolderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(HolderState::Unlocked),
            "locked" => Ok(HolderState::Locked),
            _ => Err(format!("Unknown holder identity: {}", s)),
        }
    }
}

/// One claimed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationRecord {
    /// Hashed key, see [`super::hasher::hash_name`]
    pub key: String,
    /// Scope the name is unique within
    pub namespace: String,
    pub entity_type: String,
    pub display_name: String,
    pub owner_namespace: String,
    pub owner_name: String,
    pub holder: HolderState,
}

impl CoordinationRecord {
    /// Render the record as a Lease.
    pub fn to_lease(&self) -> Lease {
        let annotations = BTreeMap::from([
            (ENTITY_TYPE_ANNOTATION.to_string(), self.entity_type.clone()),
            (NAMESPACE_ANNOTATION.to_string(), self.namespace.clone()),
            (NAME_ANNOTATION.to_string(), self.display_name.clone()),
            (OWNER_NAMESPACE_ANNOTATION.to_string(), self.owner_namespace.clone()),
            (OWNER_NAME_ANNOTATION.to_string(), self.owner_name.clone()),
        ]);

        Lease {
            metadata: ObjectMeta {
                name: Some(self.key.clone()),
                namespace: Some(self.namespace.clone()),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: Some(LeaseSpec {
                holder_identity: Some(self.holder.to_string()),
                ..Default::default()
            }),
        }
    }

    /// Read a record back from a Lease.
    ///
    /// Missing annotations read as empty strings; an unknown holder identity
    /// reads as locked so that nobody can take a lock on a record this
    /// version does not understand.
    pub fn from_lease(lease: &Lease) -> Self {
        let annotation = |key: &str| {
            lease
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(key))
                .cloned()
                .unwrap_or_default()
        };
        let holder = lease
            .spec
            .as_ref()
            .and_then(|s| s.holder_identity.as_deref())
            .map(|h| h.parse().unwrap_or(HolderState::Locked))
            .unwrap_or_default();

        Self {
            key: lease.metadata.name.clone().unwrap_or_default(),
            namespace: lease.metadata.namespace.clone().unwrap_or_default(),
            entity_type: annotation(ENTITY_TYPE_ANNOTATION),
            display_name: annotation(NAME_ANNOTATION),
            owner_namespace: annotation(OWNER_NAMESPACE_ANNOTATION),
            owner_name: annotation(OWNER_NAME_ANNOTATION),
            holder,
        }
    }
}

/// Atomic single-object operations the name registry is built on.
///
/// Implementations must guarantee that concurrent `create` calls for the same
/// `(namespace, key)` produce exactly one success, and that
/// `conditional_patch` compares and swaps the holder state atomically.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Create the record, failing with `AlreadyExists` if the key is taken.
    async fn create(&self, record: &CoordinationRecord) -> Result<(), StoreError>;

    /// Delete the record regardless of its holder state.
    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StoreError>;

    /// Read the record.
    async fn get(&self, namespace: &str, key: &str) -> Result<CoordinationRecord, StoreError>;

    /// Replace the holder state with `replacement` only if it is `expected`.
    async fn conditional_patch(
        &self,
        namespace: &str,
        key: &str,
        expected: HolderState,
        replacement: HolderState,
    ) -> Result<(), StoreError>;
}

/// Build the test-then-replace JSON patch used for lock transitions.
pub fn holder_transition_patch(
    expected: HolderState,
    replacement: HolderState,
) -> Result<json_patch::Patch, serde_json::Error> {
    serde_json::from_value(json!([
        { "op": "test", "path": "/spec/holderIdentity", "value": expected.as_str() },
        { "op": "replace", "path": "/spec/holderIdentity", "value": replacement.as_str() },
    ]))
}

/// Coordination store backed by Kubernetes Leases.
#[derive(Clone)]
pub struct LeaseStore {
    client: Client,
    field_manager: String,
}

impl LeaseStore {
    pub fn new(client: Client, field_manager: &str) -> Self {
        Self {
            client,
            field_manager: field_manager.to_string(),
        }
    }

    fn api(&self, namespace: &str) -> Api<Lease> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl CoordinationStore for LeaseStore {
    async fn create(&self, record: &CoordinationRecord) -> Result<(), StoreError> {
        let params = PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };
        self.api(&record.namespace)
            .create(&params, &record.to_lease())
            .await
            .map_err(|e| StoreError::from_kube(&record.key, e))?;

        debug!(
            namespace = %record.namespace,
            key = %record.key,
            entity_type = %record.entity_type,
            "Created coordination lease"
        );
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StoreError> {
        self.api(namespace)
            .delete(key, &DeleteParams::default())
            .await
            .map_err(|e| StoreError::from_kube(key, e))?;
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<CoordinationRecord, StoreError> {
        let lease = self
            .api(namespace)
            .get(key)
            .await
            .map_err(|e| StoreError::from_kube(key, e))?;
        Ok(CoordinationRecord::from_lease(&lease))
    }

    async fn conditional_patch(
        &self,
        namespace: &str,
        key: &str,
        expected: HolderState,
        replacement: HolderState,
    ) -> Result<(), StoreError> {
        let patch = holder_transition_patch(expected, replacement)?;
        self.api(namespace)
            .patch(
                key,
                &json_patch_params(&self.field_manager),
                &Patch::<()>::Json(patch),
            )
            .await
            .map_err(|e| StoreError::from_kube(key, e))?;
        Ok(())
    }
}

/// Parameters for a JSON patch of a coordination lease.
fn json_patch_params(field_manager: &str) -> PatchParams {
    PatchParams {
        field_manager: Some(field_manager.to_string()),
        ..Default::default()
    }
}
