//! Hierarchy placement checks: orgs in the root namespace, spaces in org
//! namespaces.

use std::sync::Arc;

use kube::ResourceExt;
use tracing::error;

use super::error::ValidationError;
use super::lookup::{NamespaceCategory, ResourceLookup};
use crate::coordination::RequestContext;
use crate::crd::{CFOrg, CFSpace};

/// Read-only placement validator.
pub struct PlacementValidator {
    lookup: Arc<dyn ResourceLookup>,
    root_namespace: String,
}

impl PlacementValidator {
    pub fn new(lookup: Arc<dyn ResourceLookup>, root_namespace: &str) -> Self {
        Self {
            lookup,
            root_namespace: root_namespace.to_string(),
        }
    }

    pub fn root_namespace(&self) -> &str {
        &self.root_namespace
    }

    pub fn validate_org_create(&self, org: &CFOrg) -> Result<(), ValidationError> {
        if org.namespace().as_deref() != Some(self.root_namespace.as_str()) {
            return Err(ValidationError::invalid_placement(format!(
                "Organization '{}' must be placed in the root '{}' namespace",
                org.spec.display_name, self.root_namespace
            )));
        }
        Ok(())
    }

    pub async fn validate_space_create(
        &self,
        ctx: &RequestContext,
        space: &CFSpace,
    ) -> Result<(), ValidationError> {
        let namespace = space.namespace().unwrap_or_default();

        let category = self
            .lookup
            .namespace_category(ctx, &namespace)
            .await
            .map_err(|e| {
                error!(namespace = %namespace, error = %e, "Failed to look up space namespace");
                ValidationError::unknown()
            })?;

        match category {
            Some(NamespaceCategory::Org) => Ok(()),
            Some(_) => Err(ValidationError::invalid_placement(format!(
                "Space '{}' must be placed in an organization namespace, '{}' is not one",
                space.spec.display_name, namespace
            ))),
            None => Err(ValidationError::invalid_placement(format!(
                "Organization '{}' does not exist for Space '{}'",
                namespace, space.spec.display_name
            ))),
        }
    }
}
