//! CFOrg admission: root-namespace placement, name length and
//! installation-wide unique display names.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;

use crate::coordination::RequestContext;
use crate::crd::CFOrg;
use crate::webhooks::duplicate::{NameValidator, UniqueResource};
use crate::webhooks::error::ValidationError;
use crate::webhooks::placement::PlacementValidator;
use crate::webhooks::validator::{AdmissionValidator, is_being_deleted, owner_of};

pub const ORG_ENTITY_TYPE: &str = "cforg";

/// Longest accepted `metadata.name`; the org namespace is named after it.
pub const MAX_ORG_NAME_LENGTH: usize = 63;

/// An org as seen by the name registry: scoped to the root namespace,
/// compared case-insensitively.
pub struct UniqueOrg<'a> {
    org: &'a CFOrg,
    root_namespace: &'a str,
}

impl<'a> UniqueOrg<'a> {
    pub fn new(org: &'a CFOrg, root_namespace: &'a str) -> Self {
        Self {
            org,
            root_namespace,
        }
    }
}

impl UniqueResource for UniqueOrg<'_> {
    fn unique_scope_and_name(&self) -> (String, String) {
        (
            self.root_namespace.to_string(),
            self.org.spec.display_name.to_lowercase(),
        )
    }

    fn unique_validation_error_message(&self) -> String {
        format!(
            "Organization '{}' already exists.",
            self.org.spec.display_name.to_lowercase()
        )
    }

    fn owner_namespace(&self) -> String {
        owner_of(self.org).0
    }

    fn owner_name(&self) -> String {
        owner_of(self.org).1
    }

    fn is_being_deleted(&self) -> bool {
        is_being_deleted(self.org)
    }
}

pub struct CFOrgValidator {
    names: Arc<dyn NameValidator>,
    placement: Arc<PlacementValidator>,
}

impl CFOrgValidator {
    pub fn new(names: Arc<dyn NameValidator>, placement: Arc<PlacementValidator>) -> Self {
        Self { names, placement }
    }

    fn unique<'a>(&'a self, org: &'a CFOrg) -> UniqueOrg<'a> {
        UniqueOrg::new(org, self.placement.root_namespace())
    }
}

#[async_trait]
impl AdmissionValidator<CFOrg> for CFOrgValidator {
    async fn validate_create(&self, ctx: &RequestContext, org: &CFOrg) -> Result<(), ValidationError> {
        self.placement.validate_org_create(org)?;

        if org.name_any().len() > MAX_ORG_NAME_LENGTH {
            return Err(ValidationError::invalid_field_value(format!(
                "org name cannot be longer than {} chars",
                MAX_ORG_NAME_LENGTH
            )));
        }

        self.names.validate_create(ctx, &self.unique(org)).await
    }

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &CFOrg,
        new: &CFOrg,
    ) -> Result<(), ValidationError> {
        self.names
            .validate_update(ctx, &self.unique(old), &self.unique(new))
            .await
    }

    async fn validate_delete(&self, ctx: &RequestContext, org: &CFOrg) -> Result<(), ValidationError> {
        self.names.validate_delete(ctx, &self.unique(org)).await
    }
}
