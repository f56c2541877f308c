//! CFSpace admission.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;

use crate::coordination::RequestContext;
use crate::crd::CFSpace;
use crate::webhooks::duplicate::{NameValidator, UniqueResource};
use crate::webhooks::error::ValidationError;
use crate::webhooks::placement::PlacementValidator;
use crate::webhooks::validator::{AdmissionValidator, is_being_deleted, owner_of};

pub const SPACE_ENTITY_TYPE: &str = "cfspace";

impl UniqueResource for CFSpace {
    fn unique_scope_and_name(&self) -> (String, String) {
        (
            self.namespace().unwrap_or_default(),
            self.spec.display_name.to_lowercase(),
        )
    }

    fn unique_validation_error_message(&self) -> String {
        format!(
            "Space '{}' already exists. Name must be unique per organization.",
            self.spec.display_name.to_lowercase()
        )
    }

    fn owner_namespace(&self) -> String {
        owner_of(self).0
    }

    fn owner_name(&self) -> String {
        owner_of(self).1
    }

    fn is_being_deleted(&self) -> bool {
        is_being_deleted(self)
    }
}

pub struct CFSpaceValidator {
    names: Arc<dyn NameValidator>,
    placement: Arc<PlacementValidator>,
}

impl CFSpaceValidator {
    pub fn new(names: Arc<dyn NameValidator>, placement: Arc<PlacementValidator>) -> Self {
        Self { names, placement }
    }
}

#[async_trait]
impl AdmissionValidator<CFSpace> for CFSpaceValidator {
    async fn validate_create(
        &self,
        ctx: &RequestContext,
        space: &CFSpace,
    ) -> Result<(), ValidationError> {
        self.placement.validate_space_create(ctx, space).await?;
        self.names.validate_create(ctx, space).await
    }

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &CFSpace,
        new: &CFSpace,
    ) -> Result<(), ValidationError> {
        self.names.validate_update(ctx, old, new).await
    }

    async fn validate_delete(
        &self,
        ctx: &RequestContext,
        space: &CFSpace,
    ) -> Result<(), ValidationError> {
        self.names.validate_delete(ctx, space).await
    }
}
