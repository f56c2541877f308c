//! CFServiceInstance admission.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;

use crate::coordination::RequestContext;
use crate::crd::CFServiceInstance;
use crate::webhooks::duplicate::{NameValidator, UniqueResource};
use crate::webhooks::error::ValidationError;
use crate::webhooks::validator::{AdmissionValidator, ensure_unchanged, is_being_deleted, owner_of};

pub const SERVICE_INSTANCE_ENTITY_TYPE: &str = "cfserviceinstance";

impl UniqueResource for CFServiceInstance {
    fn unique_scope_and_name(&self) -> (String, String) {
        (
            self.namespace().unwrap_or_default(),
            self.spec.display_name.clone(),
        )
    }

    fn unique_validation_error_message(&self) -> String {
        // cf CLI matches on "The service instance name is taken"
        format!(
            "The service instance name is taken: {}",
            self.spec.display_name
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

pub struct CFServiceInstanceValidator {
    names: Arc<dyn NameValidator>,
}

impl CFServiceInstanceValidator {
    pub fn new(names: Arc<dyn NameValidator>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl AdmissionValidator<CFServiceInstance> for CFServiceInstanceValidator {
    async fn validate_create(
        &self,
        ctx: &RequestContext,
        instance: &CFServiceInstance,
    ) -> Result<(), ValidationError> {
        self.names.validate_create(ctx, instance).await
    }

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &CFServiceInstance,
        new: &CFServiceInstance,
    ) -> Result<(), ValidationError> {
        if !is_being_deleted(new) {
            ensure_unchanged(
                "CFServiceInstance.Spec.Type",
                &old.spec.r#type,
                &new.spec.r#type,
            )?;
        }
        self.names.validate_update(ctx, old, new).await
    }

    async fn validate_delete(
        &self,
        ctx: &RequestContext,
        instance: &CFServiceInstance,
    ) -> Result<(), ValidationError> {
        self.names.validate_delete(ctx, instance).await
    }
}
