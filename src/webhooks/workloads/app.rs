//! CFApp admission: lifecycle type is fixed at creation and display names
//! are unique per space.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;

use crate::coordination::RequestContext;
use crate::crd::CFApp;
use crate::webhooks::duplicate::{NameValidator, UniqueResource};
use crate::webhooks::error::ValidationError;
use crate::webhooks::validator::{AdmissionValidator, is_being_deleted, owner_of};

pub const APP_ENTITY_TYPE: &str = "cfapp";

impl UniqueResource for CFApp {
    fn unique_scope_and_name(&self) -> (String, String) {
        (
            self.namespace().unwrap_or_default(),
            self.spec.display_name.to_lowercase(),
        )
    }

    fn unique_validation_error_message(&self) -> String {
        format!(
            "App with the name '{}' already exists.",
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

pub struct CFAppValidator {
    names: Arc<dyn NameValidator>,
}

impl CFAppValidator {
    pub fn new(names: Arc<dyn NameValidator>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl AdmissionValidator<CFApp> for CFAppValidator {
    async fn validate_create(&self, ctx: &RequestContext, app: &CFApp) -> Result<(), ValidationError> {
        self.names.validate_create(ctx, app).await
    }

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &CFApp,
        new: &CFApp,
    ) -> Result<(), ValidationError> {
        if !is_being_deleted(new) && old.spec.lifecycle.r#type != new.spec.lifecycle.r#type {
            return Err(ValidationError::invalid_field_value(format!(
                "Lifecycle type cannot be changed from {} to {}",
                old.spec.lifecycle.r#type, new.spec.lifecycle.r#type
            )));
        }

        self.names.validate_update(ctx, old, new).await
    }

    async fn validate_delete(&self, ctx: &RequestContext, app: &CFApp) -> Result<(), ValidationError> {
        self.names.validate_delete(ctx, app).await
    }
}
