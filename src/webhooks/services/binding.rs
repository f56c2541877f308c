//! CFServiceBinding admission.
//!
//! An app can be bound to a given service instance only once, whatever the
//! bindings are called.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;

use crate::coordination::RequestContext;
use crate::crd::CFServiceBinding;
use crate::webhooks::duplicate::{NameValidator, UniqueResource};
use crate::webhooks::error::ValidationError;
use crate::webhooks::validator::{AdmissionValidator, is_being_deleted, owner_of};

pub const SERVICE_BINDING_ENTITY_TYPE: &str = "cfservicebinding";

impl UniqueResource for CFServiceBinding {
    fn unique_scope_and_name(&self) -> (String, String) {
        (
            self.namespace().unwrap_or_default(),
            format!(
                "app::{}::{}::{}",
                self.spec.app_ref.name, self.spec.service.namespace, self.spec.service.name
            ),
        )
    }

    fn unique_validation_error_message(&self) -> String {
        format!(
            "Service binding already exists: App: {} Service Instance: {}",
            self.spec.app_ref.name, self.spec.service.name
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

pub struct CFServiceBindingValidator {
    names: Arc<dyn NameValidator>,
}

impl CFServiceBindingValidator {
    pub fn new(names: Arc<dyn NameValidator>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl AdmissionValidator<CFServiceBinding> for CFServiceBindingValidator {
    async fn validate_create(
        &self,
        ctx: &RequestContext,
        binding: &CFServiceBinding,
    ) -> Result<(), ValidationError> {
        self.names.validate_create(ctx, binding).await
    }

    async fn validate_update(
        &self,
        _ctx: &RequestContext,
        old: &CFServiceBinding,
        new: &CFServiceBinding,
    ) -> Result<(), ValidationError> {
        if is_being_deleted(new) {
            return Ok(());
        }

        let references = [
            ("AppRef.Name", &old.spec.app_ref.name, &new.spec.app_ref.name),
            ("Service.Name", &old.spec.service.name, &new.spec.service.name),
            (
                "Service.Namespace",
                &old.spec.service.namespace,
                &new.spec.service.namespace,
            ),
        ];
        for (field, before, after) in references {
            if before != after {
                return Err(ValidationError::field_is_immutable(field));
            }
        }
        Ok(())
    }

    async fn validate_delete(
        &self,
        ctx: &RequestContext,
        binding: &CFServiceBinding,
    ) -> Result<(), ValidationError> {
        self.names.validate_delete(ctx, binding).await
    }
}
