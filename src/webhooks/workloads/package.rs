//! CFPackage admission.

use async_trait::async_trait;

use crate::coordination::RequestContext;
use crate::crd::CFPackage;
use crate::webhooks::error::ValidationError;
use crate::webhooks::validator::{AdmissionValidator, ensure_unchanged};

#[derive(Default)]
pub struct CFPackageValidator;

impl CFPackageValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AdmissionValidator<CFPackage> for CFPackageValidator {
    async fn validate_create(
        &self,
        _ctx: &RequestContext,
        package: &CFPackage,
    ) -> Result<(), ValidationError> {
        if package.spec.app_ref.name.is_empty() {
            return Err(ValidationError::missing_required_field("Spec.AppRef.Name"));
        }
        Ok(())
    }

    async fn validate_update(
        &self,
        _ctx: &RequestContext,
        old: &CFPackage,
        new: &CFPackage,
    ) -> Result<(), ValidationError> {
        ensure_unchanged("CFPackage.Spec.Type", &old.spec.r#type, &new.spec.r#type)?;
        ensure_unchanged(
            "CFPackage.Spec.AppRef.Name",
            &old.spec.app_ref.name,
            &new.spec.app_ref.name,
        )
    }
}
