//! The per-kind admission validator interface.

use async_trait::async_trait;
use kube::ResourceExt;

use super::error::ValidationError;
use crate::coordination::RequestContext;

/// Validates admission of one resource kind.
///
/// Checks run in a fixed order: placement, then structural and immutability
/// checks, then name uniqueness. The first failing check decides the
/// response.
#[async_trait]
pub trait AdmissionValidator<K: Send + Sync>: Send + Sync {
    async fn validate_create(&self, ctx: &RequestContext, obj: &K) -> Result<(), ValidationError>;

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &K,
        new: &K,
    ) -> Result<(), ValidationError>;

    async fn validate_delete(&self, _ctx: &RequestContext, _obj: &K) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Owner namespace and name recorded for a registered name.
pub(crate) fn owner_of<K: ResourceExt>(obj: &K) -> (String, String) {
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

pub(crate) fn is_being_deleted<K: ResourceExt>(obj: &K) -> bool {
    obj.meta().deletion_timestamp.is_some()
}

/// Deny with [`ValidationError::immutable_field`] when `old != new`.
pub(crate) fn ensure_unchanged<T: PartialEq + ?Sized>(
    field: &str,
    old: &T,
    new: &T,
) -> Result<(), ValidationError> {
    if old != new {
        return Err(ValidationError::immutable_field(field));
    }
    Ok(())
}
