//! Name uniqueness enforcement on top of the name registry.
//!
//! Create registers the name, delete releases it. A rename locks the old
//! name, registers the new one and only then releases the old one, so the
//! old name can never be claimed by someone else while the rename may still
//! fail. The three steps are not atomic: a crash after the new name is
//! registered leaves the old name claimed until it is released by hand.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::error::ValidationError;
use crate::coordination::{NameRegistry, RequestContext};

/// A resource whose name must be unique within a scope.
pub trait UniqueResource {
    /// `(scope namespace, name)` the uniqueness constraint applies to.
    fn unique_scope_and_name(&self) -> (String, String);

    /// Message shown when the name is already taken.
    fn unique_validation_error_message(&self) -> String;

    fn owner_namespace(&self) -> String;

    fn owner_name(&self) -> String;

    /// The resource has a deletion timestamp.
    fn is_being_deleted(&self) -> bool;
}

/// Admission-level name uniqueness checks.
#[async_trait]
pub trait NameValidator: Send + Sync {
    async fn validate_create(
        &self,
        ctx: &RequestContext,
        obj: &(dyn UniqueResource + Sync),
    ) -> Result<(), ValidationError>;

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &(dyn UniqueResource + Sync),
        new: &(dyn UniqueResource + Sync),
    ) -> Result<(), ValidationError>;

    async fn validate_delete(
        &self,
        ctx: &RequestContext,
        obj: &(dyn UniqueResource + Sync),
    ) -> Result<(), ValidationError>;
}

/// [`NameValidator`] backed by a [`NameRegistry`].
pub struct DuplicateValidator {
    registry: Arc<dyn NameRegistry>,
}

impl DuplicateValidator {
    pub fn new(registry: Arc<dyn NameRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl NameValidator for DuplicateValidator {
    async fn validate_create(
        &self,
        ctx: &RequestContext,
        obj: &(dyn UniqueResource + Sync),
    ) -> Result<(), ValidationError> {
        let (scope, name) = obj.unique_scope_and_name();

        match self
            .registry
            .register_name(ctx, &scope, &name, &obj.owner_namespace(), &obj.owner_name())
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_already_exists() => {
                info!(scope = %scope, name = %name, "Name already taken");
                Err(ValidationError::duplicate_name(
                    obj.unique_validation_error_message(),
                ))
            }
            Err(e) => {
                error!(scope = %scope, name = %name, error = %e, "Failed to register name");
                Err(ValidationError::unknown())
            }
        }
    }

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &(dyn UniqueResource + Sync),
        new: &(dyn UniqueResource + Sync),
    ) -> Result<(), ValidationError> {
        if new.is_being_deleted() {
            return Ok(());
        }

        let (old_scope, old_name) = old.unique_scope_and_name();
        let (new_scope, new_name) = new.unique_scope_and_name();
        if old_scope == new_scope && old_name == new_name {
            return Ok(());
        }

        if let Err(e) = self.registry.try_lock_name(ctx, &old_scope, &old_name).await {
            warn!(
                scope = %old_scope,
                name = %old_name,
                error = %e,
                "Failed to lock old name during rename"
            );
            return Err(ValidationError::unknown());
        }

        if let Err(e) = self
            .registry
            .register_name(
                ctx,
                &new_scope,
                &new_name,
                &new.owner_namespace(),
                &new.owner_name(),
            )
            .await
        {
            if let Err(unlock_err) = self.registry.unlock_name(ctx, &old_scope, &old_name).await {
                // The old name stays locked and cannot be renamed again until
                // the record is unlocked by hand
                error!(
                    scope = %old_scope,
                    name = %old_name,
                    error = %unlock_err,
                    "Failed to unlock old name after failed rename"
                );
            }

            if e.is_already_exists() {
                info!(scope = %new_scope, name = %new_name, "Name already taken");
                return Err(ValidationError::duplicate_name(
                    new.unique_validation_error_message(),
                ));
            }
            error!(
                scope = %new_scope,
                name = %new_name,
                error = %e,
                "Failed to register new name during rename"
            );
            return Err(ValidationError::unknown());
        }

        if let Err(e) = self.registry.deregister_name(ctx, &old_scope, &old_name).await {
            // The rename goes ahead, the old name stays claimed
            error!(
                scope = %old_scope,
                name = %old_name,
                error = %e,
                "Failed to deregister old name during rename"
            );
        }

        debug!(
            old_name = %old_name,
            new_name = %new_name,
            scope = %new_scope,
            "Renamed"
        );
        Ok(())
    }

    async fn validate_delete(
        &self,
        ctx: &RequestContext,
        obj: &(dyn UniqueResource + Sync),
    ) -> Result<(), ValidationError> {
        let (scope, name) = obj.unique_scope_and_name();

        self.registry
            .deregister_name(ctx, &scope, &name)
            .await
            .map_err(|e| {
                error!(scope = %scope, name = %name, error = %e, "Failed to deregister name");
                ValidationError::unknown()
            })
    }
}
