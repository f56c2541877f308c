//! Distributed name registry.
//!
//! A name is claimed by creating a coordination record keyed by the hash of
//! `(entity_type, name)` in the scope namespace. The store's create-if-absent
//! arbitrates concurrent claims, and a test-then-replace patch on the holder
//! identity gives a per-name lock used while a resource is renamed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::context::RequestContext;
use super::error::{Error, Result, StoreError};
use super::hasher::hash_name;
use super::store::{CoordinationRecord, CoordinationStore, HolderState};
use super::retry::RetryPolicy;
use crate::health::HealthState;

/// Claims, locks and releases unique names for one entity type.
#[async_trait]
pub trait NameRegistry: Send + Sync {
    /// Claim `name` in `namespace` on behalf of the given owner.
    ///
    /// Fails with an error for which [`Error::is_already_exists`] holds if
    /// the name is already claimed.
    async fn register_name(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
        owner_namespace: &str,
        owner_name: &str,
    ) -> Result<()>;

    /// Release `name`. Releasing a name that is not claimed succeeds.
    async fn deregister_name(&self, ctx: &RequestContext, namespace: &str, name: &str)
    -> Result<()>;

    /// Lock a claimed name so that no concurrent rename can use it.
    async fn try_lock_name(&self, ctx: &RequestContext, namespace: &str, name: &str) -> Result<()>;

    /// Unlock a locked name. Unlocking a name that is not locked fails.
    async fn unlock_name(&self, ctx: &RequestContext, namespace: &str, name: &str) -> Result<()>;

    /// Whether `name` is claimed by exactly the given owner.
    async fn check_name_ownership(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
        owner_namespace: &str,
        owner_name: &str,
    ) -> Result<bool>;
}

/// Name registry storing its records through a [`CoordinationStore`].
pub struct LeaseNameRegistry {
    store: Arc<dyn CoordinationStore>,
    entity_type: String,
    retry: RetryPolicy,
    health: Option<Arc<HealthState>>,
}

impl LeaseNameRegistry {
    pub fn new(store: Arc<dyn CoordinationStore>, entity_type: &str) -> Self {
        Self {
            store,
            entity_type: entity_type.to_string(),
            retry: RetryPolicy::default(),
            health: None,
        }
    }

    /// Use `retry` when a lock attempt finds the record missing or held.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Record operation outcomes in the shared metrics.
    pub fn with_health(mut self, health: Arc<HealthState>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn key(&self, name: &str) -> String {
        hash_name(&self.entity_type, name)
    }

    fn observe<T>(&self, operation: &str, result: &Result<T>) {
        let Some(health) = &self.health else {
            return;
        };
        let outcome = match result {
            Ok(_) => "success",
            Err(e) if e.is_already_exists() => "already_exists",
            Err(e) if e.is_conflict() => "conflict",
            Err(e) if e.is_not_found() => "not_found",
            Err(_) => "error",
        };
        health.metrics.record_registry_operation(operation, outcome);
    }

    async fn lock_with_retry(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        key: &str,
    ) -> std::result::Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            let result = ctx
                .bounded(self.store.conditional_patch(
                    namespace,
                    key,
                    HolderState::Unlocked,
                    HolderState::Locked,
                ))
                .await;

            let err = match result {
                Ok(()) => return Ok(()),
                Err(e @ (StoreError::NotFound(_) | StoreError::Conflict(_))) => e,
                Err(e) => return Err(e),
            };

            let Some(delay) = self.retry.next_delay(attempt, ctx.deadline) else {
                return Err(err);
            };
            debug!(
                entity_type = %self.entity_type,
                namespace = %namespace,
                key = %key,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Name lock busy, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl NameRegistry for LeaseNameRegistry {
    async fn register_name(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
        owner_namespace: &str,
        owner_name: &str,
    ) -> Result<()> {
        if ctx.dry_run {
            return Ok(());
        }

        let record = CoordinationRecord {
            key: self.key(name),
            namespace: namespace.to_string(),
            entity_type: self.entity_type.clone(),
            display_name: name.to_string(),
            owner_namespace: owner_namespace.to_string(),
            owner_name: owner_name.to_string(),
            holder: HolderState::Unlocked,
        };

        let result = ctx
            .bounded(self.store.create(&record))
            .await
            .map_err(Error::Register);
        self.observe("register", &result);
        result?;

        info!(
            entity_type = %self.entity_type,
            namespace = %namespace,
            name = %name,
            owner_namespace = %owner_namespace,
            owner_name = %owner_name,
            "Registered name"
        );
        Ok(())
    }

    async fn deregister_name(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<()> {
        if ctx.dry_run {
            return Ok(());
        }

        let result = match ctx.bounded(self.store.delete(namespace, &self.key(name))).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                debug!(
                    entity_type = %self.entity_type,
                    namespace = %namespace,
                    name = %name,
                    "Name was not registered"
                );
                Ok(())
            }
            Err(e) => Err(Error::Deregister(e)),
        };
        self.observe("deregister", &result);
        result?;

        info!(
            entity_type = %self.entity_type,
            namespace = %namespace,
            name = %name,
            "Deregistered name"
        );
        Ok(())
    }

    async fn try_lock_name(&self, ctx: &RequestContext, namespace: &str, name: &str) -> Result<()> {
        if ctx.dry_run {
            return Ok(());
        }

        let result = self
            .lock_with_retry(ctx, namespace, &self.key(name))
            .await
            .map_err(Error::Lock);
        self.observe("lock", &result);
        if let Err(e) = &result {
            warn!(
                entity_type = %self.entity_type,
                namespace = %namespace,
                name = %name,
                error = %e,
                "Could not lock name"
            );
        }
        result
    }

    async fn unlock_name(&self, ctx: &RequestContext, namespace: &str, name: &str) -> Result<()> {
        if ctx.dry_run {
            return Ok(());
        }

        let result = ctx
            .bounded(self.store.conditional_patch(
                namespace,
                &self.key(name),
                HolderState::Locked,
                HolderState::Unlocked,
            ))
            .await
            .map_err(Error::Unlock);
        self.observe("unlock", &result);
        result
    }

    async fn check_name_ownership(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
        owner_namespace: &str,
        owner_name: &str,
    ) -> Result<bool> {
        let record = ctx
            .bounded(self.store.get(namespace, &self.key(name)))
            .await
            .map_err(Error::Ownership)?;

        Ok(record.owner_namespace == owner_namespace && record.owner_name == owner_name)
    }
}
