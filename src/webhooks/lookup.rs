//! Read-only lookups of related resources.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::Api;
use kube::{Client, ResourceExt};
use thiserror::Error;

use crate::coordination::RequestContext;
use crate::crd::{CFApp, CFDomain, ORG_GUID_LABEL, SPACE_GUID_LABEL};

/// Lookup failure.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("deadline exceeded during lookup")]
    DeadlineExceeded,

    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// What a namespace is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceCategory {
    Org,
    Space,
    Other,
}

impl NamespaceCategory {
    /// Categorize a namespace by its labels.
    pub fn of(namespace: &Namespace) -> Self {
        let labels = namespace.labels();
        if labels.contains_key(ORG_GUID_LABEL) {
            NamespaceCategory::Org
        } else if labels.contains_key(SPACE_GUID_LABEL) {
            NamespaceCategory::Space
        } else {
            NamespaceCategory::Other
        }
    }
}

/// Resources validators need to consult but never modify.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// Category of namespace `name`, `None` if it does not exist.
    async fn namespace_category(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Option<NamespaceCategory>, LookupError>;

    async fn get_domain(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CFDomain>, LookupError>;

    async fn app_exists(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<bool, LookupError>;
}

/// [`ResourceLookup`] against the Kubernetes API.
#[derive(Clone)]
pub struct KubeLookup {
    client: Client,
}

impl KubeLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceLookup for KubeLookup {
    async fn namespace_category(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Option<NamespaceCategory>, LookupError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespace = ctx
            .until_deadline(api.get_opt(name))
            .await
            .ok_or(LookupError::DeadlineExceeded)??;
        Ok(namespace.as_ref().map(NamespaceCategory::of))
    }

    async fn get_domain(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CFDomain>, LookupError> {
        let api: Api<CFDomain> = Api::namespaced(self.client.clone(), namespace);
        Ok(ctx
            .until_deadline(api.get_opt(name))
            .await
            .ok_or(LookupError::DeadlineExceeded)??)
    }

    async fn app_exists(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<bool, LookupError> {
        let api: Api<CFApp> = Api::namespaced(self.client.clone(), namespace);
        let app = ctx
            .until_deadline(api.get_opt(name))
            .await
            .ok_or(LookupError::DeadlineExceeded)??;
        Ok(app.is_some())
    }
}

/// [`ResourceLookup`] over a fixed set of resources.
#[derive(Default, Clone)]
pub struct StaticLookup {
    namespaces: HashMap<String, NamespaceCategory>,
    domains: HashMap<(String, String), CFDomain>,
    apps: HashSet<(String, String)>,
    unavailable: bool,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A lookup whose every call fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, name: &str, category: NamespaceCategory) -> Self {
        self.namespaces.insert(name.to_string(), category);
        self
    }

    pub fn with_domain(mut self, domain: CFDomain) -> Self {
        let key = (domain.namespace().unwrap_or_default(), domain.name_any());
        self.domains.insert(key, domain);
        self
    }

    pub fn with_app(mut self, namespace: &str, name: &str) -> Self {
        self.apps.insert((namespace.to_string(), name.to_string()));
        self
    }

    fn check_available(&self) -> Result<(), LookupError> {
        if self.unavailable {
            return Err(LookupError::Unavailable("static lookup is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceLookup for StaticLookup {
    async fn namespace_category(
        &self,
        _ctx: &RequestContext,
        name: &str,
    ) -> Result<Option<NamespaceCategory>, LookupError> {
        self.check_available()?;
        Ok(self.namespaces.get(name).copied())
    }

    async fn get_domain(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CFDomain>, LookupError> {
        self.check_available()?;
        Ok(self
            .domains
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn app_exists(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<bool, LookupError> {
        self.check_available()?;
        Ok(self.apps.contains(&(namespace.to_string(), name.to_string())))
    }
}
