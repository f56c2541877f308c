//! Test fixtures and builder patterns for CF resources.

use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::Resource;

use cf_admission::coordination::{MemoryStore, RetryPolicy};
use cf_admission::crd::{
    CFApp, CFAppSpec, CFDomain, CFDomainSpec, CFOrg, CFOrgSpec, CFPackage, CFPackageSpec,
    CFRoute, CFRouteSpec, CFServiceBinding, CFServiceBindingSpec, CFServiceInstance,
    CFServiceInstanceSpec, CFSpace, CFSpaceSpec, CFTask, CFTaskSpec, CFTaskStatus, Condition,
    Destination, InstanceType, Lifecycle, LifecycleType, LocalObjectReference, ObjectReference,
    PackageType,
};
use cf_admission::health::HealthState;
use cf_admission::webhooks::{NamespaceCategory, StaticLookup, Validators};

pub const ROOT_NAMESPACE: &str = "cf";
pub const ORG_NAMESPACE: &str = "cf-org-1";
pub const SPACE_NAMESPACE: &str = "cf-space-1";
pub const DOMAIN_NAME: &str = "domain-guid";
pub const DOMAIN_FQDN: &str = "apps.example.com";
pub const APP_NAME: &str = "app-guid";

fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Mark `obj` as being deleted.
pub fn deleting<K: Resource>(mut obj: K) -> K {
    obj.meta_mut().deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
    obj
}

pub fn org(namespace: &str, name: &str, display_name: &str) -> CFOrg {
    CFOrg {
        metadata: meta(namespace, name),
        spec: CFOrgSpec {
            display_name: display_name.to_string(),
        },
    }
}

pub fn space(namespace: &str, name: &str, display_name: &str) -> CFSpace {
    CFSpace {
        metadata: meta(namespace, name),
        spec: CFSpaceSpec {
            display_name: display_name.to_string(),
        },
    }
}

pub fn app(namespace: &str, name: &str, display_name: &str) -> CFApp {
    app_with_lifecycle(namespace, name, display_name, LifecycleType::Buildpack)
}

pub fn app_with_lifecycle(
    namespace: &str,
    name: &str,
    display_name: &str,
    lifecycle: LifecycleType,
) -> CFApp {
    CFApp {
        metadata: meta(namespace, name),
        spec: CFAppSpec {
            display_name: display_name.to_string(),
            desired_state: Default::default(),
            lifecycle: Lifecycle {
                r#type: lifecycle,
                data: Default::default(),
            },
            env_secret_name: None,
        },
    }
}

pub fn package(namespace: &str, name: &str, package_type: PackageType, app: &str) -> CFPackage {
    CFPackage {
        metadata: meta(namespace, name),
        spec: CFPackageSpec {
            r#type: package_type,
            app_ref: LocalObjectReference::new(app),
            source: None,
        },
    }
}

pub fn domain(namespace: &str, name: &str, fqdn: &str) -> CFDomain {
    CFDomain {
        metadata: meta(namespace, name),
        spec: CFDomainSpec {
            name: fqdn.to_string(),
        },
    }
}

pub fn service_instance(
    namespace: &str,
    name: &str,
    display_name: &str,
    instance_type: InstanceType,
) -> CFServiceInstance {
    CFServiceInstance {
        metadata: meta(namespace, name),
        spec: CFServiceInstanceSpec {
            display_name: display_name.to_string(),
            r#type: instance_type,
            secret_name: format!("{}-credentials", name),
            tags: Vec::new(),
        },
    }
}

pub fn service_binding(namespace: &str, name: &str, app: &str, instance: &str) -> CFServiceBinding {
    CFServiceBinding {
        metadata: meta(namespace, name),
        spec: CFServiceBindingSpec {
            display_name: None,
            app_ref: LocalObjectReference::new(app),
            service: ObjectReference {
                name: instance.to_string(),
                namespace: namespace.to_string(),
            },
        },
    }
}

/// Builder for creating CFTask test fixtures.
#[derive(Clone, Debug)]
pub struct TaskBuilder {
    name: String,
    namespace: String,
    command: String,
    app: String,
    canceled: bool,
    sequence_id: i64,
    conditions: Vec<Condition>,
}

impl TaskBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: SPACE_NAMESPACE.to_string(),
            command: "echo hello".to_string(),
            app: APP_NAME.to_string(),
            canceled: false,
            sequence_id: 1,
            conditions: Vec::new(),
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    pub fn canceled(mut self, canceled: bool) -> Self {
        self.canceled = canceled;
        self
    }

    pub fn sequence_id(mut self, sequence_id: i64) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    /// Add a `True` condition of the given type.
    pub fn condition(mut self, condition_type: &str) -> Self {
        self.conditions
            .push(Condition::new(condition_type, true, condition_type, ""));
        self
    }

    pub fn build(self) -> CFTask {
        CFTask {
            metadata: meta(&self.namespace, &self.name),
            spec: CFTaskSpec {
                command: self.command,
                app_ref: LocalObjectReference::new(&self.app),
                canceled: self.canceled,
            },
            status: Some(CFTaskStatus {
                sequence_id: self.sequence_id,
                conditions: self.conditions,
            }),
        }
    }
}

/// Builder for creating CFRoute test fixtures.
#[derive(Clone, Debug)]
pub struct RouteBuilder {
    name: String,
    namespace: String,
    host: String,
    path: String,
    protocol: String,
    domain: ObjectReference,
    destinations: Vec<String>,
}

impl RouteBuilder {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: SPACE_NAMESPACE.to_string(),
            host: host.into(),
            path: String::new(),
            protocol: "http".to_string(),
            domain: ObjectReference {
                name: DOMAIN_NAME.to_string(),
                namespace: ROOT_NAMESPACE.to_string(),
            },
            destinations: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn domain(mut self, namespace: &str, name: &str) -> Self {
        self.domain = ObjectReference {
            name: name.to_string(),
            namespace: namespace.to_string(),
        };
        self
    }

    /// Send traffic to `app` in the route's namespace.
    pub fn destination(mut self, app: impl Into<String>) -> Self {
        self.destinations.push(app.into());
        self
    }

    pub fn build(self) -> CFRoute {
        let destinations = self
            .destinations
            .iter()
            .enumerate()
            .map(|(i, app)| Destination {
                guid: format!("dest-{}", i),
                app_ref: LocalObjectReference::new(app),
                process_type: "web".to_string(),
                port: Some(8080),
                protocol: Some("http1".to_string()),
            })
            .collect();

        CFRoute {
            metadata: meta(&self.namespace, &self.name),
            spec: CFRouteSpec {
                host: self.host,
                path: self.path,
                protocol: self.protocol,
                domain_ref: self.domain,
                destinations,
            },
        }
    }
}

/// Lookup holding one org, one space, a shared domain and one app.
pub fn standard_lookup() -> StaticLookup {
    StaticLookup::new()
        .with_namespace(ROOT_NAMESPACE, NamespaceCategory::Other)
        .with_namespace(ORG_NAMESPACE, NamespaceCategory::Org)
        .with_namespace(SPACE_NAMESPACE, NamespaceCategory::Space)
        .with_domain(domain(ROOT_NAMESPACE, DOMAIN_NAME, DOMAIN_FQDN))
        .with_app(SPACE_NAMESPACE, APP_NAME)
}

/// Retry policy with short backoff so lock contention tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        ..RetryPolicy::default()
    }
}

/// All validators wired against one in-memory store.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub health: Arc<HealthState>,
    pub validators: Validators,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_lookup(standard_lookup())
    }

    pub fn with_lookup(lookup: StaticLookup) -> Self {
        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(HealthState::new());
        let validators = Validators::build(
            store.clone(),
            Arc::new(lookup),
            health.clone(),
            ROOT_NAMESPACE,
            fast_retry(),
        );
        Self {
            store,
            health,
            validators,
        }
    }
}
