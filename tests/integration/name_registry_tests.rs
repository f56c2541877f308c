//! Name registry against real Leases.

use std::sync::Arc;

use futures::future::join_all;
use k8s_openapi::api::coordination::v1::Lease;

use cf_admission::coordination::{
    CoordinationStore, HolderState, LeaseNameRegistry, LeaseStore, NameRegistry, RequestContext,
    StoreError, hash_name,
};

use crate::common::fast_retry;
use crate::{TestNamespace, client};

const FIELD_MANAGER: &str = "cf-admission-test";

async fn setup(prefix: &str) -> (TestNamespace, Arc<LeaseStore>, LeaseNameRegistry) {
    let client = client().await;
    let ns = TestNamespace::create(client.clone(), prefix).await;
    let store = Arc::new(LeaseStore::new(client, FIELD_MANAGER));
    let registry = LeaseNameRegistry::new(store.clone(), "cfapp").with_retry(fast_retry());
    (ns, store, registry)
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_lease_registry_rejects_duplicates() {
    let (ns, _store, registry) = setup("reg-dup").await;
    let ctx = RequestContext::new();

    registry
        .register_name(&ctx, ns.name(), "web", ns.name(), "app-1")
        .await
        .unwrap();
    let err = registry
        .register_name(&ctx, ns.name(), "web", ns.name(), "app-2")
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    let lease = ns
        .api::<Lease>()
        .get(&hash_name("cfapp", "web"))
        .await
        .unwrap();
    let annotations = lease.metadata.annotations.unwrap();
    assert_eq!(annotations["coordination.cloudfoundry.org/owner-name"], "app-1");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_lease_registry_concurrent_registrations() {
    let (ns, _store, registry) = setup("reg-race").await;
    let ctx = RequestContext::new();
    let registry = Arc::new(registry);

    let results = join_all((0..8).map(|i| {
        let registry = registry.clone();
        let scope = ns.name().to_string();
        async move {
            registry
                .register_name(&ctx, &scope, "web", &scope, &format!("app-{}", i))
                .await
        }
    }))
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_lease_lock_is_exclusive() {
    let (ns, store, registry) = setup("reg-lock").await;
    let ctx = RequestContext::new();

    registry
        .register_name(&ctx, ns.name(), "web", ns.name(), "app-1")
        .await
        .unwrap();
    registry.try_lock_name(&ctx, ns.name(), "web").await.unwrap();

    let key = hash_name("cfapp", "web");
    assert_eq!(
        store.get(ns.name(), &key).await.unwrap().holder,
        HolderState::Locked
    );

    // The test precondition fails on the API server while the lock is held
    let err = store
        .conditional_patch(ns.name(), &key, HolderState::Unlocked, HolderState::Locked)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    registry.unlock_name(&ctx, ns.name(), "web").await.unwrap();
    registry.try_lock_name(&ctx, ns.name(), "web").await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_lease_deregister_and_ownership() {
    let (ns, store, registry) = setup("reg-owner").await;
    let ctx = RequestContext::new();

    registry
        .register_name(&ctx, ns.name(), "web", ns.name(), "app-1")
        .await
        .unwrap();
    assert!(
        registry
            .check_name_ownership(&ctx, ns.name(), "web", ns.name(), "app-1")
            .await
            .unwrap()
    );
    assert!(
        !registry
            .check_name_ownership(&ctx, ns.name(), "web", ns.name(), "app-2")
            .await
            .unwrap()
    );

    registry.deregister_name(&ctx, ns.name(), "web").await.unwrap();
    let err = store
        .get(ns.name(), &hash_name("cfapp", "web"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    // Releasing a name nobody holds is not an error
    registry.deregister_name(&ctx, ns.name(), "web").await.unwrap();
}
