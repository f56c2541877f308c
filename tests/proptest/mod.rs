// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for cf-admission.
//!
//! Uses proptest to generate random inputs and verify invariants.

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;

use futures::future::join_all;
use proptest::prelude::*;

use cf_admission::coordination::{KEY_LEN, RequestContext, RetryPolicy, hash_name};
use cf_admission::webhooks::ValidationError;
use cf_admission::webhooks::networking::route::{host_errors, validate_path};

use common::{Harness, SPACE_NAMESPACE, app};

/// Strategy for generating valid DNS labels (what a route host may be).
fn valid_host() -> impl Strategy<Value = String> {
    "[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?"
}

/// Strategy for generating valid route paths.
fn valid_path() -> impl Strategy<Value = String> {
    "(/[a-zA-Z0-9._~-]{1,20}){1,5}"
}

/// Strategy for generating short display names with mixed case.
fn display_name() -> impl Strategy<Value = String> {
    "[a-cA-C]{1,2}"
}

proptest! {
    /// Property: Record keys are fixed-length, storage-safe and deterministic.
    #[test]
    fn test_hash_shape(entity in "[a-z]{1,16}", name in ".{0,300}") {
        let key = hash_name(&entity, &name);
        prop_assert_eq!(key.len(), KEY_LEN);
        prop_assert!(key.starts_with("n-"));
        prop_assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert_eq!(key, hash_name(&entity, &name));
    }

    /// Property: Distinct names of one entity type map to distinct keys.
    #[test]
    fn test_hash_distinguishes_names(a in ".{0,40}", b in ".{0,40}") {
        prop_assume!(a != b);
        prop_assert_ne!(hash_name("cfapp", &a), hash_name("cfapp", &b));
    }

    /// Property: Well-formed host labels pass host validation.
    #[test]
    fn test_valid_hosts_accepted(host in valid_host()) {
        prop_assert!(host_errors(&host).is_empty(), "host {:?} rejected", host);
    }

    /// Property: Hosts with upper-case letters are always rejected.
    #[test]
    fn test_uppercase_hosts_rejected(host in "[a-z]{0,5}[A-Z][a-z]{0,5}") {
        prop_assert!(!host_errors(&host).is_empty());
    }

    /// Property: Well-formed paths pass path validation.
    #[test]
    fn test_valid_paths_accepted(path in valid_path()) {
        prop_assert!(validate_path(&path).is_ok(), "path {:?} rejected", path);
    }

    /// Property: A question mark anywhere fails path validation.
    #[test]
    fn test_question_mark_rejected(prefix in valid_path(), suffix in "[a-z]{0,10}") {
        let path = format!("{}?{}", prefix, suffix);
        let err = validate_path(&path).unwrap_err();
        prop_assert!(err.message.contains("Path cannot contain a question mark"));
    }

    /// Property: Deny messages decode back to the same error.
    #[test]
    fn test_validation_error_json(error_type in "[A-Za-z]{1,30}", message in ".{0,100}") {
        let err = ValidationError::new(&error_type, message);
        prop_assert_eq!(ValidationError::from_json(&err.to_json()), Some(err));
    }

    /// Property: Backoff never exceeds the configured cap and never shrinks.
    #[test]
    fn test_backoff_monotone_and_capped(attempt in 1u32..64) {
        let policy = RetryPolicy::default();
        prop_assert!(policy.backoff(attempt) <= policy.max_backoff);
        prop_assert!(policy.backoff(attempt) <= policy.backoff(attempt + 1));
    }

    /// Property: Concurrent creates admit exactly one app per case-folded name.
    #[test]
    fn test_one_app_per_name(names in prop::collection::vec(display_name(), 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let admitted = runtime.block_on(async {
            let harness = Harness::new();
            let ctx = RequestContext::new();
            let apps: Vec<_> = names
                .iter()
                .enumerate()
                .map(|(i, name)| app(SPACE_NAMESPACE, &format!("app-{}", i), name))
                .collect();
            let results = join_all(
                apps.iter().map(|a| harness.validators.app.validate_create(&ctx, a)),
            )
            .await;
            results.iter().filter(|r| r.is_ok()).count()
        });

        let distinct: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        prop_assert_eq!(admitted, distinct.len());
    }
}
