//! Unit tests for cf-admission.
//!
//! These tests run without a Kubernetes cluster and test individual
//! components in isolation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod crd_tests {
    use cf_admission::crd::{
        CFApp, CFRoute, CFRouteSpec, CFServiceInstanceSpec, CFTask, InstanceType, PackageType,
    };
    use kube::CustomResourceExt;
    use serde_json::json;

    #[test]
    fn test_generated_crds() {
        let crd = CFApp::crd();
        assert_eq!(crd.spec.group, "korifi.cloudfoundry.org");
        assert_eq!(crd.spec.names.kind, "CFApp");
        assert_eq!(crd.spec.scope, "Namespaced");

        let crd = CFTask::crd();
        assert_eq!(crd.spec.names.plural, "cftasks");
        assert!(crd.spec.versions[0].subresources.is_some());
    }

    #[test]
    fn test_route_defaults() {
        let spec: CFRouteSpec = serde_json::from_value(json!({
            "host": "my-host",
            "domainRef": {"name": "d", "namespace": "cf"},
            "destinations": [{"appRef": {"name": "a"}}]
        }))
        .unwrap();
        assert_eq!(spec.protocol, "http");
        assert_eq!(spec.path, "");
        assert_eq!(spec.destinations[0].process_type, "web");
        assert_eq!(spec.destinations[0].port, None);

        let route = CFRoute::new("r", spec);
        assert_eq!(route.spec.domain_ref.namespace, "cf");
    }

    #[test]
    fn test_enum_wire_names() {
        let spec: CFServiceInstanceSpec = serde_json::from_value(json!({
            "displayName": "db",
            "type": "user-provided",
            "secretName": "creds"
        }))
        .unwrap();
        assert_eq!(spec.r#type, InstanceType::UserProvided);
        assert_eq!(
            serde_json::to_value(InstanceType::Managed).unwrap(),
            json!("managed")
        );
        assert_eq!(
            serde_json::to_value(PackageType::Docker).unwrap(),
            json!("docker")
        );
    }
}

mod error_tests {
    use cf_admission::coordination::{Error, StoreError};
    use cf_admission::webhooks::ValidationError;
    use cf_admission::webhooks::error::{DUPLICATE_NAME_ERROR, UNKNOWN_ERROR};

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_deny_message_wire_format() {
        let err = ValidationError::duplicate_name("App with the name 'web' already exists.");
        let value: serde_json::Value = serde_json::from_str(&err.to_json()).unwrap();
        assert_eq!(value["validationErrorType"], DUPLICATE_NAME_ERROR);
        assert_eq!(value["message"], "App with the name 'web' already exists.");
    }

    #[test]
    fn test_non_json_message_is_not_a_validation_error() {
        assert!(ValidationError::from_json("admission webhook denied").is_none());
        assert_eq!(
            ValidationError::unknown().error_type,
            UNKNOWN_ERROR.to_string()
        );
    }

    #[test]
    fn test_store_error_classification() {
        assert!(matches!(
            StoreError::from_kube("k", api_error(404, "NotFound")),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from_kube("k", api_error(409, "AlreadyExists")),
            StoreError::AlreadyExists(_)
        ));
        assert!(matches!(
            StoreError::from_kube("k", api_error(409, "Conflict")),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from_kube("k", api_error(422, "Invalid")),
            StoreError::Conflict(_)
        ));

        let err = StoreError::from_kube("k", api_error(503, "ServiceUnavailable"));
        assert!(err.is_transient());
        let err = StoreError::from_kube("k", api_error(403, "Forbidden"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_registry_error_helpers() {
        let err = Error::Register(StoreError::AlreadyExists("k".to_string()));
        assert!(err.is_already_exists());
        assert!(!err.is_transient());

        let err = Error::Lock(StoreError::Conflict("k".to_string()));
        assert!(err.is_conflict());
        assert!(err.is_transient());
    }
}

mod store_tests {
    use cf_admission::coordination::{CoordinationRecord, HolderState, hash_name};

    fn record(holder: HolderState) -> CoordinationRecord {
        CoordinationRecord {
            key: hash_name("cfapp", "web"),
            namespace: "space-ns".to_string(),
            entity_type: "cfapp".to_string(),
            display_name: "web".to_string(),
            owner_namespace: "space-ns".to_string(),
            owner_name: "app-guid".to_string(),
            holder,
        }
    }

    #[test]
    fn test_lease_layout() {
        let lease = record(HolderState::Unlocked).to_lease();
        assert_eq!(lease.metadata.namespace.as_deref(), Some("space-ns"));
        let annotations = lease.metadata.annotations.as_ref().unwrap();
        assert_eq!(
            annotations["coordination.cloudfoundry.org/owner-name"],
            "app-guid"
        );
        assert_eq!(
            lease.spec.as_ref().unwrap().holder_identity.as_deref(),
            Some("none")
        );
    }

    #[test]
    fn test_foreign_holder_reads_as_locked() {
        let mut lease = record(HolderState::Unlocked).to_lease();
        lease.spec.as_mut().unwrap().holder_identity = Some("some-pod".to_string());
        assert_eq!(
            CoordinationRecord::from_lease(&lease).holder,
            HolderState::Locked
        );

        lease.spec = None;
        assert_eq!(
            CoordinationRecord::from_lease(&lease).holder,
            HolderState::Unlocked
        );
    }
}

mod lookup_tests {
    use cf_admission::crd::{ORG_GUID_LABEL, SPACE_GUID_LABEL};
    use cf_admission::webhooks::NamespaceCategory;
    use k8s_openapi::api::core::v1::Namespace;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn namespace(label: Option<&str>) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some("ns".to_string()),
                labels: label.map(|l| [(l.to_string(), "guid".to_string())].into_iter().collect()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_namespace_category() {
        assert_eq!(
            NamespaceCategory::of(&namespace(Some(ORG_GUID_LABEL))),
            NamespaceCategory::Org
        );
        assert_eq!(
            NamespaceCategory::of(&namespace(Some(SPACE_GUID_LABEL))),
            NamespaceCategory::Space
        );
        assert_eq!(
            NamespaceCategory::of(&namespace(None)),
            NamespaceCategory::Other
        );
    }
}

mod webhook_path_tests {
    use cf_admission::webhooks::{CFAPP_PATH, CFROUTE_PATH, CFSERVICEBINDING_PATH};

    #[test]
    fn test_paths_follow_group_version_kind() {
        assert_eq!(CFAPP_PATH, "/validate-korifi-cloudfoundry-org-v1alpha1-cfapp");
        assert_eq!(CFROUTE_PATH, "/validate-korifi-cloudfoundry-org-v1alpha1-cfroute");
        assert!(CFSERVICEBINDING_PATH.ends_with("-cfservicebinding"));
    }
}
