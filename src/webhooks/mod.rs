//! Validating admission webhooks for Cloud Foundry resources.
//!
//! Every kind gets a validator that runs in three tiers:
//! - Placement: orgs and spaces must land in the right namespace
//! - Structure: required fields and immutable fields on update
//! - Uniqueness: names are claimed through the coordination name registry

pub mod duplicate;
pub mod error;
pub mod lookup;
pub mod networking;
pub mod placement;
mod server;
pub mod services;
pub mod validator;
pub mod workloads;

pub use duplicate::{DuplicateValidator, NameValidator, UniqueResource};
pub use error::ValidationError;
pub use lookup::{KubeLookup, LookupError, NamespaceCategory, ResourceLookup, StaticLookup};
pub use placement::PlacementValidator;
pub use server::{
    CFAPP_PATH, CFORG_PATH, CFPACKAGE_PATH, CFROUTE_PATH, CFSERVICEBINDING_PATH,
    CFSERVICEINSTANCE_PATH, CFSPACE_PATH, CFTASK_PATH, Validators, WebhookError, WebhookState,
    admit, create_webhook_router, decoding_error_type, run_webhook_server,
};
pub use validator::AdmissionValidator;

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
