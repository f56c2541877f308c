//! Admission webhook server.
//!
//! Serves one validating endpoint per CF kind. Each request is decoded into
//! typed old/new objects and handed to that kind's [`AdmissionValidator`].
//! Objects that do not decode are denied with a `<Kind>DecodingError`.
//! A denial carries the [`ValidationError`] as JSON in the response message.
//!
//! To enable webhooks:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at the paths below
//! 3. Mount the TLS certificate secret at /etc/webhook/certs/

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use axum_server::tls_rustls::RustlsConfig;
use kube::Resource;
use serde::de::DeserializeOwned;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::duplicate::{DuplicateValidator, NameValidator};
use super::error::ValidationError;
use super::lookup::ResourceLookup;
use super::networking::{CFRouteValidator, ROUTE_ENTITY_TYPE};
use super::placement::PlacementValidator;
use super::services::{
    CFServiceBindingValidator, CFServiceInstanceValidator, SERVICE_BINDING_ENTITY_TYPE,
    SERVICE_INSTANCE_ENTITY_TYPE,
};
use super::validator::AdmissionValidator;
use super::workloads::{
    APP_ENTITY_TYPE, CFAppValidator, CFOrgValidator, CFPackageValidator, CFSpaceValidator,
    CFTaskValidator, ORG_ENTITY_TYPE, SPACE_ENTITY_TYPE,
};
use crate::coordination::{CoordinationStore, LeaseNameRegistry, RequestContext, RetryPolicy};
use crate::crd::{
    CFApp, CFOrg, CFPackage, CFRoute, CFServiceBinding, CFServiceInstance, CFSpace, CFTask,
};
use crate::health::HealthState;

pub const CFORG_PATH: &str = "/validate-korifi-cloudfoundry-org-v1alpha1-cforg";
pub const CFSPACE_PATH: &str = "/validate-korifi-cloudfoundry-org-v1alpha1-cfspace";
pub const CFAPP_PATH: &str = "/validate-korifi-cloudfoundry-org-v1alpha1-cfapp";
pub const CFPACKAGE_PATH: &str = "/validate-korifi-cloudfoundry-org-v1alpha1-cfpackage";
pub const CFTASK_PATH: &str = "/validate-korifi-cloudfoundry-org-v1alpha1-cftask";
pub const CFROUTE_PATH: &str = "/validate-korifi-cloudfoundry-org-v1alpha1-cfroute";
pub const CFSERVICEINSTANCE_PATH: &str =
    "/validate-korifi-cloudfoundry-org-v1alpha1-cfserviceinstance";
pub const CFSERVICEBINDING_PATH: &str =
    "/validate-korifi-cloudfoundry-org-v1alpha1-cfservicebinding";

/// One validator per admitted kind
pub struct Validators {
    pub org: Arc<dyn AdmissionValidator<CFOrg>>,
    pub space: Arc<dyn AdmissionValidator<CFSpace>>,
    pub app: Arc<dyn AdmissionValidator<CFApp>>,
    pub package: Arc<dyn AdmissionValidator<CFPackage>>,
    pub task: Arc<dyn AdmissionValidator<CFTask>>,
    pub route: Arc<dyn AdmissionValidator<CFRoute>>,
    pub service_instance: Arc<dyn AdmissionValidator<CFServiceInstance>>,
    pub service_binding: Arc<dyn AdmissionValidator<CFServiceBinding>>,
}

impl Validators {
    /// Wire every validator against one coordination store.
    ///
    /// Each kind with a uniqueness rule gets its own registry so that equal
    /// names of different kinds never collide.
    pub fn build(
        store: Arc<dyn CoordinationStore>,
        lookup: Arc<dyn ResourceLookup>,
        health: Arc<HealthState>,
        root_namespace: &str,
        retry: RetryPolicy,
    ) -> Self {
        let names = |entity_type: &str| -> Arc<dyn NameValidator> {
            let registry = LeaseNameRegistry::new(store.clone(), entity_type)
                .with_retry(retry)
                .with_health(health.clone());
            Arc::new(DuplicateValidator::new(Arc::new(registry)))
        };
        let placement = Arc::new(PlacementValidator::new(lookup.clone(), root_namespace));

        Self {
            org: Arc::new(CFOrgValidator::new(names(ORG_ENTITY_TYPE), placement.clone())),
            space: Arc::new(CFSpaceValidator::new(names(SPACE_ENTITY_TYPE), placement)),
            app: Arc::new(CFAppValidator::new(names(APP_ENTITY_TYPE))),
            package: Arc::new(CFPackageValidator::new()),
            task: Arc::new(CFTaskValidator::new()),
            route: Arc::new(CFRouteValidator::new(
                names(ROUTE_ENTITY_TYPE),
                lookup,
                root_namespace,
            )),
            service_instance: Arc::new(CFServiceInstanceValidator::new(names(
                SERVICE_INSTANCE_ENTITY_TYPE,
            ))),
            service_binding: Arc::new(CFServiceBindingValidator::new(names(
                SERVICE_BINDING_ENTITY_TYPE,
            ))),
        }
    }
}

/// Shared state for webhook handlers
pub struct WebhookState {
    pub validators: Validators,
    pub health: Arc<HealthState>,
    /// Time limit for the store calls of one request
    pub admission_timeout: Duration,
}

impl WebhookState {
    pub fn new(validators: Validators, health: Arc<HealthState>, admission_timeout: Duration) -> Self {
        Self {
            validators,
            health,
            admission_timeout,
        }
    }
}

fn operation_name(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

/// Create a denial response carrying `err` as JSON.
fn deny_with_validation_error<T: Resource>(
    request: &AdmissionRequest<T>,
    err: &ValidationError,
) -> AdmissionReview<DynamicObject> {
    AdmissionResponse::from(request)
        .deny(err.to_json())
        .into_review()
}

fn missing_object(uid: &str, what: &str) -> ValidationError {
    error!(uid = %uid, "Missing {} in request", what);
    ValidationError::unknown()
}

/// Error type reported when an object cannot be read as its kind, e.g. `RouteDecodingError`.
pub fn decoding_error_type(kind: &str) -> String {
    format!("{}DecodingError", kind.strip_prefix("CF").unwrap_or(kind))
}

/// Read `object` (or `old_object` when `old`) of the request as a `K`.
fn decode<K: DeserializeOwned>(
    request: &AdmissionRequest<DynamicObject>,
    kind: &str,
    old: bool,
) -> Result<K, ValidationError> {
    let uid = request.uid.as_str();
    let (object, what) = if old {
        (request.old_object.as_ref(), "old object")
    } else {
        (request.object.as_ref(), "object")
    };
    let object = object.ok_or_else(|| missing_object(uid, what))?;

    serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(|e| {
            let message = if old {
                format!("Error while decoding old {} object", kind)
            } else {
                format!("Error while decoding {} object", kind)
            };
            error!(uid = %uid, error = %e, "{}", message);
            ValidationError::new(&decoding_error_type(kind), message)
        })
}

async fn decide<K>(
    validator: &dyn AdmissionValidator<K>,
    ctx: &RequestContext,
    request: &AdmissionRequest<DynamicObject>,
    kind: &str,
) -> Result<(), ValidationError>
where
    K: DeserializeOwned + Send + Sync,
{
    match request.operation {
        Operation::Create => {
            let obj: K = decode(request, kind, false)?;
            validator.validate_create(ctx, &obj).await
        }
        Operation::Update => {
            let obj: K = decode(request, kind, false)?;
            let old: K = decode(request, kind, true)?;
            validator.validate_update(ctx, &old, &obj).await
        }
        Operation::Delete => {
            let old: K = decode(request, kind, true)?;
            validator.validate_delete(ctx, &old).await
        }
        Operation::Connect => Ok(()),
    }
}

/// Decide one admission review for kind `K`.
///
/// The review is taken untyped so that an object which does not match `K`
/// is denied with a decoding [`ValidationError`] rather than rejected by the
/// extractor. Returns the HTTP status together with the response review.
/// Malformed reviews get 400, every decided request 200.
pub async fn admit<K>(
    state: &WebhookState,
    validator: &dyn AdmissionValidator<K>,
    review: AdmissionReview<DynamicObject>,
) -> (StatusCode, AdmissionReview<DynamicObject>)
where
    K: Resource<DynamicType = ()> + DeserializeOwned + Send + Sync,
{
    let kind = K::kind(&()).to_string();
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(kind = %kind, error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e)).into_review(),
            );
        }
    };

    let started = Instant::now();
    let uid = request.uid.clone();
    let operation = operation_name(&request.operation);
    debug!(
        uid = %uid,
        kind = %kind,
        operation,
        namespace = ?request.namespace,
        name = ?request.name,
        dry_run = request.dry_run,
        "Processing admission request"
    );

    let ctx = RequestContext {
        dry_run: request.dry_run,
        deadline: None,
    }
    .with_timeout(state.admission_timeout);

    let result = decide(validator, &ctx, &request, &kind).await;
    state.health.metrics.record_admission(
        &kind,
        operation,
        result.is_ok(),
        started.elapsed().as_secs_f64(),
    );

    match result {
        Ok(()) => {
            info!(uid = %uid, kind = %kind, operation, "Admission request allowed");
            (
                StatusCode::OK,
                AdmissionResponse::from(&request).into_review(),
            )
        }
        Err(err) => {
            warn!(
                uid = %uid,
                kind = %kind,
                operation,
                reason = %err.error_type,
                message = %err.message,
                "Admission request denied"
            );
            (StatusCode::OK, deny_with_validation_error(&request, &err))
        }
    }
}

async fn validate_cforg(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.org.as_ref(), review).await;
    (status, Json(body))
}

async fn validate_cfspace(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.space.as_ref(), review).await;
    (status, Json(body))
}

async fn validate_cfapp(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.app.as_ref(), review).await;
    (status, Json(body))
}

async fn validate_cfpackage(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.package.as_ref(), review).await;
    (status, Json(body))
}

async fn validate_cftask(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.task.as_ref(), review).await;
    (status, Json(body))
}

async fn validate_cfroute(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.route.as_ref(), review).await;
    (status, Json(body))
}

async fn validate_cfserviceinstance(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.service_instance.as_ref(), review).await;
    (status, Json(body))
}

async fn validate_cfservicebinding(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let (status, body) = admit(&state, state.validators.service_binding.as_ref(), review).await;
    (status, Json(body))
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(CFORG_PATH, post(validate_cforg))
        .route(CFSPACE_PATH, post(validate_cfspace))
        .route(CFAPP_PATH, post(validate_cfapp))
        .route(CFPACKAGE_PATH, post(validate_cfpackage))
        .route(CFTASK_PATH, post(validate_cftask))
        .route(CFROUTE_PATH, post(validate_cfroute))
        .route(CFSERVICEINSTANCE_PATH, post(validate_cfserviceinstance))
        .route(CFSERVICEBINDING_PATH, post(validate_cfservicebinding))
        .with_state(state)
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0:`port`, marks the process ready once the certificates
/// are loaded, and serves until the listener fails.
///
/// # Arguments
/// * `state` - Validators and shared health state
/// * `port` - Port to listen on
/// * `cert_path` - Path to TLS certificate file (PEM format)
/// * `key_path` - Path to TLS private key file (PEM format)
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    port: u16,
    cert_path: &str,
    key_path: &str,
) -> Result<(), WebhookError> {
    let health = state.health.clone();
    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(PathBuf::from(cert_path), PathBuf::from(key_path))
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Webhook server listening with TLS");
    health.set_ready(true).await;

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
