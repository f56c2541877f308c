//! Health server for Kubernetes probes and Prometheus metrics.
//!
//! Provides:
//! - `/healthz` - Liveness probe (always returns 200 if server is running)
//! - `/readyz` - Readiness probe (returns 200 when ready to admit requests)
//! - `/metrics` - Prometheus metrics endpoint

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabel, EncodeLabelSet, LabelSetEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use tokio::sync::RwLock;
use tracing::info;

/// Labels for a decided admission request
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct AdmissionLabels {
    pub kind: String,
    pub operation: String,
    pub allowed: bool,
}

impl EncodeLabelSet for AdmissionLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), std::fmt::Error> {
        ("kind", self.kind.as_str()).encode(encoder.encode_label())?;
        ("operation", self.operation.as_str()).encode(encoder.encode_label())?;
        ("allowed", if self.allowed { "true" } else { "false" }).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Labels for admission latency
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct OperationLabels {
    pub kind: String,
    pub operation: String,
}

impl EncodeLabelSet for OperationLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), std::fmt::Error> {
        ("kind", self.kind.as_str()).encode(encoder.encode_label())?;
        ("operation", self.operation.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Labels for name registry calls
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct RegistryLabels {
    pub operation: String,
    pub outcome: String,
}

impl EncodeLabelSet for RegistryLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), std::fmt::Error> {
        ("operation", self.operation.as_str()).encode(encoder.encode_label())?;
        ("outcome", self.outcome.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Shared metrics for the admission server
pub struct Metrics {
    /// Admission requests by kind, operation and decision
    pub admission_requests: Family<AdmissionLabels, Counter>,
    /// Admission handling duration histogram
    pub admission_duration_seconds: Family<OperationLabels, Histogram>,
    /// Name registry calls by operation and outcome
    pub name_registry_operations: Family<RegistryLabels, Counter>,
    /// Prometheus registry
    registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance with registered metrics
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let admission_requests = Family::<AdmissionLabels, Counter>::default();
        registry.register(
            "cfadmission_admission_requests",
            "Total number of admission requests",
            admission_requests.clone(),
        );

        let admission_duration_seconds =
            Family::<OperationLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 15))
            });
        registry.register(
            "cfadmission_admission_duration_seconds",
            "Duration of admission request handling in seconds",
            admission_duration_seconds.clone(),
        );

        let name_registry_operations = Family::<RegistryLabels, Counter>::default();
        registry.register(
            "cfadmission_name_registry_operations",
            "Total number of name registry operations",
            name_registry_operations.clone(),
        );

        Self {
            admission_requests,
            admission_duration_seconds,
            name_registry_operations,
            registry,
        }
    }

    /// Record a decided admission request
    pub fn record_admission(&self, kind: &str, operation: &str, allowed: bool, duration_secs: f64) {
        self.admission_requests
            .get_or_create(&AdmissionLabels {
                kind: kind.to_string(),
                operation: operation.to_string(),
                allowed,
            })
            .inc();
        self.admission_duration_seconds
            .get_or_create(&OperationLabels {
                kind: kind.to_string(),
                operation: operation.to_string(),
            })
            .observe(duration_secs);
    }

    /// Record the outcome of a name registry call
    pub fn record_registry_operation(&self, operation: &str, outcome: &str) {
        self.name_registry_operations
            .get_or_create(&RegistryLabels {
                operation: operation.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    /// Encode metrics to Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if encode(&mut buffer, &self.registry).is_err() {
            tracing::error!("Failed to encode metrics");
            return "# Error encoding metrics".to_string();
        }
        buffer
    }
}

/// Shared state for the health server
pub struct HealthState {
    /// Whether the webhook server is up and admitting requests
    ready: RwLock<bool>,
    /// Metrics registry
    pub metrics: Metrics,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (starts as not ready)
    pub fn new() -> Self {
        Self {
            ready: RwLock::new(false),
            metrics: Metrics::new(),
        }
    }

    /// Mark the server as ready or not ready
    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// Check if the server is ready
    pub async fn is_ready(&self) -> bool {
        *self.ready.read().await
    }
}

/// Liveness probe handler
///
/// Returns 200 OK if the process is alive.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe handler
///
/// Returns 200 OK once the webhook server is serving.
/// Returns 503 Service Unavailable before that and during shutdown.
async fn readyz(State(state): State<Arc<HealthState>>) -> Response {
    if state.is_ready().await {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

/// Metrics handler
async fn metrics_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let body = state.metrics.encode();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Create the health server router
pub fn create_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Run the health server on `port`.
pub async fn run_health_server(state: Arc<HealthState>, port: u16) -> Result<(), std::io::Error> {
    let app = create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Starting health server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
