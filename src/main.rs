//! cf-admission - Admission webhooks for Cloud Foundry resources.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Reads configuration from the environment
//! - Creates the Kubernetes client
//! - Starts the health server and the TLS webhook server

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tracing::{error, info, warn};

use cf_admission::Config;
use cf_admission::coordination::LeaseStore;
use cf_admission::health::{HealthState, run_health_server};
use cf_admission::webhooks::KubeLookup;
use cf_admission::{Validators, WebhookState, run_webhook_server};

/// Field manager recorded on coordination records
const FIELD_MANAGER: &str = "cf-admission";

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cf_admission=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting cf-admission");

    let config = Config::from_env()?;
    info!(
        root_namespace = %config.root_namespace,
        webhook_port = config.webhook_port,
        health_port = config.health_port,
        admission_timeout_secs = config.admission_timeout.as_secs(),
        "Loaded configuration"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    let validators = Validators::build(
        Arc::new(LeaseStore::new(client.clone(), FIELD_MANAGER)),
        Arc::new(KubeLookup::new(client)),
        health_state.clone(),
        &config.root_namespace,
        config.name_lock_retry,
    );
    let webhook_state = Arc::new(WebhookState::new(
        validators,
        health_state.clone(),
        config.admission_timeout,
    ));

    // Start health server immediately so liveness probes pass during startup
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    // The webhook server marks the process ready once its certificates load
    let webhook_handle = {
        let port = config.webhook_port;
        let cert_path = config.webhook_cert_path.clone();
        let key_path = config.webhook_key_path.clone();
        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(webhook_state, port, &cert_path, &key_path).await {
                error!("Webhook server error: {}", e);
            }
        })
    };

    // Wait for any task to complete (or fail), or shutdown signal
    tokio::select! {
        result = webhook_handle => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the API server stops routing requests here
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission requests to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("cf-admission stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the server cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
