//! cf-admission library crate
//!
//! Admission webhooks for Cloud Foundry resources on Kubernetes. Exports the
//! CRD definitions, the coordination name registry, and the validators
//! served by the webhook server.

pub mod config;
pub mod coordination;
pub mod crd;
pub mod health;
pub mod webhooks;

pub use config::{Config, ConfigError};
pub use health::HealthState;
pub use webhooks::{Validators, WebhookError, WebhookState, run_webhook_server};
