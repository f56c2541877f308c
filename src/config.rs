//! Process configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

use crate::coordination::RetryPolicy;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;
/// Default health server port
pub const HEALTH_PORT: u16 = 8080;
/// Default root namespace holding orgs, routes and domains
pub const ROOT_NAMESPACE: &str = "cf";
/// Default time limit for one admission request
pub const ADMISSION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root_namespace: String,
    pub webhook_port: u16,
    pub webhook_cert_path: String,
    pub webhook_key_path: String,
    pub health_port: u16,
    pub admission_timeout: Duration,
    pub name_lock_retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_namespace: ROOT_NAMESPACE.to_string(),
            webhook_port: WEBHOOK_PORT,
            webhook_cert_path: WEBHOOK_CERT_PATH.to_string(),
            webhook_key_path: WEBHOOK_KEY_PATH.to_string(),
            health_port: HEALTH_PORT,
            admission_timeout: ADMISSION_TIMEOUT,
            name_lock_retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let retry = defaults.name_lock_retry;

        let root_namespace = lookup("CF_ROOT_NAMESPACE").unwrap_or(defaults.root_namespace);
        if root_namespace.is_empty() {
            return Err(ConfigError::Invalid {
                key: "CF_ROOT_NAMESPACE",
                value: root_namespace,
                reason: "must not be empty".to_string(),
            });
        }

        let name_lock_retry = RetryPolicy {
            max_attempts: parse(&lookup, "NAME_LOCK_MAX_ATTEMPTS", retry.max_attempts)?,
            initial_backoff: Duration::from_millis(parse(
                &lookup,
                "NAME_LOCK_INITIAL_BACKOFF_MS",
                retry.initial_backoff.as_millis() as u64,
            )?),
            max_backoff: Duration::from_millis(parse(
                &lookup,
                "NAME_LOCK_MAX_BACKOFF_MS",
                retry.max_backoff.as_millis() as u64,
            )?),
            ..retry
        };
        if name_lock_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "NAME_LOCK_MAX_ATTEMPTS",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        Ok(Self {
            root_namespace,
            webhook_port: parse(&lookup, "WEBHOOK_PORT", defaults.webhook_port)?,
            webhook_cert_path: lookup("WEBHOOK_CERT_PATH").unwrap_or(defaults.webhook_cert_path),
            webhook_key_path: lookup("WEBHOOK_KEY_PATH").unwrap_or(defaults.webhook_key_path),
            health_port: parse(&lookup, "HEALTH_PORT", defaults.health_port)?,
            admission_timeout: Duration::from_secs(parse(
                &lookup,
                "ADMISSION_TIMEOUT_SECS",
                defaults.admission_timeout.as_secs(),
            )?),
            name_lock_retry,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
