//! Error types for the coordination layer.
//!
//! `StoreError` classifies what the backing store reported; `Error` adds the
//! registry operation that failed so callers can tell a taken name apart
//! from infrastructure trouble.

use thiserror::Error;

/// Failure reported by a coordination store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Create-if-absent found an existing record
    #[error("record {0} already exists")]
    AlreadyExists(String),

    /// The record does not exist
    #[error("record {0} not found")]
    NotFound(String),

    /// A conditional update's precondition did not hold
    #[error("conditional update of record {0} was rejected")]
    Conflict(String),

    /// The request deadline passed before the store answered
    #[error("deadline exceeded waiting for the coordination store")]
    DeadlineExceeded,

    /// The store could not be reached
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Translate a Kubernetes API error about record `key` into a store error.
    pub fn from_kube(key: &str, err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(status) if status.code == 404 => StoreError::NotFound(key.to_string()),
            kube::Error::Api(status) if status.code == 409 && status.reason == "AlreadyExists" => {
                StoreError::AlreadyExists(key.to_string())
            }
            // A failed JSON patch `test` operation is reported as 422, a stale
            // resourceVersion as 409
            kube::Error::Api(status) if status.code == 409 || status.code == 422 => {
                StoreError::Conflict(key.to_string())
            }
            _ => StoreError::Kube(err),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::NotFound(_)
            | StoreError::Conflict(_)
            | StoreError::DeadlineExceeded
            | StoreError::Unavailable(_) => true,
            StoreError::Kube(e) => {
                matches!(
                    e,
                    kube::Error::Api(api_err) if api_err.code >= 500 || api_err.code == 429
                ) || matches!(e, kube::Error::Service(_))
            }
            StoreError::AlreadyExists(_) | StoreError::Serialization(_) => false,
        }
    }
}

/// Failure of a name registry operation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("creating a lease failed: {0}")]
    Register(#[source] StoreError),

    #[error("deleting a lease failed: {0}")]
    Deregister(#[source] StoreError),

    #[error("failed to acquire lock on lease: {0}")]
    Lock(#[source] StoreError),

    #[error("failed to release lock on lease: {0}")]
    Unlock(#[source] StoreError),

    #[error("getting a lease failed: {0}")]
    Ownership(#[source] StoreError),
}

impl Error {
    /// The underlying store failure.
    pub fn store_error(&self) -> &StoreError {
        match self {
            Error::Register(e)
            | Error::Deregister(e)
            | Error::Lock(e)
            | Error::Unlock(e)
            | Error::Ownership(e) => e,
        }
    }

    /// The name is already registered by someone else.
    pub fn is_already_exists(&self) -> bool {
        matches!(self.store_error(), StoreError::AlreadyExists(_))
    }

    /// The record vanished or never existed.
    pub fn is_not_found(&self) -> bool {
        matches!(self.store_error(), StoreError::NotFound(_))
    }

    /// The record was in an unexpected holder state.
    pub fn is_conflict(&self) -> bool {
        matches!(self.store_error(), StoreError::Conflict(_))
    }

    /// Infrastructure-level failure that may clear up on retry.
    pub fn is_transient(&self) -> bool {
        self.store_error().is_transient()
    }
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;
