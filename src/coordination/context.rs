//! Request-scoped context passed through every registry call.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::error::StoreError;

/// Per-request state carried from the admission request down to the store.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    /// The request is a simulation and must not leave durable state behind.
    pub dry_run: bool,
    /// Point in time after which store calls are abandoned.
    pub deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// A context with no deadline that commits its changes.
    pub fn new() -> Self {
        Self {
            dry_run: false,
            deadline: None,
        }
    }

    /// A context for a dry-run request.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            deadline: None,
        }
    }

    /// Bound every store call made with this context by `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has already passed.
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Drive `fut` until it completes or the deadline passes, `None` on expiry.
    pub async fn until_deadline<F: Future>(&self, fut: F) -> Option<F::Output> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
            None => Some(fut.await),
        }
    }

    /// Run a store call under the request deadline.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.until_deadline(call)
            .await
            .unwrap_or(Err(StoreError::DeadlineExceeded))
    }
}
