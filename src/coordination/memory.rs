//! In-process coordination store.
//!
//! Holds the same atomicity contracts as [`super::LeaseStore`] behind a
//! single mutex. Used by the functional tests and for running validators
//! without a cluster. Counts calls per operation and can be told to fail the
//! next calls of an operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::StoreError;
use super::store::{CoordinationRecord, CoordinationStore, HolderState};

/// Store operation, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Create,
    Delete,
    Get,
    ConditionalPatch,
}

/// Failure returned by an injected fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    NotFound,
    Conflict,
    Unavailable,
}

impl InjectedFailure {
    fn to_error(self, key: &str) -> StoreError {
        match self {
            InjectedFailure::NotFound => StoreError::NotFound(key.to_string()),
            InjectedFailure::Conflict => StoreError::Conflict(key.to_string()),
            InjectedFailure::Unavailable => StoreError::Unavailable("injected failure".to_string()),
        }
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<(String, String), CoordinationRecord>,
    faults: HashMap<StoreOperation, (usize, InjectedFailure)>,
}

impl Inner {
    fn take_fault(&mut self, op: StoreOperation, key: &str) -> Result<(), StoreError> {
        if let Some((remaining, failure)) = self.faults.get_mut(&op) {
            let failure = *failure;
            *remaining -= 1;
            if *remaining == 0 {
                self.faults.remove(&op);
            }
            return Err(failure.to_error(key));
        }
        Ok(())
    }
}

/// Coordination store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    creates: AtomicUsize,
    deletes: AtomicUsize,
    gets: AtomicUsize,
    patches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `op` with `failure`.
    pub async fn fail_next(&self, op: StoreOperation, times: usize, failure: InjectedFailure) {
        let mut inner = self.inner.lock().await;
        if times == 0 {
            inner.faults.remove(&op);
        } else {
            inner.faults.insert(op, (times, failure));
        }
    }

    /// Number of calls made to `op`, including failed ones.
    pub fn calls(&self, op: StoreOperation) -> usize {
        self.counter(op).load(Ordering::SeqCst)
    }

    /// Total number of store calls of any kind.
    pub fn total_calls(&self) -> usize {
        [
            StoreOperation::Create,
            StoreOperation::Delete,
            StoreOperation::Get,
            StoreOperation::ConditionalPatch,
        ]
        .into_iter()
        .map(|op| self.calls(op))
        .sum()
    }

    /// Snapshot of the stored record, if any.
    pub async fn record(&self, namespace: &str, key: &str) -> Option<CoordinationRecord> {
        self.inner
            .lock()
            .await
            .records
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn counter(&self, op: StoreOperation) -> &AtomicUsize {
        match op {
            StoreOperation::Create => &self.creates,
            StoreOperation::Delete => &self.deletes,
            StoreOperation::Get => &self.gets,
            StoreOperation::ConditionalPatch => &self.patches,
        }
    }

    fn count(&self, op: StoreOperation) {
        self.counter(op).fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn create(&self, record: &CoordinationRecord) -> Result<(), StoreError> {
        self.count(StoreOperation::Create);
        let mut inner = self.inner.lock().await;
        inner.take_fault(StoreOperation::Create, &record.key)?;

        let id = (record.namespace.clone(), record.key.clone());
        if inner.records.contains_key(&id) {
            return Err(StoreError::AlreadyExists(record.key.clone()));
        }
        inner.records.insert(id, record.clone());
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), StoreError> {
        self.count(StoreOperation::Delete);
        let mut inner = self.inner.lock().await;
        inner.take_fault(StoreOperation::Delete, key)?;

        inner
            .records
            .remove(&(namespace.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<CoordinationRecord, StoreError> {
        self.count(StoreOperation::Get);
        let mut inner = self.inner.lock().await;
        inner.take_fault(StoreOperation::Get, key)?;

        inner
            .records
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn conditional_patch(
        &self,
        namespace: &str,
        key: &str,
        expected: HolderState,
        replacement: HolderState,
    ) -> Result<(), StoreError> {
        self.count(StoreOperation::ConditionalPatch);
        let mut inner = self.inner.lock().await;
        inner.take_fault(StoreOperation::ConditionalPatch, key)?;

        let record = inner
            .records
            .get_mut(&(namespace.to_string(), key.to_string()))
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if record.holder != expected {
            return Err(StoreError::Conflict(key.to_string()));
        }
        record.holder = replacement;
        Ok(())
    }
}
