//! Cluster-wide name coordination.
//!
//! Kubernetes has no "unique within a scope" constraint, so uniqueness is
//! built from atomic single-object operations on coordination records:
//! - [`hasher`] maps `(entity type, name)` to a record key
//! - [`store`] defines the store seam and its Lease-backed implementation
//! - [`registry`] claims, locks and releases names on top of a store

pub mod context;
pub mod error;
pub mod hasher;
pub mod memory;
pub mod registry;
pub mod retry;
pub mod store;

pub use context::RequestContext;
pub use error::{Error, Result, StoreError};
pub use hasher::{KEY_LEN, KEY_PREFIX, hash_name};
pub use memory::{InjectedFailure, MemoryStore, StoreOperation};
pub use registry::{LeaseNameRegistry, NameRegistry};
pub use retry::RetryPolicy;
pub use store::{CoordinationRecord, CoordinationStore, HolderState, LeaseStore};
