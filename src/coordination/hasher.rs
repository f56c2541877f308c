//! Deterministic mapping from a display name to a coordination record key.
//!
//! Two callers racing to claim the same name must target the same object so
//! that the store's create-if-absent arbitrates the race. The entity type is
//! part of the digest, so equal names of different kinds never collide.

use sha1::{Digest, Sha1};

/// Prefix of every coordination record name.
///
/// Object names must start with an alphanumeric character, a bare hex digest
/// does not always satisfy that.
pub const KEY_PREFIX: &str = "n-";

/// Length of a hashed key: prefix plus 40 hex characters of SHA-1.
pub const KEY_LEN: usize = KEY_PREFIX.len() + 40;

/// Hash `(entity_type, name)` into a storage-safe record name.
pub fn hash_name(entity_type: &str, name: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(entity_type.as_bytes());
    hasher.update(b"::");
    hasher.update(name.as_bytes());
    format!("{}{:x}", KEY_PREFIX, hasher.finalize())
}
