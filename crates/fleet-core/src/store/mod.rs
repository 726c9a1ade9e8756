//! The Snapshot Store (§4.A): a generic, label-indexed, optimistic-concurrency
//! object store. The wire/storage format of the hub declarative store is out
//! of scope (§1 Non-goals) -- this module only specifies the contract every
//! reconciler in this crate programs against, plus an in-memory
//! implementation ([`memory`]) used as a stand-in in tests.

pub mod memory;
pub mod rotate;

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use snafu::Snafu;

use crate::error::{ErrorKind, Kind};

/// The error type for [`Store`] operations (§4.A, §5, §7).
#[derive(Debug, Snafu)]
pub enum StoreError {
    /// Optimistic-concurrency conflict: the caller's expected resource
    /// version is stale. Transient; callers should re-read, re-merge, and
    /// retry (§5, §7).
    #[snafu(display("conflict updating {name:?}: expected version {expected}, found {actual}"))]
    Conflict {
        name: String,
        expected: u64,
        actual: u64,
    },

    /// The named object does not exist.
    #[snafu(display("object {name:?} not found"))]
    NotFound { name: String },

    /// The bounded retry budget (§5: "retry up to a bounded count (default
    /// 3)") was exhausted without success.
    #[snafu(display("exhausted {attempts} retry attempts against the store"))]
    RetriesExhausted { attempts: u32 },
}

impl ErrorKind for StoreError {
    fn kind(&self) -> Kind {
        match self {
            StoreError::Conflict { .. } | StoreError::RetriesExhausted { .. } => Kind::Transient,
            StoreError::NotFound { .. } => Kind::Transient,
        }
    }
}

/// An object plus the resource version the store assigned it, used for
/// optimistic-concurrency compare-and-swap (§4.A, §5).
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub resource_version: u64,
}

/// The generic contract every reconciler programs against. Implementations
/// provide the label-indexed, optimistic-concurrency semantics §4.A and §5
/// require; this crate does not mandate a wire format (§1 Non-goals).
pub trait Store<T> {
    /// Label-indexed read, e.g. `ListByCRP` (§4.A, §6).
    fn list_by_label(&self, key: &str, value: &str) -> Result<Vec<Versioned<T>>, StoreError>;

    fn get(&self, name: &str) -> Result<Option<Versioned<T>>, StoreError>;

    fn create(
        &self,
        name: &str,
        labels: BTreeMap<String, String>,
        value: T,
    ) -> Result<Versioned<T>, StoreError>;

    /// Compare-and-swap update: fails with [`StoreError::Conflict`] if
    /// `expected_version` does not match the currently stored version (§4.A,
    /// §5).
    fn update(
        &self,
        name: &str,
        expected_version: u64,
        value: T,
    ) -> Result<Versioned<T>, StoreError>;

    fn delete(&self, name: &str, expected_version: u64) -> Result<(), StoreError>;
}

/// The bounded-retry combinator referenced throughout §4.A, §4.E, and §5:
/// "Conflict → re-read → re-merge → retry up to a bounded count (default
/// 3), then requeue." Used by both the Snapshot Store and the Work
/// Generator's binding-status updates so the retry policy is defined once.
///
/// `attempt` is called with the 0-based attempt number and should re-read
/// current state, re-merge, and attempt the write itself; it returns `Ok` on
/// success or a [`StoreError::Conflict`] to signal a retryable failure. Any
/// other error aborts immediately without consuming further attempts.
pub fn retry<T>(
    max_attempts: u32,
    mut attempt: impl FnMut(u32) -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    for n in 0..max_attempts {
        match attempt(n) {
            Ok(value) => return Ok(value),
            Err(StoreError::Conflict { .. }) if n + 1 < max_attempts => continue,
            Err(StoreError::Conflict { .. }) => {
                return Err(StoreError::RetriesExhausted {
                    attempts: max_attempts,
                })
            }
            Err(other) => return Err(other),
        }
    }
    unreachable!("max_attempts == 0 is the only way to skip the loop body, and callers pass >= 1")
}

/// Computes the content hash over the canonicalized, ordered resource list
/// used by `RotateResources` to detect unchanged content (§4.A).
///
/// Canonicalization is the caller's responsibility (stable key ordering,
/// normalized whitespace); this function only hashes whatever bytes it is
/// given so that it composes with any serialization the caller picks.
pub fn content_hash(canonicalized: &[u8]) -> String {
    let digest = Sha256::digest(canonicalized);
    format!("sha256:{digest:x}")
}
