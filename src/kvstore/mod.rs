//! Typed key-value storage engine for coffer
//!
//! Persists `(type, key) -> value` tuples in a single SQLite relation
//! with UPSERT semantics, point reads, existence probes, idempotent
//! deletes, and ordered prefix-limited listing. All mutations are
//! serialized through one write lane and drive the transaction logger
//! with before/after images.

mod errors;
mod store;

pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use store::{KvStore, PutOutcome, MAX_LIST_LIMIT};
