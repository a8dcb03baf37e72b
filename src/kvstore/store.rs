//! Typed key-value store over SQLite
//!
//! One relation keyed by the composite primary key `(type, key)` holds
//! opaque byte values. All mutations flow through a single write lane (a
//! mutex-guarded write connection) so writes are totally ordered; reads
//! run concurrently on a pooled set of read connections in WAL mode.
//!
//! Every successful mutation drives the transaction logger with
//! before/after images inside the write lane, so log entries of distinct
//! mutations never interleave.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::txnlog::TxnLogger;

use super::errors::{StoreError, StoreResult};

/// Largest number of keys one `list` call returns.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Read connections kept in the pool.
const READ_POOL_SIZE: u32 = 8;

/// Whether a `put` created a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Updated,
}

/// Typed key-value store backed by a single SQLite file.
///
/// Owns the database handles for its lifetime; nothing else may touch
/// the file while the store is open. Holds one [`TxnLogger`] and emits
/// one audit record per mutation effect.
pub struct KvStore {
    write_conn: Mutex<Connection>,
    read_pool: Pool<SqliteConnectionManager>,
    logger: Arc<dyn TxnLogger>,
    db_path: PathBuf,
}

impl KvStore {
    /// Opens or creates the store at `db_path`.
    ///
    /// Creates the parent directory and schema as needed and configures
    /// SQLite for durability (`journal_mode=WAL`, `synchronous=FULL`).
    pub fn open(db_path: impl AsRef<Path>, logger: Arc<dyn TxnLogger>) -> StoreResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    StoreError::io_failed(
                        format!("failed to create data directory {}", parent.display()),
                        err,
                    )
                })?;
            }
        }

        let write_conn = Connection::open(&db_path).map_err(|err| {
            StoreError::io_failed(
                format!("failed to open database at {}", db_path.display()),
                err,
            )
        })?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "synchronous", "FULL")?;

        write_conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_records (
                type        TEXT NOT NULL,
                key         TEXT NOT NULL,
                value       BLOB NOT NULL,
                updated_at  REAL NOT NULL,
                PRIMARY KEY (type, key)
            )",
            [],
        )?;
        write_conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_kv_records_type ON kv_records(type)",
            [],
        )?;

        let manager = SqliteConnectionManager::file(&db_path);
        let read_pool = Pool::builder().max_size(READ_POOL_SIZE).build(manager)?;

        Ok(Self {
            write_conn: Mutex::new(write_conn),
            read_pool,
            logger,
            db_path,
        })
    }

    /// Returns the path of the backing database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Writes `value` under `(record_type, key)`, replacing any existing
    /// record.
    ///
    /// Inside the write lane: the pre-image (if any) is captured and
    /// logged as `update-before`, the row is upserted with a fresh
    /// `updated_at`, then the after-image is logged as `insert-after` or
    /// `update-after` under the same `txid` and timestamp.
    pub fn put(&self, record_type: &str, key: &str, value: &[u8]) -> StoreResult<PutOutcome> {
        validate_nonempty("type", record_type)?;
        validate_nonempty("key", key)?;
        if value.is_empty() {
            return Err(StoreError::invalid_argument("value must be nonempty"));
        }

        let conn = self
            .write_conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("put"))?;

        let ts = unix_now();
        let txid = Uuid::new_v4().to_string();
        let existing = fetch_value(&conn, record_type, key)?;

        if let Some(ref previous) = existing {
            self.logger
                .log_update_before(record_type, key, ts, ts, &txid, previous);
        }

        conn.execute(
            "INSERT INTO kv_records (type, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (type, key)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![record_type, key, value, ts],
        )?;

        if existing.is_some() {
            self.logger
                .log_update_after(record_type, key, ts, ts, &txid, value);
            Ok(PutOutcome::Updated)
        } else {
            self.logger
                .log_insert_after(record_type, key, ts, ts, &txid, value);
            Ok(PutOutcome::Created)
        }
    }

    /// Returns the exact bytes stored under `(record_type, key)`, or
    /// `None` when absent.
    pub fn get(&self, record_type: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.read_pool.get()?;
        fetch_value(&conn, record_type, key)
    }

    /// Cheap existence probe, consistent with `get` at the boundaries of
    /// a completed write.
    pub fn exists(&self, record_type: &str, key: &str) -> StoreResult<bool> {
        let conn = self.read_pool.get()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM kv_records WHERE type = ?1 AND key = ?2",
                params![record_type, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Removes `(record_type, key)` if present. Idempotent.
    ///
    /// An existing row is logged as `delete-before` with its pre-image
    /// before removal; a missing key is logged as
    /// `delete-before-missing` and leaves the relation untouched.
    /// Returns whether a row was actually removed.
    pub fn delete(&self, record_type: &str, key: &str) -> StoreResult<bool> {
        let conn = self
            .write_conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("delete"))?;

        let ts = unix_now();
        let txid = Uuid::new_v4().to_string();

        match fetch_value(&conn, record_type, key)? {
            Some(previous) => {
                self.logger
                    .log_delete_before(record_type, key, ts, ts, &txid, &previous);
                conn.execute(
                    "DELETE FROM kv_records WHERE type = ?1 AND key = ?2",
                    params![record_type, key],
                )?;
                Ok(true)
            }
            None => {
                self.logger
                    .log_delete_before_missing(record_type, key, ts, ts, &txid);
                Ok(false)
            }
        }
    }

    /// Lists keys of `record_type` in ascending lexicographic order,
    /// optionally filtered to those starting with `prefix`, capped at
    /// `limit` (itself capped at [`MAX_LIST_LIMIT`]).
    ///
    /// The prefix filter is a literal SQL `LIKE` anchored at the start;
    /// `%` and `_` in the prefix act as wildcards and are not escaped.
    pub fn list(
        &self,
        record_type: &str,
        prefix: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let limit = limit.min(MAX_LIST_LIMIT);
        let conn = self.read_pool.get()?;

        // Absent and empty prefixes are equivalent.
        let prefix = prefix.filter(|prefix| !prefix.is_empty());

        let mut keys = Vec::new();
        match prefix {
            Some(prefix) => {
                let pattern = format!("{prefix}%");
                let mut stmt = conn.prepare(
                    "SELECT key FROM kv_records WHERE type = ?1 AND key LIKE ?2
                     ORDER BY key ASC LIMIT ?3",
                )?;
                let rows =
                    stmt.query_map(params![record_type, pattern, limit as i64], |row| {
                        row.get::<_, String>(0)
                    })?;
                for row in rows {
                    keys.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT key FROM kv_records WHERE type = ?1
                     ORDER BY key ASC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![record_type, limit as i64], |row| {
                    row.get::<_, String>(0)
                })?;
                for row in rows {
                    keys.push(row?);
                }
            }
        }
        Ok(keys)
    }
}

/// Keyed point read used by both the read path and the write lane.
fn fetch_value(conn: &Connection, record_type: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_records WHERE type = ?1 AND key = ?2",
            params![record_type, key],
            |row| row.get::<_, Vec<u8>>(0),
        )
        .optional()?;
    Ok(value)
}

fn validate_nonempty(field: &str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::invalid_argument(format!(
            "{field} must be nonempty"
        )));
    }
    Ok(())
}

/// Wall-clock seconds since the Unix epoch.
fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvstore::errors::StoreErrorCode;
    use crate::txnlog::SpyTxnLogger;
    use tempfile::TempDir;

    fn open_spy_store() -> (TempDir, KvStore, Arc<SpyTxnLogger>) {
        let dir = TempDir::new().unwrap();
        let spy = Arc::new(SpyTxnLogger::new());
        let store = KvStore::open(dir.path().join("test.sqlite"), spy.clone()).unwrap();
        (dir, store, spy)
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let (_dir, store, _spy) = open_spy_store();

        let outcome = store.put("users", "alice", b"id,name\n1,Alice\n").unwrap();
        assert_eq!(outcome, PutOutcome::Created);
        assert_eq!(
            store.get("users", "alice").unwrap().as_deref(),
            Some(&b"id,name\n1,Alice\n"[..])
        );
        assert!(store.exists("users", "alice").unwrap());
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (_dir, store, _spy) = open_spy_store();
        assert!(store.get("users", "nobody").unwrap().is_none());
        assert!(!store.exists("users", "nobody").unwrap());
    }

    #[test]
    fn test_put_overwrites_existing_value() {
        let (_dir, store, _spy) = open_spy_store();

        store.put("users", "alice", b"v1").unwrap();
        let outcome = store.put("users", "alice", b"v2").unwrap();

        assert_eq!(outcome, PutOutcome::Updated);
        assert_eq!(store.get("users", "alice").unwrap().as_deref(), Some(&b"v2"[..]));
    }

    #[test]
    fn test_types_partition_keys() {
        let (_dir, store, _spy) = open_spy_store();

        store.put("users", "shared", b"user").unwrap();
        store.put("items", "shared", b"item").unwrap();

        assert_eq!(store.get("users", "shared").unwrap().as_deref(), Some(&b"user"[..]));
        assert_eq!(store.get("items", "shared").unwrap().as_deref(), Some(&b"item"[..]));
    }

    #[test]
    fn test_delete_removes_and_is_idempotent() {
        let (_dir, store, _spy) = open_spy_store();

        store.put("users", "alice", b"v").unwrap();
        assert!(store.delete("users", "alice").unwrap());
        assert!(!store.exists("users", "alice").unwrap());
        assert!(store.get("users", "alice").unwrap().is_none());

        // Second delete succeeds without touching the relation.
        assert!(!store.delete("users", "alice").unwrap());
    }

    #[test]
    fn test_put_rejects_empty_arguments() {
        let (_dir, store, _spy) = open_spy_store();

        for (record_type, key, value) in
            [("", "k", &b"v"[..]), ("t", "", &b"v"[..]), ("t", "k", &b""[..])]
        {
            let err = store.put(record_type, key, value).unwrap_err();
            assert_eq!(err.code(), StoreErrorCode::InvalidArgument);
        }
    }

    #[test]
    fn test_list_orders_and_filters() {
        let (_dir, store, _spy) = open_spy_store();

        store.put("items", "b1", b"v").unwrap();
        store.put("items", "a2", b"v").unwrap();
        store.put("items", "a1", b"v").unwrap();
        store.put("other", "a9", b"v").unwrap();

        assert_eq!(store.list("items", None, 10).unwrap(), ["a1", "a2", "b1"]);
        assert_eq!(store.list("items", Some("a"), 10).unwrap(), ["a1", "a2"]);
        assert_eq!(store.list("items", None, 2).unwrap(), ["a1", "a2"]);
        assert_eq!(store.list("items", Some(""), 10).unwrap(), ["a1", "a2", "b1"]);
        assert!(store.list("items", None, 0).unwrap().is_empty());
        assert!(store.list("missing", None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_clamps_limit() {
        let (_dir, store, _spy) = open_spy_store();
        store.put("items", "a1", b"v").unwrap();
        // A limit above the cap behaves as the cap, not an error.
        assert_eq!(store.list("items", None, 50_000).unwrap(), ["a1"]);
    }

    #[test]
    fn test_insert_emits_single_after_entry() {
        let (_dir, store, spy) = open_spy_store();

        store.put("users", "alice", b"v1").unwrap();

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, "insert-after");
        assert_eq!(calls[0].record_type, "users");
        assert_eq!(calls[0].key, "alice");
        assert_eq!(calls[0].value.as_deref(), Some(&b"v1"[..]));
    }

    #[test]
    fn test_update_emits_paired_entries_sharing_txid() {
        let (_dir, store, spy) = open_spy_store();

        store.put("users", "alice", b"v1").unwrap();
        store.put("users", "alice", b"v2").unwrap();

        let calls = spy.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].op, "update-before");
        assert_eq!(calls[1].value.as_deref(), Some(&b"v1"[..]));
        assert_eq!(calls[2].op, "update-after");
        assert_eq!(calls[2].value.as_deref(), Some(&b"v2"[..]));
        assert_eq!(calls[1].txid, calls[2].txid);
        assert_eq!(calls[1].ts, calls[2].ts);
        // The update pair carries a different txid than the insert.
        assert_ne!(calls[0].txid, calls[1].txid);
    }

    #[test]
    fn test_delete_existing_logs_pre_image() {
        let (_dir, store, spy) = open_spy_store();

        store.put("users", "alice", b"v1").unwrap();
        store.delete("users", "alice").unwrap();

        let calls = spy.calls();
        assert_eq!(calls.last().unwrap().op, "delete-before");
        assert_eq!(calls.last().unwrap().value.as_deref(), Some(&b"v1"[..]));
    }

    #[test]
    fn test_delete_treats_empty_components_as_missing() {
        let (_dir, store, spy) = open_spy_store();

        assert!(!store.delete("", "k").unwrap());
        assert!(!store.delete("t", "").unwrap());

        let calls = spy.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|call| call.op == "delete-before-missing"));
    }

    #[test]
    fn test_delete_missing_logs_without_value() {
        let (_dir, store, spy) = open_spy_store();

        store.delete("ghosts", "phantom").unwrap();

        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, "delete-before-missing");
        assert_eq!(calls[0].key, "phantom");
        assert!(calls[0].value.is_none());
    }

    #[test]
    fn test_store_reopens_with_data_intact() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.sqlite");

        {
            let store =
                KvStore::open(&db_path, Arc::new(SpyTxnLogger::new())).unwrap();
            store.put("users", "alice", b"persisted").unwrap();
        }

        let store = KvStore::open(&db_path, Arc::new(SpyTxnLogger::new())).unwrap();
        assert_eq!(
            store.get("users", "alice").unwrap().as_deref(),
            Some(&b"persisted"[..])
        );
    }
}
