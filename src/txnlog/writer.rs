//! JSON-Lines transaction log writer
//!
//! Appends one newline-terminated JSON object per mutation to the active
//! log file, rotating on local-day change. All appends are serialized
//! through one mutex per logger instance; each append writes the framed
//! record in a single `write_all` and flushes best-effort.
//!
//! Append failures never reach the mutating caller. The log is advisory
//! audit, so a lost line must not roll back a committed row; failures go
//! to the structured stderr log instead.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::observability::Logger;

use super::logger::TxnLogger;
use super::record::{TxnOp, TxnRecord};
use super::rotation::{local_day, mtime_day, rotate};

/// Derives the active log path from the database path:
/// `<db-path-without-extension>.txn.log`.
pub fn active_log_path(db_path: &Path) -> PathBuf {
    db_path.with_extension("txn.log")
}

/// Production transaction logger writing JSON-Lines to the active file.
///
/// The active file and its parent directory are created lazily on first
/// use. Two logger instances must never share an active path; appends
/// are only serialized within one instance.
pub struct JsonLinesTxnLogger {
    active_path: PathBuf,
    lane: Mutex<()>,
}

impl JsonLinesTxnLogger {
    /// Creates a logger whose active file sits next to the database.
    pub fn for_db_path(db_path: &Path) -> Self {
        Self::new(active_log_path(db_path))
    }

    /// Creates a logger with an explicit active file path.
    pub fn new(active_path: PathBuf) -> Self {
        Self {
            active_path,
            lane: Mutex::new(()),
        }
    }

    /// Returns the path of the active log file.
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    fn append(&self, record: &TxnRecord) {
        // The guarded region only performs file I/O, so a poisoned lock
        // carries no broken state worth halting over.
        let _guard = match self.lane.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(err) = self.append_inner(record) {
            Logger::error(
                "TXN_LOG_APPEND_FAILED",
                &[
                    ("path", &self.active_path.display().to_string()),
                    ("op", record.op),
                    ("error", &err.to_string()),
                ],
            );
        }
    }

    fn append_inner(&self, record: &TxnRecord) -> io::Result<()> {
        if let Some(parent) = self.active_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        // Rotate when the entry's local day differs from the day of the
        // file's last write. The rotated file is named for the file's
        // day, so a backdated entry pushes current content aside rather
        // than mixing days in one file.
        let entry_day = local_day(record.ts);
        if let Some(file_day) = mtime_day(&self.active_path)? {
            if file_day != entry_day {
                rotate(&self.active_path, &file_day)?;
            }
        }

        let line = record.to_json_line().map_err(io::Error::other)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.active_path)?;
        file.write_all(line.as_bytes())?;
        let _ = file.sync_data();

        // The file's mtime tracks the ts of the last entry written; the
        // rotation day check above reads it back on the next append.
        if let Ok(offset) = std::time::Duration::try_from_secs_f64(record.ts) {
            let _ = file.set_modified(std::time::UNIX_EPOCH + offset);
        }
        Ok(())
    }
}

impl TxnLogger for JsonLinesTxnLogger {
    fn log_insert_after(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.append(&TxnRecord::with_value(
            TxnOp::InsertAfter,
            record_type,
            key,
            ts,
            updated_at,
            txid,
            value,
        ));
    }

    fn log_update_before(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.append(&TxnRecord::with_value(
            TxnOp::UpdateBefore,
            record_type,
            key,
            ts,
            updated_at,
            txid,
            value,
        ));
    }

    fn log_update_after(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.append(&TxnRecord::with_value(
            TxnOp::UpdateAfter,
            record_type,
            key,
            ts,
            updated_at,
            txid,
            value,
        ));
    }

    fn log_delete_before(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.append(&TxnRecord::with_value(
            TxnOp::DeleteBefore,
            record_type,
            key,
            ts,
            updated_at,
            txid,
            value,
        ));
    }

    fn log_delete_before_missing(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
    ) {
        self.append(&TxnRecord::new(
            TxnOp::DeleteBeforeMissing,
            record_type,
            key,
            ts,
            updated_at,
            txid,
        ));
    }
}
