//! Transaction logger interface
//!
//! One method per operation kind. Implementations must be safe to share
//! across request handlers; the store calls them synchronously inside its
//! write lane. Logging is advisory: implementations never return errors
//! to the caller.

use std::sync::Mutex;

/// Sink for mutation audit records.
///
/// The caller supplies one timestamp and one `txid` per logical mutation
/// and reuses them across the paired before/after calls of an update, so
/// the two entries of a pair are identical in `ts`, `updated_at`, and
/// `txid`.
pub trait TxnLogger: Send + Sync {
    /// Records the after-image of a newly inserted row.
    fn log_insert_after(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    );

    /// Records the pre-image of a row about to be overwritten.
    fn log_update_before(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    );

    /// Records the after-image of an overwritten row.
    fn log_update_after(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    );

    /// Records the pre-image of a row about to be deleted.
    fn log_delete_before(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    );

    /// Records a delete aimed at a key that does not exist.
    fn log_delete_before_missing(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
    );
}

/// One observed logger call, for assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SpyCall {
    pub op: &'static str,
    pub record_type: String,
    pub key: String,
    pub ts: f64,
    pub txid: String,
    pub value: Option<Vec<u8>>,
}

/// In-memory logger that records call tags instead of touching disk.
#[derive(Debug, Default)]
pub struct SpyTxnLogger {
    calls: Mutex<Vec<SpyCall>>,
}

impl SpyTxnLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every call seen so far, in order.
    pub fn calls(&self) -> Vec<SpyCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(
        &self,
        op: &'static str,
        record_type: &str,
        key: &str,
        ts: f64,
        txid: &str,
        value: Option<&[u8]>,
    ) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(SpyCall {
                op,
                record_type: record_type.to_string(),
                key: key.to_string(),
                ts,
                txid: txid.to_string(),
                value: value.map(|value| value.to_vec()),
            });
        }
    }
}

impl TxnLogger for SpyTxnLogger {
    fn log_insert_after(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        _updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.record("insert-after", record_type, key, ts, txid, Some(value));
    }

    fn log_update_before(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        _updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.record("update-before", record_type, key, ts, txid, Some(value));
    }

    fn log_update_after(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        _updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.record("update-after", record_type, key, ts, txid, Some(value));
    }

    fn log_delete_before(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        _updated_at: f64,
        txid: &str,
        value: &[u8],
    ) {
        self.record("delete-before", record_type, key, ts, txid, Some(value));
    }

    fn log_delete_before_missing(
        &self,
        record_type: &str,
        key: &str,
        ts: f64,
        _updated_at: f64,
        txid: &str,
    ) {
        self.record("delete-before-missing", record_type, key, ts, txid, None);
    }
}
