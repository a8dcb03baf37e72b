//! Transaction log record construction
//!
//! One record per line: a single JSON object, newline-terminated. Value
//! payloads carry their raw byte length, a SHA-256 digest over the full
//! untruncated bytes, and a bounded UTF-8 preview of the value text.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Maximum byte length of the `csv` preview field.
pub const CSV_PREVIEW_MAX_BYTES: usize = 8192;

/// Placeholder stored in `csv` when the value is not valid UTF-8.
pub const NON_UTF8_PLACEHOLDER: &str = "<non-utf8>";

/// Log record schema version.
pub const RECORD_VERSION: u32 = 1;

/// The operation kind of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnOp {
    /// New row written; record carries the after-image.
    InsertAfter,
    /// Existing row about to be overwritten; record carries the pre-image.
    UpdateBefore,
    /// Existing row overwritten; record carries the after-image.
    UpdateAfter,
    /// Existing row about to be removed; record carries the pre-image.
    DeleteBefore,
    /// Delete requested for a key that does not exist; no value fields.
    DeleteBeforeMissing,
}

impl TxnOp {
    /// Returns the wire name of this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnOp::InsertAfter => "insert-after",
            TxnOp::UpdateBefore => "update-before",
            TxnOp::UpdateAfter => "update-after",
            TxnOp::DeleteBefore => "delete-before",
            TxnOp::DeleteBeforeMissing => "delete-before-missing",
        }
    }
}

/// A single transaction log record.
///
/// Field order here is the field order on the wire. The value-derived
/// fields (`bytes`, `csv`, `truncated`, `sha256`) are omitted entirely
/// for `delete-before-missing` records, and `truncated` is present only
/// when the preview was actually cut short.
#[derive(Debug, Clone, Serialize)]
pub struct TxnRecord {
    pub version: u32,
    pub ts: f64,
    pub updated_at: f64,
    pub txid: String,
    pub op: &'static str,
    #[serde(rename = "type")]
    pub record_type: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl TxnRecord {
    /// Builds a record with no value payload (`delete-before-missing`).
    pub fn new(
        op: TxnOp,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            ts,
            updated_at,
            txid: txid.to_string(),
            op: op.as_str(),
            record_type: record_type.to_string(),
            key: key.to_string(),
            bytes: None,
            csv: None,
            truncated: None,
            sha256: None,
        }
    }

    /// Builds a value-bearing record.
    ///
    /// The digest is computed over the raw untruncated bytes, so it stays
    /// a reliable integrity anchor even when the preview is cut.
    pub fn with_value(
        op: TxnOp,
        record_type: &str,
        key: &str,
        ts: f64,
        updated_at: f64,
        txid: &str,
        value: &[u8],
    ) -> Self {
        let mut record = Self::new(op, record_type, key, ts, updated_at, txid);
        let (csv, truncated) = csv_preview(value);
        record.bytes = Some(value.len());
        record.csv = Some(csv);
        record.truncated = if truncated { Some(true) } else { None };
        record.sha256 = Some(sha256_hex(value));
        record
    }

    /// Serializes the record as one JSON line terminated by `\n`.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Computes the hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Derives the `csv` preview for a value.
///
/// Returns the preview text and whether it was truncated. Invalid UTF-8
/// collapses to a fixed placeholder; oversized text is cut at the longest
/// UTF-8 boundary at or below [`CSV_PREVIEW_MAX_BYTES`], backing off at
/// most three bytes from the raw cut point.
fn csv_preview(value: &[u8]) -> (String, bool) {
    let text = match std::str::from_utf8(value) {
        Ok(text) => text,
        Err(_) => return (NON_UTF8_PLACEHOLDER.to_string(), false),
    };

    if text.len() <= CSV_PREVIEW_MAX_BYTES {
        return (text.to_string(), false);
    }

    let mut end = CSV_PREVIEW_MAX_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (text[..end].to_string(), true)
}
