//! Transaction log subsystem for coffer
//!
//! Every mutation of the key-value store appends one JSON-Lines record
//! to an append-only log file next to the database. The log is a
//! human-readable audit trail, not a redo log:
//!
//! - One mutation, one `txid`; the before and after entries of an update
//!   share it.
//! - Value payloads carry a SHA-256 digest over the raw bytes and a
//!   bounded UTF-8 preview of the text.
//! - The active file rotates when the local calendar day changes, with
//!   numeric suffixes on collision.
//! - Append failures are reported to stderr and swallowed; a committed
//!   row is never rolled back over a lost log line.

mod logger;
mod record;
mod rotation;
mod writer;

pub use logger::{SpyCall, SpyTxnLogger, TxnLogger};
pub use record::{TxnOp, TxnRecord, CSV_PREVIEW_MAX_BYTES, NON_UTF8_PLACEHOLDER, RECORD_VERSION};
pub use writer::{active_log_path, JsonLinesTxnLogger};
