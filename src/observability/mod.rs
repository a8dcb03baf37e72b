//! Process observability for coffer
//!
//! Structured JSON logging to stdout/stderr. The transaction log's
//! swallowed I/O failures surface here and nowhere else.

mod logger;

pub use logger::{Logger, Severity};
