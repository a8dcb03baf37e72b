//! coffer - a small, self-hosted, typed key-value service
//!
//! CRUD over HTTP on top of a SQLite-backed typed key-value store, with
//! a durable, human-readable JSON-Lines transaction log of every
//! mutation.

pub mod cli;
pub mod config;
pub mod http_server;
pub mod kvstore;
pub mod observability;
pub mod txnlog;
