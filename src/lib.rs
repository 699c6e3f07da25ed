//! Core library surface for tabsync.
//!
//! A file source and a relational source both produce the same `Dataset`; the
//! `Coordinator` holds it, applies row edits, and writes it back out through
//! either one. The `tabsync` binary is a thin layer over these modules.
pub mod background;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod models;
pub mod source;

/// The pieces most callers need to move a dataset around.
pub use coordinator::Coordinator;
pub use db::RelationalSource;
pub use error::{ErrorKind, Result, SourceError};
pub use file::{FileOptions, FileSource};
pub use models::{ColumnDef, ColumnType, ConnectionParams, Dataset, Header, Row, TableSchema};
pub use source::TabularSource;

/// Background loading for callers that keep their own event loop.
pub use background::{spawn_load, PendingLoad, Poll};

/// Command-line entry point used by `main.rs`.
pub use cli::run_cli;
