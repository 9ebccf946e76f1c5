//! # query-lab-db-backends
//!
//! The SQLite backend the exercises run against. [`SqliteBackend`] implements
//! [`DbExecutor`](query_lab_db::DbExecutor) on top of `rusqlite`, and
//! [`DatabaseConfig`] opens one from settings.

#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
// significant_drop_tightening: false positives with async Mutex guards
#![allow(clippy::significant_drop_tightening)]

pub mod base;
pub mod sqlite;

pub use base::DatabaseConfig;
pub use sqlite::SqliteBackend;
