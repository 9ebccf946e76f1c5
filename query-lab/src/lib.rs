//! # query-lab
//!
//! ORM query exercises over SQLite. Each module under [`apps`] defines a few
//! models, creates their tables, and exposes async functions that filter,
//! aggregate, update or delete rows and report the result as a string.
//!
//! ## Module Overview
//!
//! - [`apps::students`] - create, list, bulk update and truncate
//! - [`apps::basics`] - single-model CRUD: pets, artifacts, locations, cars, tasks, hotel rooms
//! - [`apps::catalog`] - bulk creation and conditional updates with `CASE`
//! - [`apps::movies`] - directors, actors and movies with annotations
//! - [`apps::shop`] - profiles, products and orders
//! - [`apps::publishing`] - publishers, authors and books
//! - [`apps::dragons`] - houses, dragons and quests
//! - [`apps::space`] - astronauts, spacecraft and missions
//! - [`apps::customers`] - validators and custom fields
//!
//! ## Example
//!
//! ```no_run
//! use query_lab::apps::movies;
//! use query_lab_db_backends::SqliteBackend;
//!
//! # async fn run() -> query_lab_core::OrmResult<()> {
//! let db = SqliteBackend::memory()?;
//! movies::create_tables(&db).await?;
//! println!("{}", movies::get_top_director(&db).await?);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::future_not_send)]

pub mod apps;
mod choices;

use query_lab_core::{OrmResult, Settings};
use query_lab_db_backends::{DatabaseConfig, SqliteBackend};

/// Sets up logging and opens the default database named by `settings`.
///
/// # Errors
///
/// Returns a configuration error for an unsupported engine, or a database
/// error if the file cannot be opened.
pub fn connect(settings: &Settings) -> OrmResult<SqliteBackend> {
    query_lab_core::logging::setup_logging(settings);
    let config = DatabaseConfig::from_settings(&settings.default_database())?;
    tracing::info!(database = %config.name, "opening database");
    config.connect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_in_memory() {
        let mut settings = Settings::default();
        if let Some(db) = settings.databases.get_mut("default") {
            db.name = ":memory:".to_string();
        }
        let backend = connect(&settings).unwrap();
        assert_eq!(backend.path(), std::path::Path::new(":memory:"));
    }

    #[test]
    fn test_connect_rejects_unknown_engine() {
        let mut settings = Settings::default();
        if let Some(db) = settings.databases.get_mut("default") {
            db.engine = "oracle".to_string();
        }
        assert!(connect(&settings).is_err());
    }
}
