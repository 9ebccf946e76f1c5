//! Connection configuration.
//!
//! [`DatabaseConfig`] is what a backend is opened from. It is usually built
//! from the `databases` table of [`Settings`](query_lab_core::Settings).

use std::collections::HashMap;

use query_lab_core::{DatabaseSettings, OrmError, OrmResult};
use query_lab_db::DatabaseBackendType;

use crate::sqlite::SqliteBackend;

/// Configuration for connecting to a database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// The backend type.
    pub backend: DatabaseBackendType,
    /// The database file path, or `":memory:"`.
    pub name: String,
    /// Whether foreign key enforcement is switched on.
    pub foreign_keys: bool,
    /// Additional connection options.
    pub options: HashMap<String, String>,
}

impl DatabaseConfig {
    /// Creates a configuration for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self::sqlite_file(":memory:")
    }

    /// Creates a configuration for a SQLite file database.
    pub fn sqlite_file(path: impl Into<String>) -> Self {
        Self {
            backend: DatabaseBackendType::SQLite,
            name: path.into(),
            foreign_keys: true,
            options: HashMap::new(),
        }
    }

    /// Builds a configuration from settings.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConfigurationError`] for an engine other than
    /// SQLite or an empty database name.
    pub fn from_settings(settings: &DatabaseSettings) -> OrmResult<Self> {
        let backend = match settings.engine.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => DatabaseBackendType::SQLite,
            other => {
                return Err(OrmError::ConfigurationError(format!(
                    "Unsupported database engine: {other}"
                )))
            }
        };
        if settings.name.trim().is_empty() {
            return Err(OrmError::ConfigurationError(
                "Database name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            backend,
            name: settings.name.clone(),
            foreign_keys: settings.foreign_keys,
            options: settings.options.clone(),
        })
    }

    /// Opens a connection for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn connect(&self) -> OrmResult<SqliteBackend> {
        match self.backend {
            DatabaseBackendType::SQLite => SqliteBackend::open_with(&self.name, self.foreign_keys),
        }
    }
}
