//! Runtime configuration.
//!
//! [`Settings`] holds the handful of knobs the exercises need: debug mode,
//! the log filter and the database connections keyed by alias.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The alias of the database used when none is named.
pub const DEFAULT_DB_ALIAS: &str = "default";

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The database engine. Only `"sqlite"` is supported.
    pub engine: String,
    /// The database file path, or `":memory:"`.
    pub name: String,
    /// Whether `PRAGMA foreign_keys` is switched on for new connections.
    pub foreign_keys: bool,
    /// Additional engine-specific options.
    pub options: HashMap<String, String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "sqlite".to_string(),
            name: "db.sqlite3".to_string(),
            foreign_keys: true,
            options: HashMap::new(),
        }
    }
}

/// All query-lab settings.
///
/// # Examples
///
/// ```
/// use query_lab_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.default_database().engine, "sqlite");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled. Selects pretty rather than JSON logs.
    pub debug: bool,
    /// A `tracing` filter directive such as `"info"` or `"query_lab_db=debug"`.
    pub log_level: String,
    /// Database configurations, keyed by alias.
    pub databases: HashMap<String, DatabaseSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut databases = HashMap::new();
        databases.insert(DEFAULT_DB_ALIAS.to_string(), DatabaseSettings::default());

        Self {
            debug: true,
            log_level: "info".to_string(),
            databases,
        }
    }
}

impl Settings {
    /// Returns the configuration registered under `alias`, if any.
    pub fn database(&self, alias: &str) -> Option<&DatabaseSettings> {
        self.databases.get(alias)
    }

    /// Returns the `"default"` database, falling back to the built-in default
    /// when the alias was removed from the map.
    pub fn default_database(&self) -> DatabaseSettings {
        self.database(DEFAULT_DB_ALIAS).cloned().unwrap_or_default()
    }
}
