//! Loading [`Settings`] from TOML or JSON files and the environment.
//!
//! Values are applied in three layers:
//!
//! 1. the built-in defaults,
//! 2. a TOML or JSON document, deep-merged over the defaults,
//! 3. environment variable overrides.
//!
//! | Env Var | Setting |
//! |---|---|
//! | `QUERY_LAB_DEBUG` | `debug` |
//! | `QUERY_LAB_LOG_LEVEL` | `log_level` |
//! | `QUERY_LAB_DATABASE_ENGINE` | `databases.default.engine` |
//! | `QUERY_LAB_DATABASE_NAME` | `databases.default.name` |
//!
//! ```rust,no_run
//! use query_lab_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("query-lab.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::OrmError;
use crate::settings::{DatabaseSettings, Settings, DEFAULT_DB_ALIAS};

/// Loads settings from a TOML string. Missing keys keep their defaults.
///
/// # Errors
///
/// Returns [`OrmError::ConfigurationError`] if the TOML is malformed or has
/// values of the wrong type.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, OrmError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| OrmError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    let content = read_config(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file, then applies environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string. Missing keys keep their defaults.
///
/// # Errors
///
/// Returns [`OrmError::ConfigurationError`] if the JSON is malformed.
pub fn from_json_str(json_str: &str) -> Result<Settings, OrmError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| OrmError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    let content = read_config(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Builds settings from the defaults plus environment overrides.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `QUERY_LAB_*` environment variables to `settings`.
///
/// `QUERY_LAB_DEBUG` is true for `"true"`, `"1"` or `"yes"` (any case).
/// Database overrides target the `"default"` alias, creating it if needed.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("QUERY_LAB_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("QUERY_LAB_LOG_LEVEL") {
        settings.log_level = val;
    }

    let engine = std::env::var("QUERY_LAB_DATABASE_ENGINE").ok();
    let name = std::env::var("QUERY_LAB_DATABASE_NAME").ok();
    if engine.is_some() || name.is_some() {
        let db = settings
            .databases
            .entry(DEFAULT_DB_ALIAS.to_string())
            .or_insert_with(DatabaseSettings::default);
        if let Some(engine) = engine {
            db.engine = engine;
        }
        if let Some(name) = name {
            db.name = name;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, kind: &str) -> Result<String, OrmError> {
    std::fs::read_to_string(path).map_err(|e| {
        OrmError::ConfigurationError(format!(
            "Failed to read {kind} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, kind: &str) -> Result<Settings, OrmError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        OrmError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;
    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        OrmError::ConfigurationError(format!("Failed to deserialize settings from {kind}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values; `override_val` wins on conflicts.
///
/// A database alias that only exists in the override is merged over a
/// default [`DatabaseSettings`] so that partial entries stay valid.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            if let Some(serde_json::Value::Object(dbs)) = base_map.get_mut("databases") {
                let template = serde_json::to_value(DatabaseSettings::default())
                    .unwrap_or(serde_json::Value::Null);
                for db in dbs.values_mut() {
                    let partial = std::mem::take(db);
                    *db = merge_json(template.clone(), partial);
                }
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
