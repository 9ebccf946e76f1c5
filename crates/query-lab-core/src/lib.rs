//! # query-lab-core
//!
//! Foundation types shared by the ORM, the backends and the exercises.
//!
//! ## Modules
//!
//! - [`error`] - `OrmError`, `ValidationError` and the `OrmResult` alias
//! - [`settings`] - runtime configuration
//! - [`settings_loader`] - TOML / JSON / environment loading
//! - [`logging`] - tracing subscriber setup

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use error::{OrmError, OrmResult, ValidationError};
pub use settings::{DatabaseSettings, Settings};
