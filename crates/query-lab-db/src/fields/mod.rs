//! Field definitions and types for the ORM.
//!
//! [`FieldDef`] and [`FieldType`] describe model columns; [`custom`] holds
//! preconfigured fields with their own storage conventions.

pub mod custom;
pub mod types;

pub use custom::{boolean_choice_field, positive_integer_field, unix_timestamp_field, UnixTimestamp};
pub use types::{FieldDef, FieldType, OnDelete};
