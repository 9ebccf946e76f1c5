//! Reusable custom fields.
//!
//! These are ordinary [`FieldDef`]s preconfigured for a particular storage
//! convention, plus the conversion helpers a model needs to read and write
//! them.

use chrono::{DateTime, NaiveDateTime};
use query_lab_core::{OrmError, OrmResult};

use super::types::{FieldDef, FieldType};
use crate::row::Row;
use crate::validators::MinValueValidator;
use crate::value::Value;

/// Label shown for `true` in a [`boolean_choice_field`].
pub const AVAILABLE: &str = "Available";
/// Label shown for `false` in a [`boolean_choice_field`].
pub const NOT_AVAILABLE: &str = "Not Available";

/// A boolean with human labels, defaulting to available.
pub fn boolean_choice_field(name: &'static str) -> FieldDef {
    FieldDef::new(name, FieldType::BooleanField)
        .choices([(true, AVAILABLE), (false, NOT_AVAILABLE)])
        .default(true)
}

/// An integer column that rejects negative values.
pub fn positive_integer_field(name: &'static str) -> FieldDef {
    FieldDef::new(name, FieldType::IntegerField)
        .validator(MinValueValidator::new(0.0).with_message("The value must be a positive integer"))
}

/// A date-time stored as whole seconds since the Unix epoch.
pub fn unix_timestamp_field(name: &'static str) -> FieldDef {
    FieldDef::new(name, FieldType::IntegerField).nullable()
}

/// Conversions for columns declared with [`unix_timestamp_field`].
pub struct UnixTimestamp;

impl UnixTimestamp {
    /// Converts a date-time to its stored integer form. `None` stays NULL.
    pub fn to_db(value: Option<NaiveDateTime>) -> Value {
        value.map_or(Value::Null, |dt| Value::Int(dt.and_utc().timestamp()))
    }

    /// Reads a stored timestamp column back into a date-time.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing, not an integer, or out of
    /// chrono's range.
    pub fn from_db(row: &Row, column: &str) -> OrmResult<Option<NaiveDateTime>> {
        let Some(secs) = row.get::<Option<i64>>(column)? else {
            return Ok(None);
        };
        DateTime::from_timestamp(secs, 0)
            .map(|dt| Some(dt.naive_utc()))
            .ok_or_else(|| {
                OrmError::SerializationError(format!("timestamp {secs} out of range"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_boolean_choice_field() {
        let f = boolean_choice_field("is_available");
        assert_eq!(f.default, Some(Value::Bool(true)));
        assert_eq!(f.choice_label(&Value::Bool(true)), Some("Available"));
        assert_eq!(f.choice_label(&Value::Bool(false)), Some("Not Available"));
    }

    #[test]
    fn test_positive_integer_field_rejects_negative() {
        let f = positive_integer_field("in_stock");
        let err = f.validators[0].validate(&Value::Int(-1)).unwrap_err();
        assert!(err.to_string().contains("The value must be a positive integer"));
        assert!(f.validators[0].validate(&Value::Int(0)).is_ok());
    }

    #[test]
    fn test_unix_timestamp_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let stored = UnixTimestamp::to_db(Some(dt));
        assert_eq!(stored, Value::Int(1_704_164_645));
        let row = Row::from_pairs([("registered_at", stored)]);
        assert_eq!(UnixTimestamp::from_db(&row, "registered_at").unwrap(), Some(dt));
    }

    #[test]
    fn test_unix_timestamp_null() {
        assert_eq!(UnixTimestamp::to_db(None), Value::Null);
        let row = Row::from_pairs([("registered_at", Value::Null)]);
        assert_eq!(UnixTimestamp::from_db(&row, "registered_at").unwrap(), None);
    }

    #[test]
    fn test_unix_timestamp_field_is_nullable_integer() {
        let f = unix_timestamp_field("registered_at");
        assert!(f.null);
        assert_eq!(f.field_type, FieldType::IntegerField);
    }
}
