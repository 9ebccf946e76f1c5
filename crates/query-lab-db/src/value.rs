//! Backend-agnostic database values.
//!
//! [`Value`] carries field values into the database (as INSERT/UPDATE data
//! and query parameters) and back out again inside a [`Row`](crate::row::Row).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Storage format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format for date-times. Lexicographic order matches time order.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A database value.
///
/// # Examples
///
/// ```
/// use query_lab_db::value::Value;
///
/// assert_eq!(Value::from(42_i64), Value::Int(42));
/// assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
/// assert_eq!(Value::from(None::<i64>), Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean, stored as 0/1 by SQLite.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float. Decimal columns are stored this way too.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// A calendar date.
    Date(NaiveDate),
    /// A date and time without timezone (UTC by convention).
    DateTime(NaiveDateTime),
    /// A list of values, used by `IN` lookups.
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Extracts a boolean. Integers count as booleans (0 is false).
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Extracts an integer.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extracts a number as `f64`, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extracts a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as a SQL literal, for column defaults in DDL.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::String(_) | Self::Date(_) | Self::DateTime(_) | Self::List(_) => {
                format!("'{}'", self.to_string().replace('\'', "''"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(7_i32), Value::Int(7));
        assert_eq!(Value::from(7_u32), Value::Int(7));
        assert_eq!(Value::from(2.5), Value::Float(2.5));
        assert_eq!(Value::from(String::from("x")), Value::String("x".into()));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some("motto")), Value::String("motto".into()));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }

    #[test]
    fn test_date_display_uses_storage_format() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(Value::from(d).to_string(), "2025-03-09");
        let dt = d.and_hms_opt(8, 5, 0).unwrap();
        assert_eq!(Value::from(dt).to_string(), "2025-03-09 08:05:00");
    }

    #[test]
    fn test_as_bool_accepts_ints() {
        assert_eq!(Value::Int(1).as_bool(), Some(true));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::String("1".into()).as_bool(), None);
    }

    #[test]
    fn test_as_float_widens_ints() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Null.as_float(), None);
    }

    #[test]
    fn test_sql_literal() {
        assert_eq!(Value::Bool(true).to_sql_literal(), "1");
        assert_eq!(Value::Float(100.0).to_sql_literal(), "100.0");
        assert_eq!(Value::from("TBC").to_sql_literal(), "'TBC'");
        assert_eq!(Value::from("it's").to_sql_literal(), "'it''s'");
        let d = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert_eq!(Value::from(d).to_sql_literal(), "'1900-01-01'");
    }

    #[test]
    fn test_list_display() {
        let v = Value::List(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(v.to_string(), "[1, a]");
    }
}
