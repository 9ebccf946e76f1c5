//! Result rows and typed column access.

use chrono::{NaiveDate, NaiveDateTime};
use query_lab_core::{OrmError, OrmResult};

use crate::value::{Value, DATETIME_FORMAT, DATE_FORMAT};

/// A database row: column names and their values, in select order.
///
/// # Examples
///
/// ```
/// use query_lab_db::row::Row;
/// use query_lab_db::value::Value;
///
/// let row = Row::new(vec!["name".into(), "wins".into()], vec!["Stark".into(), Value::Int(3)]);
/// assert_eq!(row.get::<String>("name").unwrap(), "Stark");
/// assert_eq!(row.get::<i64>("wins").unwrap(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row. Extra values or columns beyond the shorter list are dropped.
    pub fn new(mut columns: Vec<String>, mut values: Vec<Value>) -> Self {
        let len = columns.len().min(values.len());
        columns.truncate(len);
        values.truncate(len);
        Self { columns, values }
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values) = pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or cannot be converted.
    pub fn get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self.get_value(column).ok_or_else(|| {
            OrmError::DatabaseError(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value).map_err(|e| match e {
            OrmError::SerializationError(msg) => {
                OrmError::SerializationError(format!("column '{column}': {msg}"))
            }
            other => other,
        })
    }

    /// Gets a typed value by column index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds or cannot be converted.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let value = self.values.get(idx).ok_or_else(|| {
            OrmError::DatabaseError(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            ))
        })?;
        T::from_value(value)
    }

    /// Returns the raw value of a column.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Conversion from a stored [`Value`] to a Rust type.
///
/// SQLite has no boolean or date types, so `bool` accepts integers and the
/// chrono types parse the text written by the backend.
pub trait FromValue: Sized {
    /// Attempts the conversion.
    fn from_value(value: &Value) -> OrmResult<Self>;
}

fn mismatch(expected: &str, value: &Value) -> OrmError {
    OrmError::SerializationError(format!("expected {expected}, got {value:?}"))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(Self::from(*b)),
            _ => Err(mismatch("Int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        let wide = i64::from_value(value)?;
        Self::try_from(wide)
            .map_err(|e| OrmError::SerializationError(format!("Int out of i32 range: {e}")))
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        let wide = i64::from_value(value)?;
        Self::try_from(wide)
            .map_err(|e| OrmError::SerializationError(format!("Int out of u32 range: {e}")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        value.as_float().ok_or_else(|| mismatch("Float", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> OrmResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("Bool", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::DateTime(dt) => Ok(dt.date()),
            Value::String(s) => {
                let head = s.get(..10).unwrap_or(s);
                Self::parse_from_str(head, DATE_FORMAT)
                    .map_err(|e| OrmError::SerializationError(format!("bad date '{s}': {e}")))
            }
            _ => Err(mismatch("Date", value)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
            Value::String(s) => Self::parse_from_str(s, DATETIME_FORMAT)
                .or_else(|_| Self::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .or_else(|_| {
                    NaiveDate::parse_from_str(s, DATE_FORMAT)
                        .map(|d| d.and_time(chrono::NaiveTime::MIN))
                })
                .map_err(|e| OrmError::SerializationError(format!("bad datetime '{s}': {e}"))),
            _ => Err(mismatch("DateTime", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}
