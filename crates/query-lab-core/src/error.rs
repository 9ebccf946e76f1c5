//! Error types shared by every query-lab crate.
//!
//! [`OrmError`] covers lookups that find too few or too many rows, database
//! and constraint failures, model validation, configuration problems and I/O.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A validation failure, either a single message or a set of per-field errors.
///
/// # Examples
///
/// ```
/// use query_lab_core::error::ValidationError;
///
/// let err = ValidationError::new("Enter a valid email address", "invalid");
/// assert_eq!(err.to_string(), "Enter a valid email address");
///
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert("email".to_string(), vec![err]);
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.has_field("email"));
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code naming the kind of failure (e.g. "max_length", "invalid").
    pub code: String,
    /// Extra context for the message, such as the configured limit.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` holding per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if at least one error is recorded for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.field_errors
            .get(field)
            .is_some_and(|errors| !errors.is_empty())
    }

    /// Returns the messages recorded for `field`, in the order they were added.
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.field_errors
            .get(field)
            .map(|errors| errors.iter().map(|e| e.message.as_str()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<_> = self.field_errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let mut first = true;
            for (field, errors) in fields {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The error type returned by the ORM, the backends and the exercises.
#[derive(Error, Debug)]
pub enum OrmError {
    // ── Query errors ─────────────────────────────────────────────────

    /// A query expected exactly one row but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A query expected exactly one row but found several.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    // ── Database errors ──────────────────────────────────────────────

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A NOT NULL, UNIQUE, CHECK or FOREIGN KEY constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// The database could not be opened or the worker thread failed.
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization / IO ───────────────────────────────────────────

    /// A value could not be converted to or from its stored form.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrmError {
    /// Returns `true` for [`OrmError::DoesNotExist`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DoesNotExist(_))
    }

    /// Returns `true` for [`OrmError::IntegrityError`].
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::IntegrityError(_))
    }
}

impl From<ValidationError> for OrmError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, OrmError>`.
pub type OrmResult<T> = Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("This field cannot be null.", "null");
        assert_eq!(err.to_string(), "This field cannot be null.");
    }

    #[test]
    fn test_validation_error_display_field_errors_sorted() {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "phone_number".to_string(),
            vec![ValidationError::new("Bad phone.", "invalid")],
        );
        field_errors.insert(
            "age".to_string(),
            vec![ValidationError::new("Too young.", "min_value")],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert_eq!(err.to_string(), "age: Too young.; phone_number: Bad phone.");
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Too short.", "min_length").with_param("min", "5");
        assert_eq!(err.params.get("min").unwrap(), "5");
    }

    #[test]
    fn test_messages_for() {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "name".to_string(),
            vec![
                ValidationError::new("first", "a"),
                ValidationError::new("second", "b"),
            ],
        );
        let err = ValidationError::with_field_errors(field_errors);
        assert_eq!(err.messages_for("name"), vec!["first", "second"]);
        assert!(err.messages_for("email").is_empty());
        assert!(!err.has_field("email"));
    }

    #[test]
    fn test_orm_error_display() {
        let err = OrmError::DoesNotExist("Quest matching query".into());
        assert_eq!(err.to_string(), "Object does not exist: Quest matching query");
        assert!(err.is_not_found());
        assert!(!err.is_integrity());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: OrmError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: OrmError = ValidationError::new("bad", "invalid").into();
        assert!(matches!(err, OrmError::ValidationError(_)));
    }
}
