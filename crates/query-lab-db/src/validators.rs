//! Field validators.
//!
//! Validators are attached to a [`FieldDef`](crate::fields::FieldDef) and run
//! by [`full_clean`](crate::model::full_clean). `NULL` values are never passed
//! to them; nullability is checked separately.

use std::fmt;
use std::sync::LazyLock;

use query_lab_core::{OrmError, OrmResult, ValidationError};
use regex::Regex;

use crate::value::Value;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9\-]+(\.[a-zA-Z0-9\-]+)*\.[a-zA-Z]{2,}$")
        .expect("valid regex")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?|ftps?)://([a-zA-Z0-9\-]+\.)+[a-zA-Z]{2,}(:\d+)?(/[^\s]*)?$")
        .expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+359\d{9}$").expect("valid regex"));

/// A single constraint on a field value.
///
/// # Examples
///
/// ```
/// use query_lab_db::validators::{Validator, MaxLengthValidator};
/// use query_lab_db::value::Value;
///
/// let v = MaxLengthValidator::new(5);
/// assert!(v.validate(&Value::from("hi")).is_ok());
/// assert!(v.validate(&Value::from("toolong")).is_err());
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value, returning an error if invalid.
    fn validate(&self, value: &Value) -> OrmResult<()>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

fn invalid(message: impl Into<String>, code: &str) -> OrmError {
    OrmError::ValidationError(ValidationError::new(message, code))
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_float()
}

/// Upper bound on string length, in characters.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    /// The maximum allowed length.
    pub max_length: usize,
}

impl MaxLengthValidator {
    /// Creates a new `MaxLengthValidator`.
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Validator for MaxLengthValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        if let Value::String(s) = value {
            let len = s.chars().count();
            if len > self.max_length {
                return Err(invalid(
                    format!(
                        "Ensure this value has at most {} characters (it has {len}).",
                        self.max_length
                    ),
                    "max_length",
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MaxLengthValidator"
    }
}

/// Lower bound on string length, in characters.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
    /// The minimum required length.
    pub min_length: usize,
}

impl MinLengthValidator {
    /// Creates a new `MinLengthValidator`.
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Validator for MinLengthValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        if let Value::String(s) = value {
            let len = s.chars().count();
            if len < self.min_length {
                return Err(invalid(
                    format!(
                        "Ensure this value has at least {} characters (it has {len}).",
                        self.min_length
                    ),
                    "min_length",
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MinLengthValidator"
    }
}

/// Upper bound on a numeric value.
#[derive(Debug, Clone)]
pub struct MaxValueValidator {
    /// The maximum allowed value.
    pub max_value: f64,
    message: Option<String>,
}

impl MaxValueValidator {
    /// Creates a new `MaxValueValidator`.
    pub const fn new(max_value: f64) -> Self {
        Self {
            max_value,
            message: None,
        }
    }

    /// Replaces the default error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator for MaxValueValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        match numeric(value) {
            Some(n) if n > self.max_value => Err(invalid(
                self.message.clone().unwrap_or_else(|| {
                    format!(
                        "Ensure this value is less than or equal to {}.",
                        self.max_value
                    )
                }),
                "max_value",
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MaxValueValidator"
    }
}

/// Lower bound on a numeric value.
#[derive(Debug, Clone)]
pub struct MinValueValidator {
    /// The minimum required value.
    pub min_value: f64,
    message: Option<String>,
}

impl MinValueValidator {
    /// Creates a new `MinValueValidator`.
    pub const fn new(min_value: f64) -> Self {
        Self {
            min_value,
            message: None,
        }
    }

    /// Replaces the default error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator for MinValueValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        match numeric(value) {
            Some(n) if n < self.min_value => Err(invalid(
                self.message.clone().unwrap_or_else(|| {
                    format!(
                        "Ensure this value is greater than or equal to {}.",
                        self.min_value
                    )
                }),
                "min_value",
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MinValueValidator"
    }
}

/// Requires a string to match a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: Regex,
    message: String,
}

impl RegexValidator {
    /// Compiles `pattern` into a validator.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ConfigurationError`] if the pattern does not compile.
    pub fn new(pattern: &str, message: impl Into<String>) -> OrmResult<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| OrmError::ConfigurationError(format!("Invalid regex: {e}")))?;
        Ok(Self {
            regex,
            message: message.into(),
        })
    }

    /// Wraps an already compiled regex.
    pub fn from_regex(regex: Regex, message: impl Into<String>) -> Self {
        Self {
            regex,
            message: message.into(),
        }
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        match value {
            Value::String(s) if !self.regex.is_match(s) => Err(invalid(&*self.message, "invalid")),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "RegexValidator"
    }
}

/// Requires a plausible `local@domain.tld` address.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    message: String,
}

impl EmailValidator {
    /// Creates a validator with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new("Enter a valid email address.")
    }
}

impl Validator for EmailValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        match value {
            Value::String(s) if !EMAIL_RE.is_match(s) => Err(invalid(&*self.message, "invalid")),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "EmailValidator"
    }
}

/// Requires an absolute http(s)/ftp(s) URL with a dotted host name.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    message: String,
}

impl UrlValidator {
    /// Creates a validator with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new("Enter a valid URL.")
    }
}

impl Validator for UrlValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        match value {
            Value::String(s) if !URL_RE.is_match(s) => Err(invalid(&*self.message, "invalid")),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "UrlValidator"
    }
}

/// Accepts only letters and whitespace.
#[derive(Debug, Clone)]
pub struct NameValidator {
    message: String,
}

impl NameValidator {
    /// Creates a validator with a custom error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message reported on failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for NameValidator {
    fn default() -> Self {
        Self::new("Name can only contain letters and spaces")
    }
}

impl Validator for NameValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        match value {
            Value::String(s) if !s.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) => {
                Err(invalid(&*self.message, "invalid_name"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "NameValidator"
    }
}

/// Accepts Bulgarian mobile numbers: `+359` followed by nine digits.
#[derive(Debug, Clone)]
pub struct PhoneNumberValidator {
    message: String,
}

impl PhoneNumberValidator {
    /// Creates a validator with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Validator for PhoneNumberValidator {
    fn validate(&self, value: &Value) -> OrmResult<()> {
        match value {
            Value::String(s) if !PHONE_RE.is_match(s) => {
                Err(invalid(&*self.message, "invalid_phone"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "PhoneNumberValidator"
    }
}
