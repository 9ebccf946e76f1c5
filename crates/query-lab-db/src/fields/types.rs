//! Field type definitions for the ORM.
//!
//! Each [`FieldType`] variant decides the SQLite column type of a field, and
//! [`FieldDef`] carries everything else the schema generator and
//! [`full_clean`](crate::model::full_clean) need to know about one column.

use crate::validators::Validator;
use crate::value::Value;

/// The type of a model field, determining its SQL column type and behavior.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// Auto-incrementing integer primary key.
    AutoField,
    /// Auto-incrementing 64-bit integer primary key.
    BigAutoField,
    /// Variable-length string, usually with a max length.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// Signed integer.
    IntegerField,
    /// Small signed integer.
    SmallIntegerField,
    /// Integer that must be zero or more.
    PositiveIntegerField,
    /// Small integer that must be zero or more.
    PositiveSmallIntegerField,
    /// 64-bit floating-point number.
    FloatField,
    /// Fixed-precision decimal, stored as REAL and rounded on write.
    DecimalField {
        /// Maximum total digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// Boolean, stored as 0/1.
    BooleanField,
    /// Date without time.
    DateField,
    /// Date and time.
    DateTimeField,
    /// Email address.
    EmailField,
    /// URL.
    UrlField,
    /// Many-to-one relationship.
    ForeignKey {
        /// The referenced table.
        to: String,
        /// Behavior when the referenced row is deleted.
        on_delete: OnDelete,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
    /// Many-to-many relationship through a junction table.
    ManyToManyField {
        /// The referenced table.
        to: String,
        /// The junction table.
        through: String,
        /// Junction column pointing at the owning model.
        source: String,
        /// Junction column pointing at the referenced model.
        target: String,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
}

impl FieldType {
    /// Returns the SQLite column type for this field.
    pub fn sql_type(&self, max_length: Option<usize>) -> String {
        match self {
            Self::AutoField
            | Self::BigAutoField
            | Self::IntegerField
            | Self::SmallIntegerField
            | Self::PositiveIntegerField
            | Self::PositiveSmallIntegerField
            | Self::ForeignKey { .. } => "INTEGER".to_string(),
            Self::CharField | Self::EmailField | Self::UrlField => match max_length {
                Some(n) => format!("VARCHAR({n})"),
                None => "TEXT".to_string(),
            },
            Self::TextField | Self::ManyToManyField { .. } => "TEXT".to_string(),
            Self::FloatField | Self::DecimalField { .. } => "REAL".to_string(),
            Self::BooleanField => "BOOLEAN".to_string(),
            Self::DateField => "DATE".to_string(),
            Self::DateTimeField => "DATETIME".to_string(),
        }
    }

    /// Returns `true` for the auto-incrementing primary key types.
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::AutoField | Self::BigAutoField)
    }

    /// Returns `true` for the unsigned integer types.
    pub const fn is_positive(&self) -> bool {
        matches!(
            self,
            Self::PositiveIntegerField | Self::PositiveSmallIntegerField
        )
    }
}

/// Behavior when a referenced row is deleted (ON DELETE action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OnDelete {
    /// Delete all related rows.
    Cascade,
    /// Refuse the deletion while related rows exist.
    Protect,
    /// Set the foreign key to NULL.
    SetNull,
    /// Set the foreign key to its column default.
    SetDefault,
    /// Take no action.
    DoNothing,
}

impl OnDelete {
    /// Returns the SQL action keyword.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Protect => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::DoNothing => "NO ACTION",
        }
    }
}

/// Complete definition of a model field.
///
/// Built with chained setters:
///
/// ```
/// use query_lab_db::fields::{FieldDef, FieldType};
///
/// let field = FieldDef::new("email", FieldType::EmailField).unique().max_length(254);
/// assert!(field.unique);
/// assert_eq!(field.max_length, Some(254));
/// ```
#[derive(Debug)]
pub struct FieldDef {
    /// The struct attribute name of this field.
    pub name: &'static str,
    /// The database column name.
    pub column: String,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Whether an empty string is allowed.
    pub blank: bool,
    /// Column default for rows inserted without this field.
    pub default: Option<Value>,
    /// Whether a UNIQUE constraint is applied.
    pub unique: bool,
    /// Maximum character length.
    pub max_length: Option<usize>,
    /// Allowed values as (value, label) pairs.
    pub choices: Option<Vec<(Value, String)>>,
    /// Validators run by `full_clean`.
    pub validators: Vec<Box<dyn Validator>>,
    /// Stamp with the current time on every save.
    pub auto_now: bool,
    /// Stamp with the current time on insert.
    pub auto_now_add: bool,
}

impl FieldDef {
    /// Creates a non-null field with no constraints.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            column: name.to_string(),
            field_type,
            primary_key: false,
            null: false,
            blank: false,
            default: None,
            unique: false,
            max_length: None,
            choices: None,
            validators: Vec::new(),
            auto_now: false,
            auto_now_add: false,
        }
    }

    /// Shorthand for the conventional `id` auto primary key.
    pub fn auto_id() -> Self {
        Self::new("id", FieldType::BigAutoField).primary_key()
    }

    /// Overrides the column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Marks this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL.
    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Allows the empty string.
    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Adds a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the maximum character length.
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Sets the column default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts values to the given `(value, label)` pairs.
    pub fn choices<V, L>(mut self, choices: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        );
        self
    }

    /// Attaches a validator.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Stamps the current time on every save.
    pub fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self
    }

    /// Stamps the current time on insert only.
    pub fn auto_now_add(mut self) -> Self {
        self.auto_now_add = true;
        self
    }

    /// Returns `true` for fields backed by a column in the model's own table.
    pub const fn is_concrete(&self) -> bool {
        !matches!(self.field_type, FieldType::ManyToManyField { .. })
    }

    /// Returns the label for `value` if this field has choices.
    pub fn choice_label(&self, value: &Value) -> Option<&str> {
        self.choices
            .as_ref()?
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, label)| label.as_str())
    }

    /// Converts a value to its storage form.
    ///
    /// Decimal fields round to `decimal_places`; float fields widen integers.
    pub fn get_prep_value(&self, value: Value) -> Value {
        match (&self.field_type, value) {
            (FieldType::DecimalField { decimal_places, .. }, v @ (Value::Float(_) | Value::Int(_))) => {
                let scale = 10_f64.powi(i32::try_from(*decimal_places).unwrap_or(i32::MAX));
                v.as_float()
                    .map_or(Value::Null, |f| Value::Float((f * scale).round() / scale))
            }
            (FieldType::FloatField, Value::Int(i)) => Value::Float(i as f64),
            (_, v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::MaxValueValidator;

    #[test]
    fn test_builder_defaults() {
        let f = FieldDef::new("title", FieldType::CharField);
        assert_eq!(f.column, "title");
        assert!(!f.null && !f.blank && !f.unique && !f.primary_key);
        assert!(f.validators.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let f = FieldDef::new("rating", FieldType::FloatField)
            .column("score")
            .nullable()
            .default(0.0)
            .validator(MaxValueValidator::new(10.0));
        assert_eq!(f.column, "score");
        assert!(f.null);
        assert_eq!(f.default, Some(Value::Float(0.0)));
        assert_eq!(f.validators.len(), 1);
    }

    #[test]
    fn test_sql_types() {
        assert_eq!(FieldType::CharField.sql_type(Some(40)), "VARCHAR(40)");
        assert_eq!(FieldType::CharField.sql_type(None), "TEXT");
        assert_eq!(
            FieldType::DecimalField {
                max_digits: 10,
                decimal_places: 2
            }
            .sql_type(None),
            "REAL"
        );
        assert_eq!(FieldType::BigAutoField.sql_type(None), "INTEGER");
    }

    #[test]
    fn test_decimal_prep_value_rounds() {
        let f = FieldDef::new(
            "price",
            FieldType::DecimalField {
                max_digits: 10,
                decimal_places: 2,
            },
        );
        assert_eq!(f.get_prep_value(Value::Float(19.999)), Value::Float(20.0));
        assert_eq!(f.get_prep_value(Value::Float(1.234)), Value::Float(1.23));
        assert_eq!(f.get_prep_value(Value::Int(5)), Value::Float(5.0));
        assert_eq!(f.get_prep_value(Value::Null), Value::Null);
    }

    #[test]
    fn test_float_prep_value_widens() {
        let f = FieldDef::new("weight", FieldType::FloatField);
        assert_eq!(f.get_prep_value(Value::Int(200)), Value::Float(200.0));
    }

    #[test]
    fn test_choice_label() {
        let f = FieldDef::new("genre", FieldType::CharField).choices([("Action", "Action"), ("Other", "Other")]);
        assert_eq!(f.choice_label(&Value::from("Other")), Some("Other"));
        assert_eq!(f.choice_label(&Value::from("Horror")), None);
    }

    #[test]
    fn test_on_delete_sql() {
        assert_eq!(OnDelete::Cascade.as_sql(), "CASCADE");
        assert_eq!(OnDelete::SetNull.as_sql(), "SET NULL");
        assert_eq!(OnDelete::Protect.as_sql(), "RESTRICT");
    }

    #[test]
    fn test_many_to_many_is_not_concrete() {
        let f = FieldDef::new(
            "actors",
            FieldType::ManyToManyField {
                to: "movies_actor".into(),
                through: "movies_movie_actors".into(),
                source: "movie_id".into(),
                target: "actor_id".into(),
                related_name: None,
            },
        );
        assert!(!f.is_concrete());
    }
}
