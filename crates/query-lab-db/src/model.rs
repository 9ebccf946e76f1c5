//! Model trait and metadata for the ORM.
//!
//! The [`Model`] trait is implemented by hand for every struct that maps to a
//! table. [`ModelMeta`] holds the table name, default ordering and
//! [`FieldDef`]s; it is normally stored in a `LazyLock` static.

use std::collections::HashMap;

use query_lab_core::{OrmError, OrmResult, ValidationError};

use crate::fields::FieldDef;
use crate::query::compiler::OrderBy;
use crate::query::queryset::Manager;
use crate::row::Row;
use crate::value::Value;

/// The core trait for all ORM models.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use query_lab_core::OrmResult;
/// use query_lab_db::fields::{FieldDef, FieldType};
/// use query_lab_db::model::{Model, ModelMeta};
/// use query_lab_db::row::Row;
/// use query_lab_db::value::Value;
///
/// struct Pet {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for Pet {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new("basics", "pet", "basics_pet").fields(vec![
///                 FieldDef::auto_id(),
///                 FieldDef::new("name", FieldType::CharField).max_length(40),
///             ])
///         });
///         &META
///     }
///
///     fn pk(&self) -> Option<Value> {
///         (self.id != 0).then_some(Value::Int(self.id))
///     }
///
///     fn set_pk(&mut self, value: Value) {
///         if let Value::Int(id) = value {
///             self.id = id;
///         }
///     }
///
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", Value::Int(self.id)), ("name", Value::from(&self.name))]
///     }
///
///     fn from_row(row: &Row) -> OrmResult<Self> {
///         Ok(Self { id: row.get("id")?, name: row.get("name")? })
///     }
/// }
///
/// assert_eq!(Pet::table_name(), "basics_pet");
/// ```
pub trait Model: Send + Sync + Sized + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the database table name.
    fn table_name() -> &'static str {
        Self::meta().db_table
    }

    /// Returns the primary key value, or `None` if the instance is unsaved.
    fn pk(&self) -> Option<Value>;

    /// Sets the primary key value (used after INSERT).
    fn set_pk(&mut self, value: Value);

    /// Returns the name of the primary key field.
    fn pk_field_name() -> &'static str {
        "id"
    }

    /// Returns all field name-value pairs for this instance.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Returns field name-value pairs excluding the primary key.
    fn non_pk_field_values(&self) -> Vec<(&'static str, Value)> {
        let pk_name = Self::pk_field_name();
        self.field_values()
            .into_iter()
            .filter(|(name, _)| *name != pk_name)
            .collect()
    }

    /// Constructs a model instance from a database row.
    fn from_row(row: &Row) -> OrmResult<Self>;

    /// Returns the default manager.
    fn objects() -> Manager<Self> {
        Manager::new()
    }
}

/// Metadata about a model.
#[derive(Debug)]
pub struct ModelMeta {
    /// The application label (e.g. "movies").
    pub app_label: &'static str,
    /// The model name in lowercase (e.g. "director").
    pub model_name: &'static str,
    /// The database table name.
    pub db_table: &'static str,
    /// Default ordering for `first`/`last` on unordered querysets.
    pub ordering: Vec<OrderBy>,
    /// Field definitions, in column order.
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Creates metadata with no fields and no ordering.
    pub fn new(app_label: &'static str, model_name: &'static str, db_table: &'static str) -> Self {
        Self {
            app_label,
            model_name,
            db_table,
            ordering: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the field list.
    pub fn fields(mut self, fields: Vec<FieldDef>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the default ordering.
    pub fn ordering(mut self, ordering: Vec<OrderBy>) -> Self {
        self.ordering = ordering;
        self
    }

    /// Looks up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields stored in this model's own table.
    pub fn concrete_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_concrete())
    }

    /// Fields backed by a junction table.
    pub fn many_to_many_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.is_concrete())
    }
}

/// Validates every concrete field of `model` against its [`FieldDef`].
///
/// Checks run per field in this order: nullability, blankness, `max_length`,
/// `choices`, then attached validators. Every failure is collected; the
/// result is a single [`ValidationError`] keyed by field name.
///
/// # Errors
///
/// Returns [`OrmError::ValidationError`] if any field is invalid.
pub fn full_clean<M: Model>(model: &M) -> OrmResult<()> {
    let meta = M::meta();
    let values: HashMap<&str, Value> = model.field_values().into_iter().collect();
    let mut errors: HashMap<String, Vec<ValidationError>> = HashMap::new();

    for field in meta.concrete_fields() {
        if field.primary_key && field.field_type.is_auto() {
            continue;
        }
        let value = values.get(field.name).cloned().unwrap_or(Value::Null);
        let field_errors = clean_field(field, &value)?;
        if !field_errors.is_empty() {
            errors.insert(field.name.to_string(), field_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(OrmError::ValidationError(ValidationError::with_field_errors(
            errors,
        )))
    }
}

fn clean_field(field: &FieldDef, value: &Value) -> OrmResult<Vec<ValidationError>> {
    let mut errors = Vec::new();

    if value.is_null() {
        if !field.null && !field.auto_now && !field.auto_now_add {
            errors.push(ValidationError::new("This field cannot be null.", "null"));
        }
        return Ok(errors);
    }

    if let Value::String(s) = value {
        if s.is_empty() && !field.blank {
            errors.push(ValidationError::new("This field cannot be blank.", "blank"));
            return Ok(errors);
        }
        if let Some(max) = field.max_length {
            let len = s.chars().count();
            if len > max {
                errors.push(
                    ValidationError::new(
                        format!("Ensure this value has at most {max} characters (it has {len})."),
                        "max_length",
                    )
                    .with_param("limit_value", max.to_string()),
                );
            }
        }
    }

    if field.choices.is_some() && field.choice_label(value).is_none() {
        errors.push(ValidationError::new(
            format!("Value {value} is not a valid choice."),
            "invalid_choice",
        ));
    }

    for validator in &field.validators {
        match validator.validate(value) {
            Ok(()) => {}
            Err(OrmError::ValidationError(e)) => errors.push(e),
            Err(other) => return Err(other),
        }
    }

    Ok(errors)
}
