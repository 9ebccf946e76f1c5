//! The student register.

use std::sync::LazyLock;

use chrono::NaiveDate;
use query_lab_core::OrmResult;
use query_lab_db::{FieldDef, FieldType, Model, ModelMeta, Row, Value};

/// A university student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Student {
    /// Primary key; `0` until saved.
    pub id: i64,
    /// Faculty number such as `FC5204`.
    pub student_id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth, if known.
    pub birth_date: Option<NaiveDate>,
    /// Unique contact email.
    pub email: String,
}

impl Student {
    /// Creates an unsaved student.
    pub fn new(
        student_id: &str,
        first_name: &str,
        last_name: &str,
        birth_date: Option<NaiveDate>,
        email: &str,
    ) -> Self {
        Self {
            id: 0,
            student_id: student_id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            birth_date,
            email: email.to_string(),
        }
    }
}

impl Model for Student {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("students", "student", "students_student").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("student_id", FieldType::CharField)
                    .max_length(10)
                    .unique(),
                FieldDef::new("first_name", FieldType::CharField).max_length(30),
                FieldDef::new("last_name", FieldType::CharField).max_length(30),
                FieldDef::new("birth_date", FieldType::DateField).nullable(),
                FieldDef::new("email", FieldType::EmailField)
                    .max_length(254)
                    .unique(),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        (self.id != 0).then_some(Value::Int(self.id))
    }

    fn set_pk(&mut self, value: Value) {
        if let Value::Int(id) = value {
            self.id = id;
        }
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("student_id", Value::from(&self.student_id)),
            ("first_name", Value::from(&self.first_name)),
            ("last_name", Value::from(&self.last_name)),
            ("birth_date", Value::from(self.birth_date)),
            ("email", Value::from(&self.email)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            student_id: row.get("student_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            birth_date: row.get("birth_date")?,
            email: row.get("email")?,
        })
    }
}
