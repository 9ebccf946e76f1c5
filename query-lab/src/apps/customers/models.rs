//! A customer record guarded by field validators.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use query_lab_core::OrmResult;
use query_lab_db::fields::{unix_timestamp_field, UnixTimestamp};
use query_lab_db::validators::{
    EmailValidator, MinValueValidator, NameValidator, PhoneNumberValidator, UrlValidator,
};
use query_lab_db::{FieldDef, FieldType, Model, ModelMeta, Row, Value};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub email: String,
    pub phone_number: String,
    pub website_url: String,
    /// Stored as whole seconds since the epoch.
    pub registered_at: Option<NaiveDateTime>,
}

impl Customer {
    pub fn new(name: &str, age: i64, email: &str, phone_number: &str, website_url: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            age,
            email: email.to_string(),
            phone_number: phone_number.to_string(),
            website_url: website_url.to_string(),
            registered_at: None,
        }
    }
}

impl Model for Customer {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("customers", "customer", "customers_customer").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField)
                    .max_length(100)
                    .validator(NameValidator::default()),
                FieldDef::new("age", FieldType::PositiveIntegerField).validator(
                    MinValueValidator::new(18.0)
                        .with_message("Age must be greater than or equal to 18"),
                ),
                FieldDef::new("email", FieldType::EmailField)
                    .max_length(254)
                    .validator(EmailValidator::new("Enter a valid email address")),
                FieldDef::new("phone_number", FieldType::CharField)
                    .max_length(13)
                    .validator(PhoneNumberValidator::new(
                        "Phone number must start with '+359' followed by 9 digits",
                    )),
                FieldDef::new("website_url", FieldType::UrlField)
                    .max_length(200)
                    .validator(UrlValidator::new("Enter a valid URL")),
                unix_timestamp_field("registered_at"),
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
            ("name", Value::from(&self.name)),
            ("age", Value::Int(self.age)),
            ("email", Value::from(&self.email)),
            ("phone_number", Value::from(&self.phone_number)),
            ("website_url", Value::from(&self.website_url)),
            ("registered_at", UnixTimestamp::to_db(self.registered_at)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            email: row.get("email")?,
            phone_number: row.get("phone_number")?,
            website_url: row.get("website_url")?,
            registered_at: UnixTimestamp::from_db(row, "registered_at")?,
        })
    }
}
