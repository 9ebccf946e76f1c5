//! Customer profiles, products and orders.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use query_lab_core::OrmResult;
use query_lab_db::fields::boolean_choice_field;
use query_lab_db::validators::{MinLengthValidator, MinValueValidator};
use query_lab_db::{
    Expression, FieldDef, FieldType, Lookup, Manager, ManyToMany, Model, ModelMeta, OnDelete,
    OrderBy, QuerySet, Relation, Row, Value, Q,
};

/// Orders placed by a profile.
pub const PROFILE_ORDERS: Relation = Relation::Reverse {
    table: "shop_order",
    fk: "profile_id",
};

/// Products in an order.
pub const ORDER_PRODUCTS: ManyToMany = ManyToMany::new(
    "shop_order",
    "shop_product",
    "shop_order_products",
    "order_id",
    "product_id",
);

fn money(name: &'static str) -> FieldDef {
    FieldDef::new(
        name,
        FieldType::DecimalField {
            max_digits: 10,
            decimal_places: 2,
        },
    )
    .validator(MinValueValidator::new(0.01))
}

fn created() -> FieldDef {
    FieldDef::new("creation_date", FieldType::DateTimeField).auto_now_add()
}

// ── Profile ────────────────────────────────────────────────────────────

/// A customer profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub is_active: bool,
    pub creation_date: Option<NaiveDateTime>,
}

impl Profile {
    /// An active, unsaved profile.
    pub fn new(full_name: &str, email: &str, phone_number: &str, address: &str) -> Self {
        Self {
            id: 0,
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone_number: phone_number.to_string(),
            address: address.to_string(),
            is_active: true,
            creation_date: None,
        }
    }
}

impl Model for Profile {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("shop", "profile", "shop_profile").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("full_name", FieldType::CharField)
                    .max_length(100)
                    .validator(MinLengthValidator::new(2)),
                FieldDef::new("email", FieldType::EmailField).max_length(254),
                FieldDef::new("phone_number", FieldType::CharField).max_length(15),
                FieldDef::new("address", FieldType::TextField),
                FieldDef::new("is_active", FieldType::BooleanField).default(true),
                created(),
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
            ("full_name", Value::from(&self.full_name)),
            ("email", Value::from(&self.email)),
            ("phone_number", Value::from(&self.phone_number)),
            ("address", Value::from(&self.address)),
            ("is_active", Value::Bool(self.is_active)),
            ("creation_date", Value::from(self.creation_date)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            phone_number: row.get("phone_number")?,
            address: row.get("address")?,
            is_active: row.get("is_active")?,
            creation_date: row.get("creation_date")?,
        })
    }
}

/// Custom queries on the profile table.
pub trait ProfileManager {
    /// Profiles with more than two orders, annotated with `count_orders`,
    /// most orders first.
    fn get_regular_customers(&self) -> QuerySet<Profile>;
}

impl ProfileManager for Manager<Profile> {
    fn get_regular_customers(&self) -> QuerySet<Profile> {
        self.all()
            .annotate("count_orders", Expression::related_count([PROFILE_ORDERS]))
            .filter(Q::filter("count_orders", Lookup::Gt(Value::Int(2))))
            .order_by(vec![OrderBy::desc("count_orders")])
    }
}

// ── Product ────────────────────────────────────────────────────────────

/// A product in stock.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub in_stock: i64,
    pub is_available: bool,
    pub creation_date: Option<NaiveDateTime>,
}

impl Product {
    /// An available, unsaved product.
    pub fn new(name: &str, description: &str, price: f64, in_stock: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            description: description.to_string(),
            price,
            in_stock,
            is_available: true,
            creation_date: None,
        }
    }
}

impl Model for Product {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("shop", "product", "shop_product").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField).max_length(100),
                FieldDef::new("description", FieldType::TextField),
                money("price"),
                FieldDef::new("in_stock", FieldType::PositiveIntegerField),
                boolean_choice_field("is_available"),
                created(),
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
            ("description", Value::from(&self.description)),
            ("price", Value::Float(self.price)),
            ("in_stock", Value::Int(self.in_stock)),
            ("is_available", Value::Bool(self.is_available)),
            ("creation_date", Value::from(self.creation_date)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            price: row.get("price")?,
            in_stock: row.get("in_stock")?,
            is_available: row.get("is_available")?,
            creation_date: row.get("creation_date")?,
        })
    }
}

// ── Order ──────────────────────────────────────────────────────────────

/// An order placed by a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub profile_id: i64,
    pub total_price: f64,
    pub creation_date: Option<NaiveDateTime>,
    pub is_completed: bool,
}

impl Order {
    /// An open, unsaved order.
    pub fn new(profile_id: i64, total_price: f64) -> Self {
        Self {
            id: 0,
            profile_id,
            total_price,
            creation_date: None,
            is_completed: false,
        }
    }
}

impl Model for Order {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("shop", "order", "shop_order").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new(
                    "profile",
                    FieldType::ForeignKey {
                        to: "shop_profile".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: None,
                    },
                )
                .column("profile_id"),
                FieldDef::new(
                    "products",
                    FieldType::ManyToManyField {
                        to: ORDER_PRODUCTS.table.into(),
                        through: ORDER_PRODUCTS.through.into(),
                        source: ORDER_PRODUCTS.source.into(),
                        target: ORDER_PRODUCTS.target.into(),
                        related_name: None,
                    },
                ),
                money("total_price"),
                created(),
                FieldDef::new("is_completed", FieldType::BooleanField).default(false),
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
            ("profile", Value::Int(self.profile_id)),
            ("total_price", Value::Float(self.total_price)),
            ("creation_date", Value::from(self.creation_date)),
            ("is_completed", Value::Bool(self.is_completed)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            profile_id: row.get("profile_id")?,
            total_price: row.get("total_price")?,
            creation_date: row.get("creation_date")?,
            is_completed: row.get("is_completed")?,
        })
    }
}
