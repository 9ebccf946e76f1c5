//! Single-table models without relations.

use std::sync::LazyLock;

use chrono::NaiveDate;
use query_lab_core::OrmResult;
use query_lab_db::{FieldDef, FieldType, Model, ModelMeta, Row, Value};

use crate::choices::choice_enum;

fn money(name: &'static str) -> FieldDef {
    FieldDef::new(
        name,
        FieldType::DecimalField {
            max_digits: 10,
            decimal_places: 2,
        },
    )
}

fn id_value(id: i64) -> Option<Value> {
    (id != 0).then_some(Value::Int(id))
}

// ── Pet ────────────────────────────────────────────────────────────────

/// A pet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub species: String,
}

impl Model for Pet {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("basics", "pet", "basics_pet").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField).max_length(40),
                FieldDef::new("species", FieldType::CharField).max_length(40),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        id_value(self.id)
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
            ("species", Value::from(&self.species)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            species: row.get("species")?,
        })
    }
}

// ── Artifact ───────────────────────────────────────────────────────────

/// An artifact of some age, possibly magical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    pub id: i64,
    pub name: String,
    pub origin: String,
    pub age: i64,
    pub description: String,
    pub is_magical: bool,
}

impl Model for Artifact {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("basics", "artifact", "basics_artifact").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField).max_length(70),
                FieldDef::new("origin", FieldType::CharField).max_length(70),
                FieldDef::new("age", FieldType::PositiveIntegerField),
                FieldDef::new("description", FieldType::TextField),
                FieldDef::new("is_magical", FieldType::BooleanField).default(false),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        id_value(self.id)
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
            ("origin", Value::from(&self.origin)),
            ("age", Value::Int(self.age)),
            ("description", Value::from(&self.description)),
            ("is_magical", Value::Bool(self.is_magical)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            origin: row.get("origin")?,
            age: row.get("age")?,
            description: row.get("description")?,
            is_magical: row.get("is_magical")?,
        })
    }
}

// ── Location ───────────────────────────────────────────────────────────

/// A settlement and its population.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub population: i64,
    pub description: String,
    pub is_capital: bool,
}

impl Location {
    /// Creates an unsaved, non-capital location.
    pub fn new(name: &str, region: &str, population: i64, description: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            region: region.to_string(),
            population,
            description: description.to_string(),
            is_capital: false,
        }
    }
}

impl Model for Location {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("basics", "location", "basics_location").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField).max_length(100),
                FieldDef::new("region", FieldType::CharField).max_length(50),
                FieldDef::new("population", FieldType::PositiveIntegerField),
                FieldDef::new("description", FieldType::TextField),
                FieldDef::new("is_capital", FieldType::BooleanField).default(false),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        id_value(self.id)
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
            ("region", Value::from(&self.region)),
            ("population", Value::Int(self.population)),
            ("description", Value::from(&self.description)),
            ("is_capital", Value::Bool(self.is_capital)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            region: row.get("region")?,
            population: row.get("population")?,
            description: row.get("description")?,
            is_capital: row.get("is_capital")?,
        })
    }
}

// ── Car ────────────────────────────────────────────────────────────────

/// A car for sale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Car {
    pub id: i64,
    pub model: String,
    pub year: i64,
    pub color: String,
    pub price: f64,
    pub price_with_discount: f64,
}

impl Car {
    /// Creates an unsaved car with no discount applied.
    pub fn new(model: &str, year: i64, color: &str, price: f64) -> Self {
        Self {
            id: 0,
            model: model.to_string(),
            year,
            color: color.to_string(),
            price,
            price_with_discount: 0.0,
        }
    }
}

impl Model for Car {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("basics", "car", "basics_car").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("model", FieldType::CharField).max_length(40),
                FieldDef::new("year", FieldType::PositiveIntegerField),
                FieldDef::new("color", FieldType::CharField).max_length(40),
                money("price"),
                money("price_with_discount").default(0.0),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        id_value(self.id)
    }

    fn set_pk(&mut self, value: Value) {
        if let Value::Int(id) = value {
            self.id = id;
        }
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("model", Value::from(&self.model)),
            ("year", Value::Int(self.year)),
            ("color", Value::from(&self.color)),
            ("price", Value::Float(self.price)),
            ("price_with_discount", Value::Float(self.price_with_discount)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            model: row.get("model")?,
            year: row.get("year")?,
            color: row.get("color")?,
            price: row.get("price")?,
            price_with_discount: row.get("price_with_discount")?,
        })
    }
}

// ── Task ───────────────────────────────────────────────────────────────

/// A to-do item with a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub is_finished: bool,
}

impl Task {
    /// Creates an unsaved, unfinished task.
    pub fn new(title: &str, description: &str, due_date: NaiveDate) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            description: description.to_string(),
            due_date,
            is_finished: false,
        }
    }
}

impl Model for Task {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("basics", "task", "basics_task").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("title", FieldType::CharField).max_length(25),
                FieldDef::new("description", FieldType::TextField),
                FieldDef::new("due_date", FieldType::DateField),
                FieldDef::new("is_finished", FieldType::BooleanField).default(false),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        id_value(self.id)
    }

    fn set_pk(&mut self, value: Value) {
        if let Value::Int(id) = value {
            self.id = id;
        }
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("title", Value::from(&self.title)),
            ("description", Value::from(&self.description)),
            ("due_date", Value::Date(self.due_date)),
            ("is_finished", Value::Bool(self.is_finished)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: row.get("due_date")?,
            is_finished: row.get("is_finished")?,
        })
    }
}

// ── HotelRoom ──────────────────────────────────────────────────────────

choice_enum! {
    /// The class of a hotel room.
    RoomType {
        Standard => "Standard",
        Deluxe => "Deluxe",
        Suite => "Suite",
    }
}

/// A bookable hotel room.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelRoom {
    pub id: i64,
    pub room_number: i64,
    pub room_type: RoomType,
    pub capacity: i64,
    pub amenities: String,
    pub price_per_night: f64,
    pub is_reserved: bool,
}

impl HotelRoom {
    /// Creates an unsaved, free room.
    pub fn new(
        room_number: i64,
        room_type: RoomType,
        capacity: i64,
        amenities: &str,
        price_per_night: f64,
    ) -> Self {
        Self {
            id: 0,
            room_number,
            room_type,
            capacity,
            amenities: amenities.to_string(),
            price_per_night,
            is_reserved: false,
        }
    }
}

impl Model for HotelRoom {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("basics", "hotelroom", "basics_hotelroom").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("room_number", FieldType::PositiveIntegerField).unique(),
                FieldDef::new("room_type", FieldType::CharField)
                    .max_length(10)
                    .choices(RoomType::choices()),
                FieldDef::new("capacity", FieldType::PositiveIntegerField),
                FieldDef::new("amenities", FieldType::TextField),
                money("price_per_night"),
                FieldDef::new("is_reserved", FieldType::BooleanField).default(false),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        id_value(self.id)
    }

    fn set_pk(&mut self, value: Value) {
        if let Value::Int(id) = value {
            self.id = id;
        }
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("room_number", Value::Int(self.room_number)),
            ("room_type", Value::from(self.room_type)),
            ("capacity", Value::Int(self.capacity)),
            ("amenities", Value::from(&self.amenities)),
            ("price_per_night", Value::Float(self.price_per_night)),
            ("is_reserved", Value::Bool(self.is_reserved)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            room_number: row.get("room_number")?,
            room_type: row.get("room_type")?,
            capacity: row.get("capacity")?,
            amenities: row.get("amenities")?,
            price_per_night: row.get("price_per_night")?,
            is_reserved: row.get("is_reserved")?,
        })
    }
}
