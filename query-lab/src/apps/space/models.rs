//! Astronauts, spacecraft and missions.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use query_lab_core::OrmResult;
use query_lab_db::validators::{MinLengthValidator, MinValueValidator, RegexValidator};
use query_lab_db::{
    Expression, FieldDef, FieldType, Manager, ManyToMany, Model, ModelMeta, OnDelete, OrderBy,
    QuerySet, Relation, Row, Value,
};
use regex::Regex;

use crate::choices::choice_enum;

static DIGITS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Missions flown with a spacecraft.
pub const SPACECRAFT_MISSIONS: Relation = Relation::Reverse {
    table: "space_mission",
    fk: "spacecraft_id",
};

/// Missions commanded by an astronaut.
pub const COMMANDED_MISSIONS: Relation = Relation::Reverse {
    table: "space_mission",
    fk: "commander_id",
};

/// The spacecraft of a mission.
pub const MISSION_SPACECRAFT: Relation = Relation::Forward {
    table: "space_spacecraft",
    fk: "spacecraft_id",
};

/// The commander of a mission.
pub const MISSION_COMMANDER: Relation = Relation::Forward {
    table: "space_astronaut",
    fk: "commander_id",
};

/// The astronauts flying a mission.
pub const CREW: ManyToMany = ManyToMany::new(
    "space_mission",
    "space_astronaut",
    "space_mission_astronauts",
    "mission_id",
    "astronaut_id",
);

fn name_field() -> FieldDef {
    FieldDef::new("name", FieldType::CharField)
        .max_length(120)
        .validator(MinLengthValidator::new(2))
}

fn updated_at() -> FieldDef {
    FieldDef::new("updated_at", FieldType::DateTimeField).auto_now()
}

// ── Astronaut ──────────────────────────────────────────────────────────

/// An astronaut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Astronaut {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub is_active: bool,
    pub date_of_birth: Option<NaiveDate>,
    pub spacewalks: i64,
    pub updated_at: Option<NaiveDateTime>,
}

impl Astronaut {
    /// An active astronaut with no spacewalks.
    pub fn new(name: &str, phone_number: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            phone_number: phone_number.to_string(),
            is_active: true,
            date_of_birth: None,
            spacewalks: 0,
            updated_at: None,
        }
    }
}

impl Model for Astronaut {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("space", "astronaut", "space_astronaut").fields(vec![
                FieldDef::auto_id(),
                name_field(),
                FieldDef::new("phone_number", FieldType::CharField)
                    .max_length(15)
                    .unique()
                    .validator(RegexValidator::from_regex(
                        DIGITS_ONLY.clone(),
                        "Phone number must contain only digits",
                    )),
                FieldDef::new("is_active", FieldType::BooleanField).default(true),
                FieldDef::new("date_of_birth", FieldType::DateField).nullable(),
                FieldDef::new("spacewalks", FieldType::PositiveIntegerField).default(0),
                updated_at(),
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
            ("phone_number", Value::from(&self.phone_number)),
            ("is_active", Value::Bool(self.is_active)),
            ("date_of_birth", Value::from(self.date_of_birth)),
            ("spacewalks", Value::Int(self.spacewalks)),
            ("updated_at", Value::from(self.updated_at)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            phone_number: row.get("phone_number")?,
            is_active: row.get("is_active")?,
            date_of_birth: row.get("date_of_birth")?,
            spacewalks: row.get("spacewalks")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Custom queries on the astronaut table.
pub trait AstronautManager {
    /// Every astronaut annotated with `missions_count`, busiest first, then
    /// by phone number.
    fn get_astronauts_by_missions_count(&self) -> QuerySet<Astronaut>;
}

impl AstronautManager for Manager<Astronaut> {
    fn get_astronauts_by_missions_count(&self) -> QuerySet<Astronaut> {
        self.all()
            .annotate("missions_count", Expression::related_count([CREW.reverse()]))
            .order_by(vec![
                OrderBy::desc("missions_count"),
                OrderBy::asc("phone_number"),
            ])
    }
}

// ── Spacecraft ─────────────────────────────────────────────────────────

/// A spacecraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Spacecraft {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub capacity: i64,
    pub weight: f64,
    pub launch_date: NaiveDate,
    pub updated_at: Option<NaiveDateTime>,
}

impl Spacecraft {
    pub fn new(
        name: &str,
        manufacturer: &str,
        capacity: i64,
        weight: f64,
        launch_date: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            manufacturer: manufacturer.to_string(),
            capacity,
            weight,
            launch_date,
            updated_at: None,
        }
    }
}

impl Model for Spacecraft {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("space", "spacecraft", "space_spacecraft").fields(vec![
                FieldDef::auto_id(),
                name_field(),
                FieldDef::new("manufacturer", FieldType::CharField).max_length(100),
                FieldDef::new("capacity", FieldType::PositiveSmallIntegerField)
                    .validator(MinValueValidator::new(1.0)),
                FieldDef::new("weight", FieldType::FloatField)
                    .validator(MinValueValidator::new(0.0)),
                FieldDef::new("launch_date", FieldType::DateField),
                updated_at(),
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
            ("manufacturer", Value::from(&self.manufacturer)),
            ("capacity", Value::Int(self.capacity)),
            ("weight", Value::Float(self.weight)),
            ("launch_date", Value::Date(self.launch_date)),
            ("updated_at", Value::from(self.updated_at)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            manufacturer: row.get("manufacturer")?,
            capacity: row.get("capacity")?,
            weight: row.get("weight")?,
            launch_date: row.get("launch_date")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

// ── Mission ────────────────────────────────────────────────────────────

choice_enum! {
    /// Where a mission stands.
    MissionStatus {
        Planned => "Planned",
        Ongoing => "Ongoing",
        Completed => "Completed",
    }
}

/// A space mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: MissionStatus,
    pub launch_date: NaiveDate,
    pub updated_at: Option<NaiveDateTime>,
    pub spacecraft_id: i64,
    pub commander_id: Option<i64>,
}

impl Mission {
    /// A planned mission with no commander.
    pub fn new(name: &str, launch_date: NaiveDate, spacecraft_id: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            description: None,
            status: MissionStatus::Planned,
            launch_date,
            updated_at: None,
            spacecraft_id,
            commander_id: None,
        }
    }
}

impl Model for Mission {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("space", "mission", "space_mission").fields(vec![
                FieldDef::auto_id(),
                name_field(),
                FieldDef::new("description", FieldType::TextField).nullable().blank(),
                FieldDef::new("status", FieldType::CharField)
                    .max_length(9)
                    .choices(MissionStatus::choices())
                    .default(MissionStatus::Planned),
                FieldDef::new("launch_date", FieldType::DateField),
                updated_at(),
                FieldDef::new(
                    "spacecraft",
                    FieldType::ForeignKey {
                        to: "space_spacecraft".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: Some("used_in_missions".into()),
                    },
                )
                .column("spacecraft_id"),
                FieldDef::new(
                    "astronauts",
                    FieldType::ManyToManyField {
                        to: CREW.table.into(),
                        through: CREW.through.into(),
                        source: CREW.source.into(),
                        target: CREW.target.into(),
                        related_name: Some("missions".into()),
                    },
                ),
                FieldDef::new(
                    "commander",
                    FieldType::ForeignKey {
                        to: "space_astronaut".into(),
                        on_delete: OnDelete::SetNull,
                        related_name: Some("commanded_missions".into()),
                    },
                )
                .column("commander_id")
                .nullable(),
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
            ("description", Value::from(self.description.clone())),
            ("status", Value::from(self.status)),
            ("launch_date", Value::Date(self.launch_date)),
            ("updated_at", Value::from(self.updated_at)),
            ("spacecraft", Value::Int(self.spacecraft_id)),
            ("commander", Value::from(self.commander_id)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            status: row.get("status")?,
            launch_date: row.get("launch_date")?,
            updated_at: row.get("updated_at")?,
            spacecraft_id: row.get("spacecraft_id")?,
            commander_id: row.get("commander_id")?,
        })
    }
}
