//! Houses, their dragons and the quests they fight in.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use query_lab_core::OrmResult;
use query_lab_db::validators::{
    MaxValueValidator, MinLengthValidator, MinValueValidator, RegexValidator,
};
use query_lab_db::{
    Expression, FieldDef, FieldType, Manager, ManyToMany, Model, ModelMeta, OnDelete, OrderBy,
    QuerySet, Relation, Row, Value,
};
use regex::Regex;

use crate::choices::choice_enum;

static QUEST_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z#]{4}$").expect("valid regex"));

/// Dragons belonging to a house.
pub const HOUSE_DRAGONS: Relation = Relation::Reverse {
    table: "dragons_dragon",
    fk: "house_id",
};

/// The house a dragon belongs to.
pub const DRAGON_HOUSE: Relation = Relation::Forward {
    table: "dragons_house",
    fk: "house_id",
};

/// The house hosting a quest.
pub const QUEST_HOST: Relation = Relation::Forward {
    table: "dragons_house",
    fk: "host_id",
};

/// Dragons taking part in a quest.
pub const QUEST_DRAGONS: ManyToMany = ManyToMany::new(
    "dragons_quest",
    "dragons_dragon",
    "dragons_quest_dragons",
    "quest_id",
    "dragon_id",
);

fn name_field() -> FieldDef {
    FieldDef::new("name", FieldType::CharField)
        .max_length(80)
        .unique()
        .validator(MinLengthValidator::new(5))
}

fn wins_field() -> FieldDef {
    FieldDef::new("wins", FieldType::PositiveSmallIntegerField).default(0)
}

fn modified_at() -> FieldDef {
    FieldDef::new("modified_at", FieldType::DateTimeField).auto_now()
}

// ── House ──────────────────────────────────────────────────────────────

/// A noble house.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct House {
    pub id: i64,
    pub name: String,
    pub motto: Option<String>,
    pub is_ruling: bool,
    pub castle: Option<String>,
    pub wins: i64,
    pub modified_at: Option<NaiveDateTime>,
}

impl House {
    /// A house with no motto, castle or wins.
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            motto: None,
            is_ruling: false,
            castle: None,
            wins: 0,
            modified_at: None,
        }
    }
}

impl Model for House {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("dragons", "house", "dragons_house").fields(vec![
                FieldDef::auto_id(),
                name_field(),
                FieldDef::new("motto", FieldType::TextField).nullable().blank(),
                FieldDef::new("is_ruling", FieldType::BooleanField).default(false),
                FieldDef::new("castle", FieldType::CharField)
                    .max_length(80)
                    .nullable()
                    .blank(),
                wins_field(),
                modified_at(),
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
            ("motto", Value::from(self.motto.clone())),
            ("is_ruling", Value::Bool(self.is_ruling)),
            ("castle", Value::from(self.castle.clone())),
            ("wins", Value::Int(self.wins)),
            ("modified_at", Value::from(self.modified_at)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            motto: row.get("motto")?,
            is_ruling: row.get("is_ruling")?,
            castle: row.get("castle")?,
            wins: row.get("wins")?,
            modified_at: row.get("modified_at")?,
        })
    }
}

/// Custom queries on the house table.
pub trait HouseManager {
    /// Every house annotated with `dragons_count`, largest first, then by
    /// name.
    fn get_houses_by_dragons_count(&self) -> QuerySet<House>;
}

impl HouseManager for Manager<House> {
    fn get_houses_by_dragons_count(&self) -> QuerySet<House> {
        self.all()
            .annotate("dragons_count", Expression::related_count([HOUSE_DRAGONS]))
            .order_by(vec![OrderBy::desc("dragons_count"), OrderBy::asc("name")])
    }
}

// ── Dragon ─────────────────────────────────────────────────────────────

choice_enum! {
    /// What a dragon breathes.
    Breath {
        Fire => "Fire",
        Ice => "Ice",
        Lightning => "Lightning",
        Unknown => "Unknown",
    }
}

/// A dragon serving a house.
#[derive(Debug, Clone, PartialEq)]
pub struct Dragon {
    pub id: i64,
    pub name: String,
    pub power: f64,
    pub breath: Breath,
    pub is_healthy: bool,
    /// Set on insert.
    pub birth_date: Option<NaiveDate>,
    pub wins: i64,
    pub modified_at: Option<NaiveDateTime>,
    pub house_id: i64,
}

impl Dragon {
    /// A weakest-power dragon of unknown breath.
    pub fn new(name: &str, house_id: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            power: 1.0,
            breath: Breath::Unknown,
            is_healthy: false,
            birth_date: None,
            wins: 0,
            modified_at: None,
            house_id,
        }
    }
}

impl Model for Dragon {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("dragons", "dragon", "dragons_dragon").fields(vec![
                FieldDef::auto_id(),
                name_field(),
                FieldDef::new(
                    "power",
                    FieldType::DecimalField {
                        max_digits: 3,
                        decimal_places: 1,
                    },
                )
                .default(1.0)
                .validator(MinValueValidator::new(1.0))
                .validator(MaxValueValidator::new(10.0)),
                FieldDef::new("breath", FieldType::CharField)
                    .max_length(9)
                    .choices(Breath::choices())
                    .default(Breath::Unknown),
                FieldDef::new("is_healthy", FieldType::BooleanField).default(false),
                FieldDef::new("birth_date", FieldType::DateField).auto_now_add(),
                wins_field(),
                modified_at(),
                FieldDef::new(
                    "house",
                    FieldType::ForeignKey {
                        to: "dragons_house".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: Some("dragons".into()),
                    },
                )
                .column("house_id"),
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
            ("power", Value::Float(self.power)),
            ("breath", Value::from(self.breath)),
            ("is_healthy", Value::Bool(self.is_healthy)),
            ("birth_date", Value::from(self.birth_date)),
            ("wins", Value::Int(self.wins)),
            ("modified_at", Value::from(self.modified_at)),
            ("house", Value::Int(self.house_id)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            power: row.get("power")?,
            breath: row.get("breath")?,
            is_healthy: row.get("is_healthy")?,
            birth_date: row.get("birth_date")?,
            wins: row.get("wins")?,
            modified_at: row.get("modified_at")?,
            house_id: row.get("house_id")?,
        })
    }
}

// ── Quest ──────────────────────────────────────────────────────────────

/// A quest hosted by a house.
#[derive(Debug, Clone, PartialEq)]
pub struct Quest {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub reward: f64,
    pub start_time: NaiveDateTime,
    pub modified_at: Option<NaiveDateTime>,
    pub host_id: i64,
}

impl Quest {
    /// A quest with the standard reward.
    pub fn new(name: &str, code: &str, start_time: NaiveDateTime, host_id: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            code: code.to_string(),
            reward: 100.0,
            start_time,
            modified_at: None,
            host_id,
        }
    }
}

impl Model for Quest {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("dragons", "quest", "dragons_quest").fields(vec![
                FieldDef::auto_id(),
                name_field(),
                FieldDef::new("code", FieldType::CharField)
                    .max_length(4)
                    .unique()
                    .validator(RegexValidator::from_regex(
                        QUEST_CODE.clone(),
                        "Enter a valid value.",
                    )),
                FieldDef::new("reward", FieldType::FloatField).default(100.0),
                FieldDef::new("start_time", FieldType::DateTimeField),
                modified_at(),
                FieldDef::new(
                    "dragons",
                    FieldType::ManyToManyField {
                        to: QUEST_DRAGONS.table.into(),
                        through: QUEST_DRAGONS.through.into(),
                        source: QUEST_DRAGONS.source.into(),
                        target: QUEST_DRAGONS.target.into(),
                        related_name: Some("quests".into()),
                    },
                ),
                FieldDef::new(
                    "host",
                    FieldType::ForeignKey {
                        to: "dragons_house".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: Some("quests".into()),
                    },
                )
                .column("host_id"),
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
            ("code", Value::from(&self.code)),
            ("reward", Value::Float(self.reward)),
            ("start_time", Value::DateTime(self.start_time)),
            ("modified_at", Value::from(self.modified_at)),
            ("host", Value::Int(self.host_id)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            code: row.get("code")?,
            reward: row.get("reward")?,
            start_time: row.get("start_time")?,
            modified_at: row.get("modified_at")?,
            host_id: row.get("host_id")?,
        })
    }
}
