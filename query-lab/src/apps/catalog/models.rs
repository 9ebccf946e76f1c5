//! Catalog models: flat tables driven by bulk creation and `CASE` updates.

use std::sync::LazyLock;

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

fn text(name: &'static str, max_length: usize) -> FieldDef {
    FieldDef::new(name, FieldType::CharField).max_length(max_length)
}

fn count(name: &'static str) -> FieldDef {
    FieldDef::new(name, FieldType::PositiveIntegerField)
}

// ── Choices ────────────────────────────────────────────────────────────

choice_enum! {
    /// Laptop manufacturers.
    LaptopBrand {
        Asus => "Asus",
        Acer => "Acer",
        Apple => "Apple",
        Lenovo => "Lenovo",
        Dell => "Dell",
    }
}

choice_enum! {
    /// Laptop operating systems.
    OperationSystem {
        Windows => "Windows",
        MacOs => "MacOS",
        Linux => "Linux",
        ChromeOs => "Chrome OS",
    }
}

choice_enum! {
    /// When a meal is served.
    MealType {
        Breakfast => "Breakfast",
        Lunch => "Lunch",
        Dinner => "Dinner",
        Snack => "Snack",
    }
}

choice_enum! {
    /// How hard a dungeon is.
    DungeonDifficulty {
        Easy => "Easy",
        Medium => "Medium",
        Hard => "Hard",
    }
}

choice_enum! {
    /// Kinds of workout.
    WorkoutType {
        Cardio => "Cardio",
        Strength => "Strength",
        Yoga => "Yoga",
        CrossFit => "CrossFit",
        Calisthenics => "Calisthenics",
    }
}

// ── ArtworkGallery ─────────────────────────────────────────────────────

/// A rated piece of art.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkGallery {
    pub id: i64,
    pub artist_name: String,
    pub art_name: String,
    pub rating: i64,
    pub price: f64,
}

impl ArtworkGallery {
    /// Creates an unsaved artwork.
    pub fn new(artist_name: &str, art_name: &str, rating: i64, price: f64) -> Self {
        Self {
            id: 0,
            artist_name: artist_name.to_string(),
            art_name: art_name.to_string(),
            rating,
            price,
        }
    }
}

impl Model for ArtworkGallery {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("catalog", "artworkgallery", "catalog_artworkgallery").fields(vec![
                FieldDef::auto_id(),
                text("artist_name", 100),
                text("art_name", 100),
                FieldDef::new("rating", FieldType::IntegerField),
                money("price"),
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
            ("artist_name", Value::from(&self.artist_name)),
            ("art_name", Value::from(&self.art_name)),
            ("rating", Value::Int(self.rating)),
            ("price", Value::Float(self.price)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            artist_name: row.get("artist_name")?,
            art_name: row.get("art_name")?,
            rating: row.get("rating")?,
            price: row.get("price")?,
        })
    }
}

// ── Laptop ─────────────────────────────────────────────────────────────

/// A laptop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Laptop {
    pub id: i64,
    pub brand: LaptopBrand,
    pub processor: String,
    pub memory: i64,
    pub storage: i64,
    pub operation_system: OperationSystem,
    pub price: f64,
}

impl Laptop {
    /// Creates an unsaved laptop.
    pub fn new(
        brand: LaptopBrand,
        processor: &str,
        memory: i64,
        storage: i64,
        operation_system: OperationSystem,
        price: f64,
    ) -> Self {
        Self {
            id: 0,
            brand,
            processor: processor.to_string(),
            memory,
            storage,
            operation_system,
            price,
        }
    }
}

impl Model for Laptop {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("catalog", "laptop", "catalog_laptop").fields(vec![
                FieldDef::auto_id(),
                text("brand", 20).choices(LaptopBrand::choices()),
                text("processor", 100),
                count("memory"),
                count("storage"),
                text("operation_system", 20).choices(OperationSystem::choices()),
                money("price"),
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
            ("brand", Value::from(self.brand)),
            ("processor", Value::from(&self.processor)),
            ("memory", Value::Int(self.memory)),
            ("storage", Value::Int(self.storage)),
            ("operation_system", Value::from(self.operation_system)),
            ("price", Value::Float(self.price)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            brand: row.get("brand")?,
            processor: row.get("processor")?,
            memory: row.get("memory")?,
            storage: row.get("storage")?,
            operation_system: row.get("operation_system")?,
            price: row.get("price")?,
        })
    }
}

// ── ChessPlayer ────────────────────────────────────────────────────────

/// Title given to unranked chess players.
pub const NO_TITLE: &str = "no title";

/// A chess player and their record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChessPlayer {
    pub id: i64,
    pub username: String,
    pub title: String,
    pub rating: i64,
    pub games_played: i64,
    pub games_won: i64,
    pub games_lost: i64,
    pub games_drawn: i64,
}

impl ChessPlayer {
    /// An untitled 1500-rated player with no games.
    pub fn new(username: &str) -> Self {
        Self {
            id: 0,
            username: username.to_string(),
            title: NO_TITLE.to_string(),
            rating: 1500,
            games_played: 0,
            games_won: 0,
            games_lost: 0,
            games_drawn: 0,
        }
    }
}

impl Model for ChessPlayer {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("catalog", "chessplayer", "catalog_chessplayer").fields(vec![
                FieldDef::auto_id(),
                text("username", 100).unique(),
                text("title", 100).default(NO_TITLE),
                count("rating").default(1500),
                count("games_played").default(0),
                count("games_won").default(0),
                count("games_lost").default(0),
                count("games_drawn").default(0),
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
            ("username", Value::from(&self.username)),
            ("title", Value::from(&self.title)),
            ("rating", Value::Int(self.rating)),
            ("games_played", Value::Int(self.games_played)),
            ("games_won", Value::Int(self.games_won)),
            ("games_lost", Value::Int(self.games_lost)),
            ("games_drawn", Value::Int(self.games_drawn)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            title: row.get("title")?,
            rating: row.get("rating")?,
            games_played: row.get("games_played")?,
            games_won: row.get("games_won")?,
            games_lost: row.get("games_lost")?,
            games_drawn: row.get("games_drawn")?,
        })
    }
}

// ── Meal ───────────────────────────────────────────────────────────────

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub meal_type: MealType,
    pub preparation_time: String,
    pub difficulty: i64,
    pub calories: i64,
    pub chef: String,
}

impl Meal {
    /// Creates an unsaved meal.
    pub fn new(
        name: &str,
        meal_type: MealType,
        preparation_time: &str,
        difficulty: i64,
        calories: i64,
        chef: &str,
    ) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            meal_type,
            preparation_time: preparation_time.to_string(),
            difficulty,
            calories,
            chef: chef.to_string(),
        }
    }
}

impl Model for Meal {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("catalog", "meal", "catalog_meal").fields(vec![
                FieldDef::auto_id(),
                text("name", 100),
                text("meal_type", 10).choices(MealType::choices()),
                text("preparation_time", 30),
                count("difficulty"),
                count("calories"),
                text("chef", 100),
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
            ("meal_type", Value::from(self.meal_type)),
            ("preparation_time", Value::from(&self.preparation_time)),
            ("difficulty", Value::Int(self.difficulty)),
            ("calories", Value::Int(self.calories)),
            ("chef", Value::from(&self.chef)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            meal_type: row.get("meal_type")?,
            preparation_time: row.get("preparation_time")?,
            difficulty: row.get("difficulty")?,
            calories: row.get("calories")?,
            chef: row.get("chef")?,
        })
    }
}

// ── Dungeon ────────────────────────────────────────────────────────────

/// A dungeon guarded by a boss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dungeon {
    pub id: i64,
    pub name: String,
    pub difficulty: DungeonDifficulty,
    pub location: String,
    pub boss_name: String,
    pub recommended_level: i64,
    pub boss_health: i64,
    pub reward: String,
}

impl Model for Dungeon {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("catalog", "dungeon", "catalog_dungeon").fields(vec![
                FieldDef::auto_id(),
                text("name", 100),
                text("difficulty", 10).choices(DungeonDifficulty::choices()),
                text("location", 100),
                text("boss_name", 100),
                count("recommended_level"),
                count("boss_health"),
                FieldDef::new("reward", FieldType::TextField),
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
            ("difficulty", Value::from(self.difficulty)),
            ("location", Value::from(&self.location)),
            ("boss_name", Value::from(&self.boss_name)),
            ("recommended_level", Value::Int(self.recommended_level)),
            ("boss_health", Value::Int(self.boss_health)),
            ("reward", Value::from(&self.reward)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            difficulty: row.get("difficulty")?,
            location: row.get("location")?,
            boss_name: row.get("boss_name")?,
            recommended_level: row.get("recommended_level")?,
            boss_health: row.get("boss_health")?,
            reward: row.get("reward")?,
        })
    }
}

// ── Workout ────────────────────────────────────────────────────────────

/// A training session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    pub workout_type: WorkoutType,
    pub duration: String,
    pub difficulty: String,
    pub calories_burned: i64,
    pub instructor: String,
}

impl Workout {
    /// Creates an unsaved workout.
    pub fn new(
        name: &str,
        workout_type: WorkoutType,
        duration: &str,
        difficulty: &str,
        calories_burned: i64,
        instructor: &str,
    ) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            workout_type,
            duration: duration.to_string(),
            difficulty: difficulty.to_string(),
            calories_burned,
            instructor: instructor.to_string(),
        }
    }
}

impl Model for Workout {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("catalog", "workout", "catalog_workout").fields(vec![
                FieldDef::auto_id(),
                text("name", 200),
                text("workout_type", 20).choices(WorkoutType::choices()),
                text("duration", 30),
                text("difficulty", 50),
                count("calories_burned"),
                text("instructor", 100),
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
            ("workout_type", Value::from(self.workout_type)),
            ("duration", Value::from(&self.duration)),
            ("difficulty", Value::from(&self.difficulty)),
            ("calories_burned", Value::Int(self.calories_burned)),
            ("instructor", Value::from(&self.instructor)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            workout_type: row.get("workout_type")?,
            duration: row.get("duration")?,
            difficulty: row.get("difficulty")?,
            calories_burned: row.get("calories_burned")?,
            instructor: row.get("instructor")?,
        })
    }
}
