//! Directors, actors and the movies they make.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use query_lab_core::OrmResult;
use query_lab_db::validators::{MaxValueValidator, MinLengthValidator, MinValueValidator};
use query_lab_db::{
    Expression, FieldDef, FieldType, Manager, ManyToMany, Model, ModelMeta, OnDelete, OrderBy,
    QuerySet, Relation, Row, Value,
};

use crate::choices::choice_enum;

/// Birth date used when none is given.
pub fn default_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

const UNKNOWN: &str = "Unknown";

/// Movies directed by a director.
pub const DIRECTOR_MOVIES: Relation = Relation::Reverse {
    table: "movies_movie",
    fk: "director_id",
};

/// Movies in which an actor is the star.
pub const STARRING_MOVIES: Relation = Relation::Reverse {
    table: "movies_movie",
    fk: "starring_actor_id",
};

/// The starring actor of a movie.
pub const STARRING_ACTOR: Relation = Relation::Forward {
    table: "movies_actor",
    fk: "starring_actor_id",
};

/// The cast of a movie.
pub const CAST: ManyToMany = ManyToMany::new(
    "movies_movie",
    "movies_actor",
    "movies_movie_actors",
    "movie_id",
    "actor_id",
);

fn person_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::auto_id(),
        FieldDef::new("full_name", FieldType::CharField)
            .max_length(120)
            .validator(MinLengthValidator::new(2)),
        FieldDef::new("birth_date", FieldType::DateField).default(default_birth_date()),
        FieldDef::new("nationality", FieldType::CharField)
            .max_length(50)
            .default(UNKNOWN),
    ]
}

// ── Director ───────────────────────────────────────────────────────────

/// A film director.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Director {
    pub id: i64,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
    pub years_of_experience: i64,
}

impl Director {
    /// A director of unknown nationality and birth date.
    pub fn new(full_name: &str) -> Self {
        Self {
            id: 0,
            full_name: full_name.to_string(),
            birth_date: default_birth_date(),
            nationality: UNKNOWN.to_string(),
            years_of_experience: 0,
        }
    }
}

impl Model for Director {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            let mut fields = person_fields();
            fields.push(
                FieldDef::new("years_of_experience", FieldType::SmallIntegerField)
                    .default(0)
                    .validator(MinValueValidator::new(0.0)),
            );
            ModelMeta::new("movies", "director", "movies_director").fields(fields)
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
            ("birth_date", Value::Date(self.birth_date)),
            ("nationality", Value::from(&self.nationality)),
            ("years_of_experience", Value::Int(self.years_of_experience)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            full_name: row.get("full_name")?,
            birth_date: row.get("birth_date")?,
            nationality: row.get("nationality")?,
            years_of_experience: row.get("years_of_experience")?,
        })
    }
}

/// Custom queries on the director table.
pub trait DirectorManager {
    /// Every director annotated with `movies_count`, most prolific first,
    /// then by name.
    fn get_directors_by_movies_count(&self) -> QuerySet<Director>;
}

impl DirectorManager for Manager<Director> {
    fn get_directors_by_movies_count(&self) -> QuerySet<Director> {
        self.all()
            .annotate("movies_count", Expression::related_count([DIRECTOR_MOVIES]))
            .order_by(vec![OrderBy::desc("movies_count"), OrderBy::asc("full_name")])
    }
}

// ── Actor ──────────────────────────────────────────────────────────────

/// A film actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
    pub is_awarded: bool,
    /// Written on every save; read it back with `refresh_model`.
    pub last_updated: Option<NaiveDateTime>,
}

impl Actor {
    /// An unawarded actor of unknown nationality and birth date.
    pub fn new(full_name: &str) -> Self {
        Self {
            id: 0,
            full_name: full_name.to_string(),
            birth_date: default_birth_date(),
            nationality: UNKNOWN.to_string(),
            is_awarded: false,
            last_updated: None,
        }
    }
}

impl Model for Actor {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            let mut fields = person_fields();
            fields.push(FieldDef::new("is_awarded", FieldType::BooleanField).default(false));
            fields.push(FieldDef::new("last_updated", FieldType::DateTimeField).auto_now());
            ModelMeta::new("movies", "actor", "movies_actor").fields(fields)
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
            ("birth_date", Value::Date(self.birth_date)),
            ("nationality", Value::from(&self.nationality)),
            ("is_awarded", Value::Bool(self.is_awarded)),
            ("last_updated", Value::from(self.last_updated)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            full_name: row.get("full_name")?,
            birth_date: row.get("birth_date")?,
            nationality: row.get("nationality")?,
            is_awarded: row.get("is_awarded")?,
            last_updated: row.get("last_updated")?,
        })
    }
}

// ── Movie ──────────────────────────────────────────────────────────────

choice_enum! {
    /// Movie genres.
    Genre {
        Action => "Action",
        Comedy => "Comedy",
        Drama => "Drama",
        Other => "Other",
    }
}

/// A movie with its director, star and cast.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: NaiveDate,
    pub storyline: Option<String>,
    pub genre: Genre,
    pub rating: f64,
    pub is_classic: bool,
    pub is_awarded: bool,
    pub last_updated: Option<NaiveDateTime>,
    pub director_id: i64,
    pub starring_actor_id: Option<i64>,
}

impl Movie {
    /// An unrated, unawarded movie with no star.
    pub fn new(title: &str, release_date: NaiveDate, director_id: i64) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            release_date,
            storyline: None,
            genre: Genre::Other,
            rating: 0.0,
            is_classic: false,
            is_awarded: false,
            last_updated: None,
            director_id,
            starring_actor_id: None,
        }
    }
}

impl Model for Movie {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("movies", "movie", "movies_movie").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("title", FieldType::CharField)
                    .max_length(150)
                    .validator(MinLengthValidator::new(5)),
                FieldDef::new("release_date", FieldType::DateField),
                FieldDef::new("storyline", FieldType::TextField).nullable(),
                FieldDef::new("genre", FieldType::CharField)
                    .max_length(6)
                    .choices(Genre::choices())
                    .default(Genre::Other),
                FieldDef::new(
                    "rating",
                    FieldType::DecimalField {
                        max_digits: 3,
                        decimal_places: 1,
                    },
                )
                .default(0.0)
                .validator(MinValueValidator::new(0.0))
                .validator(MaxValueValidator::new(10.0)),
                FieldDef::new("is_classic", FieldType::BooleanField).default(false),
                FieldDef::new("is_awarded", FieldType::BooleanField).default(false),
                FieldDef::new("last_updated", FieldType::DateTimeField).auto_now(),
                FieldDef::new(
                    "director",
                    FieldType::ForeignKey {
                        to: "movies_director".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: Some("director_movies".into()),
                    },
                )
                .column("director_id"),
                FieldDef::new(
                    "starring_actor",
                    FieldType::ForeignKey {
                        to: "movies_actor".into(),
                        on_delete: OnDelete::SetNull,
                        related_name: Some("starring_movies".into()),
                    },
                )
                .column("starring_actor_id")
                .nullable(),
                FieldDef::new(
                    "actors",
                    FieldType::ManyToManyField {
                        to: CAST.table.into(),
                        through: CAST.through.into(),
                        source: CAST.source.into(),
                        target: CAST.target.into(),
                        related_name: Some("actor_movies".into()),
                    },
                ),
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
            ("title", Value::from(&self.title)),
            ("release_date", Value::Date(self.release_date)),
            ("storyline", Value::from(self.storyline.clone())),
            ("genre", Value::from(self.genre)),
            ("rating", Value::Float(self.rating)),
            ("is_classic", Value::Bool(self.is_classic)),
            ("is_awarded", Value::Bool(self.is_awarded)),
            ("last_updated", Value::from(self.last_updated)),
            ("director", Value::Int(self.director_id)),
            ("starring_actor", Value::from(self.starring_actor_id)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            release_date: row.get("release_date")?,
            storyline: row.get("storyline")?,
            genre: row.get("genre")?,
            rating: row.get("rating")?,
            is_classic: row.get("is_classic")?,
            is_awarded: row.get("is_awarded")?,
            last_updated: row.get("last_updated")?,
            director_id: row.get("director_id")?,
            starring_actor_id: row.get("starring_actor_id")?,
        })
    }
}
