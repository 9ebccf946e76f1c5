//! Publishers, authors and their books.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use query_lab_core::OrmResult;
use query_lab_db::validators::{MaxValueValidator, MinValueValidator};
use query_lab_db::{
    Expression, FieldDef, FieldType, Manager, ManyToMany, Model, ModelMeta, OnDelete, OrderBy,
    QuerySet, Relation, Row, Value,
};

use crate::choices::choice_enum;

/// Country recorded until the real one is known.
pub const TO_BE_CONFIRMED: &str = "TBC";

/// Founding date used when none is given.
pub fn default_established_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1800, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Books released by a publisher.
pub const PUBLISHER_BOOKS: Relation = Relation::Reverse {
    table: "publishing_book",
    fk: "publisher_id",
};

/// Books an author wrote as main author.
pub const MAIN_BOOKS: Relation = Relation::Reverse {
    table: "publishing_book",
    fk: "main_author_id",
};

/// The publisher of a book.
pub const BOOK_PUBLISHER: Relation = Relation::Forward {
    table: "publishing_publisher",
    fk: "publisher_id",
};

/// The main author of a book.
pub const MAIN_AUTHOR: Relation = Relation::Forward {
    table: "publishing_author",
    fk: "main_author_id",
};

/// Co-authors of a book.
pub const CO_AUTHORS: ManyToMany = ManyToMany::new(
    "publishing_book",
    "publishing_author",
    "publishing_book_co_authors",
    "book_id",
    "author_id",
);

fn rating_field() -> FieldDef {
    FieldDef::new("rating", FieldType::FloatField)
        .default(0.0)
        .validator(MinValueValidator::new(0.0))
        .validator(MaxValueValidator::new(5.0))
}

// ── Publisher ──────────────────────────────────────────────────────────

/// A publishing house.
#[derive(Debug, Clone, PartialEq)]
pub struct Publisher {
    pub id: i64,
    pub name: String,
    pub established_date: NaiveDate,
    pub country: String,
    pub rating: f64,
}

impl Publisher {
    /// An unrated publisher of unconfirmed country.
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            established_date: default_established_date(),
            country: TO_BE_CONFIRMED.to_string(),
            rating: 0.0,
        }
    }
}

impl Model for Publisher {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("publishing", "publisher", "publishing_publisher").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField).max_length(100),
                FieldDef::new("established_date", FieldType::DateField)
                    .default(default_established_date()),
                FieldDef::new("country", FieldType::CharField)
                    .max_length(40)
                    .default(TO_BE_CONFIRMED),
                rating_field(),
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
            ("established_date", Value::Date(self.established_date)),
            ("country", Value::from(&self.country)),
            ("rating", Value::Float(self.rating)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            established_date: row.get("established_date")?,
            country: row.get("country")?,
            rating: row.get("rating")?,
        })
    }
}

/// Custom queries on the publisher table.
pub trait PublisherManager {
    /// Every publisher annotated with `books_count`, most books first, then
    /// by name.
    fn get_publishers_by_books_count(&self) -> QuerySet<Publisher>;
}

impl PublisherManager for Manager<Publisher> {
    fn get_publishers_by_books_count(&self) -> QuerySet<Publisher> {
        self.all()
            .annotate("books_count", Expression::related_count([PUBLISHER_BOOKS]))
            .order_by(vec![OrderBy::desc("books_count"), OrderBy::asc("name")])
    }
}

// ── Author ─────────────────────────────────────────────────────────────

/// A book author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub country: String,
    pub is_active: bool,
    pub updated_at: Option<NaiveDateTime>,
}

impl Author {
    /// An active author of unconfirmed country.
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            birth_date: None,
            country: TO_BE_CONFIRMED.to_string(),
            is_active: true,
            updated_at: None,
        }
    }
}

impl Model for Author {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("publishing", "author", "publishing_author").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("name", FieldType::CharField).max_length(100),
                FieldDef::new("birth_date", FieldType::DateField).nullable(),
                FieldDef::new("country", FieldType::CharField)
                    .max_length(40)
                    .default(TO_BE_CONFIRMED),
                FieldDef::new("is_active", FieldType::BooleanField).default(true),
                FieldDef::new("updated_at", FieldType::DateTimeField).auto_now(),
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
            ("birth_date", Value::from(self.birth_date)),
            ("country", Value::from(&self.country)),
            ("is_active", Value::Bool(self.is_active)),
            ("updated_at", Value::from(self.updated_at)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            birth_date: row.get("birth_date")?,
            country: row.get("country")?,
            is_active: row.get("is_active")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

// ── Book ───────────────────────────────────────────────────────────────

choice_enum! {
    /// Book genre.
    BookGenre {
        Fiction => "Fiction",
        NonFiction => "Non-Fiction",
        Other => "Other",
    }
}

/// A published book.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub publication_date: NaiveDate,
    pub summary: Option<String>,
    pub genre: BookGenre,
    pub price: f64,
    pub rating: f64,
    pub is_bestseller: bool,
    pub updated_at: Option<NaiveDateTime>,
    pub publisher_id: i64,
    pub main_author_id: i64,
}

impl Book {
    /// An unrated book with no summary.
    pub fn new(
        title: &str,
        publication_date: NaiveDate,
        price: f64,
        publisher_id: i64,
        main_author_id: i64,
    ) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            publication_date,
            summary: None,
            genre: BookGenre::Other,
            price,
            rating: 0.0,
            is_bestseller: false,
            updated_at: None,
            publisher_id,
            main_author_id,
        }
    }
}

impl Model for Book {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("publishing", "book", "publishing_book").fields(vec![
                FieldDef::auto_id(),
                FieldDef::new("title", FieldType::CharField).max_length(200),
                FieldDef::new("publication_date", FieldType::DateField),
                FieldDef::new("summary", FieldType::TextField).nullable(),
                FieldDef::new("genre", FieldType::CharField)
                    .max_length(11)
                    .choices(BookGenre::choices())
                    .default(BookGenre::Other),
                FieldDef::new(
                    "price",
                    FieldType::DecimalField {
                        max_digits: 6,
                        decimal_places: 2,
                    },
                )
                .default(0.01)
                .validator(MinValueValidator::new(0.01))
                .validator(MaxValueValidator::new(9999.99)),
                rating_field(),
                FieldDef::new("is_bestseller", FieldType::BooleanField).default(false),
                FieldDef::new("updated_at", FieldType::DateTimeField).auto_now(),
                FieldDef::new(
                    "publisher",
                    FieldType::ForeignKey {
                        to: "publishing_publisher".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: Some("books".into()),
                    },
                )
                .column("publisher_id"),
                FieldDef::new(
                    "main_author",
                    FieldType::ForeignKey {
                        to: "publishing_author".into(),
                        on_delete: OnDelete::Cascade,
                        related_name: Some("main_books".into()),
                    },
                )
                .column("main_author_id"),
                FieldDef::new(
                    "co_authors",
                    FieldType::ManyToManyField {
                        to: CO_AUTHORS.table.into(),
                        through: CO_AUTHORS.through.into(),
                        source: CO_AUTHORS.source.into(),
                        target: CO_AUTHORS.target.into(),
                        related_name: Some("co_books".into()),
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
            ("publication_date", Value::Date(self.publication_date)),
            ("summary", Value::from(self.summary.clone())),
            ("genre", Value::from(self.genre)),
            ("price", Value::Float(self.price)),
            ("rating", Value::Float(self.rating)),
            ("is_bestseller", Value::Bool(self.is_bestseller)),
            ("updated_at", Value::from(self.updated_at)),
            ("publisher", Value::Int(self.publisher_id)),
            ("main_author", Value::Int(self.main_author_id)),
        ]
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            publication_date: row.get("publication_date")?,
            summary: row.get("summary")?,
            genre: row.get("genre")?,
            price: row.get("price")?,
            rating: row.get("rating")?,
            is_bestseller: row.get("is_bestseller")?,
            updated_at: row.get("updated_at")?,
            publisher_id: row.get("publisher_id")?,
            main_author_id: row.get("main_author_id")?,
        })
    }
}
