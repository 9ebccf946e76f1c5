//! # query-lab-db
//!
//! The ORM behind the exercises: the [`Model`](model::Model) trait, lazy
//! [`QuerySet`](query::QuerySet)s, filter and expression types, and the SQL
//! compiler that turns them into parameterized statements.
//!
//! ## Architecture
//!
//! A [`QuerySet`](query::QuerySet) builds a [`Query`](query::Query) AST through
//! method chaining without touching the database. SQL is generated when an
//! `*_exec` method runs against a [`DbExecutor`](executor::DbExecutor), at which
//! point the [`SqlCompiler`](query::SqlCompiler) produces SQL for the backend.
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait, [`ModelMeta`](model::ModelMeta) and `full_clean`
//! - [`fields`] - Field definitions ([`FieldDef`](fields::FieldDef)) and custom fields
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`row`] - Result rows and typed column access
//! - [`query`] - Query building, lookups, expressions, and compilation
//! - [`executor`] - The executor trait and model CRUD
//! - [`schema`] - Table DDL from model metadata
//! - [`validators`] - Field validators

#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::result_large_err)]
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::use_self)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]
// significant_drop_tightening: false positives with async Mutex guards
#![allow(clippy::significant_drop_tightening)]

pub mod executor;
pub mod fields;
pub mod model;
pub mod query;
pub mod row;
pub mod schema;
pub mod validators;
pub mod value;

pub use executor::{
    bulk_create, bulk_update, create_model, delete_model, refresh_model, save_model, DbExecutor,
};
pub use fields::{FieldDef, FieldType, OnDelete};
pub use model::{full_clean, Model, ModelMeta};
pub use query::{
    AggregateFunc, Annotated, DatabaseBackendType, Expression, Lookup, Manager, ManyToMany,
    OrderBy, Q, Query, QuerySet, Relation, SqlCompiler, When,
};
pub use row::{FromValue, Row};
pub use schema::create_tables;
pub use validators::Validator;
pub use value::Value;
