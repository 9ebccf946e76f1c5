//! The exercise apps.
//!
//! Every app owns its tables (prefixed with the app name) and exposes a
//! `create_tables` helper that must run before its query functions.

pub mod basics;
pub mod catalog;
pub mod customers;
pub mod dragons;
pub mod movies;
pub mod publishing;
pub mod shop;
pub mod space;
pub mod students;

use query_lab_core::OrmResult;
use query_lab_db::{DbExecutor, Lookup, Value, Q};

/// Creates the tables of every app.
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub async fn create_all_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    basics::create_tables(db).await?;
    catalog::create_tables(db).await?;
    customers::create_tables(db).await?;
    dragons::create_tables(db).await?;
    movies::create_tables(db).await?;
    publishing::create_tables(db).await?;
    shop::create_tables(db).await?;
    space::create_tables(db).await?;
    students::create_tables(db).await?;
    tracing::info!("created the tables of every app");
    Ok(())
}

/// `field = value`.
pub(crate) fn exact(field: &str, value: impl Into<Value>) -> Q {
    Q::filter(field, Lookup::Exact(value.into()))
}

/// `field IN (values)`.
pub(crate) fn one_of<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Q {
    Q::filter(field, Lookup::In(values.into_iter().map(Into::into).collect()))
}

/// Joins report lines with `\n`.
pub(crate) fn lines<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
