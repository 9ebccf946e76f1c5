//! Customer registration with per-field validation and Unix timestamps.

pub mod models;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use query_lab_core::OrmResult;
use query_lab_db::fields::UnixTimestamp;
use query_lab_db::{create_model, full_clean, DbExecutor, Lookup, Model, OrderBy, Q};

pub use models::Customer;

use super::lines;

/// Creates the customer table.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(db, &[Customer::meta()]).await
}

/// Validates `customer` and inserts it. An unset registration time is
/// stamped with the current second.
///
/// # Errors
///
/// Returns [`OrmError::ValidationError`](query_lab_core::OrmError::ValidationError)
/// listing every invalid field, or a database error if the insert fails.
pub async fn register_customer(db: &dyn DbExecutor, customer: &mut Customer) -> OrmResult<()> {
    full_clean(customer)?;
    if customer.registered_at.is_none() {
        customer.registered_at = Some(Utc::now().naive_utc().trunc_subsecs(0));
    }
    create_model(customer, db).await?;
    tracing::info!(customer = customer.id, "customer registered");
    Ok(())
}

/// Customers registered at or after `since`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn customers_registered_since(
    db: &dyn DbExecutor,
    since: NaiveDateTime,
) -> OrmResult<String> {
    let customers = Customer::objects()
        .filter(Q::filter(
            "registered_at",
            Lookup::Gte(UnixTimestamp::to_db(Some(since))),
        ))
        .order_by(vec![OrderBy::asc("registered_at"), OrderBy::asc("id")])
        .execute_query(db)
        .await?;
    Ok(lines(
        customers
            .iter()
            .map(|c| format!("{} <{}>", c.name, c.email)),
    ))
}
