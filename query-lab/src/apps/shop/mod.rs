//! Profiles, products and orders: loyal customers, best sellers and order
//! completion.

pub mod models;

use query_lab_core::logging::exercise_span;
use query_lab_core::OrmResult;
use query_lab_db::query::expressions::{greatest, round};
use query_lab_db::{save_model, DbExecutor, Expression, Lookup, Model, OrderBy, Value, When, Q};
use tracing::Instrument;

pub use models::{Order, Product, Profile, ProfileManager, ORDER_PRODUCTS, PROFILE_ORDERS};

use super::{exact, lines};

/// Creates the profile, product and order tables and the order junction.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(db, &[Profile::meta(), Product::meta(), Order::meta()]).await
}

/// Profiles whose name, email or phone number contain `search`, ignoring
/// case, by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_profiles(db: &dyn DbExecutor, search: Option<&str>) -> OrmResult<String> {
    let Some(search) = search.filter(|s| !s.is_empty()) else {
        return Ok(String::new());
    };
    let contains = |field: &str| Q::filter(field, Lookup::IContains(search.to_string()));

    let profiles = Profile::objects()
        .filter(contains("full_name") | contains("email") | contains("phone_number"))
        .annotate("orders", Expression::related_count([PROFILE_ORDERS]))
        .order_by(vec![OrderBy::asc("full_name")])
        .execute_annotated(db)
        .await?;

    let mut out = Vec::with_capacity(profiles.len());
    for p in &profiles {
        let orders: i64 = p.get("orders")?;
        out.push(format!(
            "Profile: {}, email: {}, phone number: {}, orders: {orders}",
            p.model.full_name, p.model.email, p.model.phone_number
        ));
    }
    Ok(lines(out))
}

/// Regular customers with their order counts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_loyal_profiles(db: &dyn DbExecutor) -> OrmResult<String> {
    let profiles = Profile::objects()
        .get_regular_customers()
        .execute_annotated(db)
        .await?;
    let mut out = Vec::with_capacity(profiles.len());
    for p in &profiles {
        let orders: i64 = p.get("count_orders")?;
        out.push(format!("Profile: {}, orders: {orders}", p.model.full_name));
    }
    Ok(lines(out))
}

/// The products of the most recent order.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn get_last_sold_products(db: &dyn DbExecutor) -> OrmResult<String> {
    let Some(order) = Order::objects().all().last_exec(db).await? else {
        return Ok(String::new());
    };
    let names: Vec<String> = ORDER_PRODUCTS
        .targets::<Product>(order.id)
        .order_by(vec![OrderBy::asc("name")])
        .execute_query(db)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();
    if names.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("Last sold products: {}", names.join(", ")))
}

/// The five products found in the most orders.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_top_products(db: &dyn DbExecutor) -> OrmResult<String> {
    let products = Product::objects()
        .all()
        .annotate(
            "orders_count",
            Expression::related_count([ORDER_PRODUCTS.reverse()]),
        )
        .filter(Q::filter("orders_count", Lookup::Gt(Value::Int(0))))
        .order_by(vec![OrderBy::desc("orders_count"), OrderBy::asc("name")])
        .limit(5)
        .execute_annotated(db)
        .await?;
    if products.is_empty() {
        return Ok(String::new());
    }

    let mut out = Vec::with_capacity(products.len());
    for p in &products {
        let sold: i64 = p.get("orders_count")?;
        out.push(format!("{}, sold {sold} times", p.model.name));
    }
    Ok(format!("Top products:\n{}", lines(out)))
}

/// Takes 10% off every open order holding more than two products.
///
/// Returns an empty string when no order qualifies.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn apply_discounts(db: &dyn DbExecutor) -> OrmResult<String> {
    let discounted = round(
        Expression::f("total_price") * Expression::value(0.9),
        Some(2),
    );
    let updated = Order::objects()
        .filter(exact("is_completed", false))
        .annotate(
            "products_count",
            Expression::related_count([ORDER_PRODUCTS.forward()]),
        )
        .filter(Q::filter("products_count", Lookup::Gt(Value::Int(2))))
        .update(vec![("total_price", discounted)])
        .update_exec(db)
        .await?;
    tracing::info!(updated, "order discounts applied");
    if updated == 0 {
        return Ok(String::new());
    }
    Ok(format!("Discount applied to {updated} orders"))
}

/// Completes the oldest open order, taking one unit of each of its products
/// out of stock.
///
/// # Errors
///
/// Returns an error if a query or the save fails.
pub async fn complete_order(db: &dyn DbExecutor) -> OrmResult<String> {
    complete_oldest_order(db)
        .instrument(exercise_span("complete_order"))
        .await
}

async fn complete_oldest_order(db: &dyn DbExecutor) -> OrmResult<String> {
    let Some(mut order) = Order::objects()
        .filter(exact("is_completed", false))
        .order_by(vec![OrderBy::asc("creation_date"), OrderBy::asc("id")])
        .first_exec(db)
        .await?
    else {
        return Ok(String::new());
    };

    // SET expressions read the pre-update row, so the last unit is in_stock <= 1.
    let sold_out = When::new(Q::filter("in_stock", Lookup::Lte(Value::Int(1))), false);
    let products = ORDER_PRODUCTS
        .targets::<Product>(order.id)
        .update(vec![
            (
                "in_stock",
                greatest(vec![
                    Expression::f("in_stock") - Expression::value(1),
                    Expression::value(0),
                ]),
            ),
            (
                "is_available",
                Expression::case(vec![sold_out], Some(Expression::f("is_available"))),
            ),
        ])
        .update_exec(db)
        .await?;

    order.is_completed = true;
    save_model(&mut order, db).await?;
    tracing::info!(order = order.id, products, "order completed");
    Ok("Order has been completed!".to_string())
}
