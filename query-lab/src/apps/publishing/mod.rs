//! Publishers, authors and books: rankings, a bestseller index and a
//! price raise.

pub mod models;

use query_lab_core::OrmResult;
use query_lab_db::query::expressions::round;
use query_lab_db::{AggregateFunc, DbExecutor, Expression, Lookup, Model, OrderBy, Value, When, Q};

pub use models::{
    Author, Book, BookGenre, Publisher, PublisherManager, BOOK_PUBLISHER, CO_AUTHORS, MAIN_AUTHOR,
    MAIN_BOOKS, PUBLISHER_BOOKS, TO_BE_CONFIRMED,
};

use super::{exact, lines};

const NO_RESULTS: &str = "No results.";

/// Creates the publisher, author and book tables and the co-author junction.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(db, &[Publisher::meta(), Author::meta(), Book::meta()]).await
}

/// Publishers whose name or country contain `search`, ignoring case, best
/// rated first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_publishers(db: &dyn DbExecutor, search: Option<&str>) -> OrmResult<String> {
    let Some(search) = search else {
        return Ok("No search criteria.".to_string());
    };
    let publishers = Publisher::objects()
        .filter(
            Q::filter("name", Lookup::IContains(search.to_string()))
                | Q::filter("country", Lookup::IContains(search.to_string())),
        )
        .order_by(vec![OrderBy::desc("rating"), OrderBy::asc("name")])
        .execute_query(db)
        .await?;
    if publishers.is_empty() {
        return Ok("No publishers found.".to_string());
    }

    Ok(lines(publishers.iter().map(|p| {
        let country = if p.country == TO_BE_CONFIRMED {
            "Unknown"
        } else {
            p.country.as_str()
        };
        format!(
            "Publisher: {}, country: {country}, rating: {:.1}",
            p.name, p.rating
        )
    })))
}

/// The publisher with the most books.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_top_publisher(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Publisher::objects()
        .get_publishers_by_books_count()
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok("No publishers found.".to_string());
    };
    let books: i64 = top.get("books_count")?;
    Ok(format!("Top Publisher: {} with {books} books.", top.model.name))
}

/// The author with the most books as main author, with their titles and
/// average rating.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn get_top_main_author(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Author::objects()
        .all()
        .annotate("books_count", Expression::related_count([MAIN_BOOKS]))
        .annotate(
            "books_avg_rating",
            Expression::related_aggregate(AggregateFunc::Avg, [MAIN_BOOKS], "rating"),
        )
        .filter(Q::filter("books_count", Lookup::Gt(Value::Int(0))))
        .order_by(vec![OrderBy::desc("books_count"), OrderBy::asc("name")])
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(NO_RESULTS.to_string());
    };
    let avg: f64 = top.get("books_avg_rating")?;

    let titles: Vec<String> = Book::objects()
        .filter(exact("main_author_id", top.model.id))
        .order_by(vec![OrderBy::asc("title")])
        .execute_query(db)
        .await?
        .into_iter()
        .map(|b| b.title)
        .collect();
    Ok(format!(
        "Top Author: {}, own book titles: {}, books average rating: {avg:.1}",
        top.model.name,
        titles.join(", ")
    ))
}

/// The three authors with the most books, counting co-authored ones.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_authors_by_books_count(db: &dyn DbExecutor) -> OrmResult<String> {
    let authors = Author::objects()
        .all()
        .annotate(
            "num_books",
            Expression::related_count([MAIN_BOOKS]).distinct()
                + Expression::related_count([CO_AUTHORS.reverse()]).distinct(),
        )
        .filter(Q::filter("num_books", Lookup::Gt(Value::Int(0))))
        .order_by(vec![OrderBy::desc("num_books"), OrderBy::asc("name")])
        .limit(3)
        .execute_annotated(db)
        .await?;
    if authors.is_empty() {
        return Ok(NO_RESULTS.to_string());
    }

    let mut out = Vec::with_capacity(authors.len());
    for a in &authors {
        let books: i64 = a.get("num_books")?;
        out.push(format!("{} authored {books} books.", a.model.name));
    }
    Ok(lines(out))
}

/// The bestseller with the highest index: its rating plus the number of
/// people who wrote it.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn get_bestseller(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Book::objects()
        .filter(exact("is_bestseller", true))
        .annotate(
            "co_authors_count",
            Expression::related_count([CO_AUTHORS.forward()]),
        )
        .annotate(
            "authors_count",
            Expression::f("co_authors_count") + Expression::value(1),
        )
        .annotate(
            "composite_index",
            Expression::f("rating") + Expression::f("authors_count"),
        )
        .annotate(
            "main_author_name",
            Expression::related_field([MAIN_AUTHOR], "name"),
        )
        .order_by(vec![
            OrderBy::desc("composite_index"),
            OrderBy::desc("rating"),
            OrderBy::desc("authors_count"),
            OrderBy::asc("title"),
        ])
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(NO_RESULTS.to_string());
    };
    let index: f64 = top.get("composite_index")?;
    let main_author: String = top.get("main_author_name")?;

    let co_authors: Vec<String> = CO_AUTHORS
        .targets::<Author>(top.model.id)
        .order_by(vec![OrderBy::asc("name")])
        .execute_query(db)
        .await?
        .into_iter()
        .map(|a| a.name)
        .collect();
    let co_authors = if co_authors.is_empty() {
        "N/A".to_string()
    } else {
        co_authors.join("/")
    };
    Ok(format!(
        "Top bestseller: {}, index: {index:.1}. Main author: {main_author}. Co-authors: {co_authors}.",
        top.model.title
    ))
}

/// Raises the price of well rated books published in 2025: 10% above 50,
/// 20% otherwise.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn increase_price(db: &dyn DbExecutor) -> OrmResult<String> {
    let price = Expression::f("price");
    let raised = Expression::case(
        vec![When::new(
            Q::filter("price", Lookup::Gt(Value::Float(50.0))),
            round(price.clone() * Expression::value(1.10), Some(2)),
        )],
        Some(round(price * Expression::value(1.20), Some(2))),
    );
    let updated = Book::objects()
        .filter(Q::filter("publication_date", Lookup::Year(2025)))
        .annotate(
            "total_rating",
            Expression::f("rating") + Expression::related_field([BOOK_PUBLISHER], "rating"),
        )
        .filter(Q::filter("total_rating", Lookup::Gte(Value::Float(8.0))))
        .update(vec![("price", raised)])
        .update_exec(db)
        .await?;
    tracing::info!(updated, "book prices increased");

    if updated == 0 {
        Ok("No changes in price.".to_string())
    } else {
        Ok(format!("Prices increased for {updated} book/s."))
    }
}
