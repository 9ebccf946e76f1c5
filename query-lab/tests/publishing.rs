mod common;

use query_lab::apps::publishing::{self, Author, Book, Publisher, CO_AUTHORS};
use query_lab_db::{create_model, Model, OrderBy};
use query_lab_db_backends::SqliteBackend;

async fn publisher(db: &SqliteBackend, name: &str, country: Option<&str>, rating: f64) -> Publisher {
    let mut p = Publisher::new(name);
    if let Some(country) = country {
        p.country = country.to_string();
    }
    p.rating = rating;
    create_model(&mut p, db).await.unwrap();
    p
}

async fn author(db: &SqliteBackend, name: &str) -> Author {
    let mut a = Author::new(name);
    create_model(&mut a, db).await.unwrap();
    a
}

#[allow(clippy::too_many_arguments)]
async fn book(
    db: &SqliteBackend,
    title: &str,
    published: (i32, u32, u32),
    price: f64,
    publisher: &Publisher,
    main_author: &Author,
    rating: f64,
    bestseller: bool,
    co_authors: &[&Author],
) -> Book {
    let (y, m, d) = published;
    let mut b = Book::new(title, common::date(y, m, d), price, publisher.id, main_author.id);
    b.rating = rating;
    b.is_bestseller = bestseller;
    create_model(&mut b, db).await.unwrap();
    let ids: Vec<i64> = co_authors.iter().map(|a| a.id).collect();
    CO_AUTHORS.add(db, b.id, &ids).await.unwrap();
    b
}

async fn seed(db: &SqliteBackend) {
    let penguin = publisher(db, "Penguin", Some("UK"), 4.5).await;
    let harper = publisher(db, "Harper", None, 4.0).await;
    publisher(db, "Pan Macmillan", Some("UK"), 4.5).await;

    let alice = author(db, "Alice").await;
    let bob = author(db, "Bob").await;
    let carol = author(db, "Carol").await;
    author(db, "Dave").await;

    book(db, "Alpha", (2025, 3, 1), 60.0, &penguin, &alice, 4.0, true, &[&bob, &carol]).await;
    book(db, "Beta", (2025, 5, 1), 20.0, &penguin, &alice, 3.0, false, &[&bob]).await;
    book(db, "Gamma", (2024, 1, 1), 30.0, &harper, &bob, 5.0, true, &[]).await;
    book(db, "Delta", (2025, 6, 1), 40.0, &harper, &carol, 4.0, false, &[]).await;
}

#[tokio::test]
async fn test_empty_database() {
    let db = common::setup().await;
    assert_eq!(
        publishing::get_publishers(&db, None).await.unwrap(),
        "No search criteria."
    );
    assert_eq!(
        publishing::get_publishers(&db, Some("uk")).await.unwrap(),
        "No publishers found."
    );
    assert_eq!(
        publishing::get_top_publisher(&db).await.unwrap(),
        "No publishers found."
    );
    assert_eq!(publishing::get_top_main_author(&db).await.unwrap(), "No results.");
    assert_eq!(
        publishing::get_authors_by_books_count(&db).await.unwrap(),
        "No results."
    );
    assert_eq!(publishing::get_bestseller(&db).await.unwrap(), "No results.");
    assert_eq!(
        publishing::increase_price(&db).await.unwrap(),
        "No changes in price."
    );
}

#[tokio::test]
async fn test_get_publishers() {
    let db = common::setup().await;
    seed(&db).await;

    assert_eq!(
        publishing::get_publishers(&db, Some("uk")).await.unwrap(),
        "Publisher: Pan Macmillan, country: UK, rating: 4.5\n\
         Publisher: Penguin, country: UK, rating: 4.5"
    );
    assert_eq!(
        publishing::get_publishers(&db, Some("HARP")).await.unwrap(),
        "Publisher: Harper, country: Unknown, rating: 4.0"
    );
    assert_eq!(
        publishing::get_publishers(&db, Some("nowhere")).await.unwrap(),
        "No publishers found."
    );
}

#[tokio::test]
async fn test_top_publisher_breaks_ties_by_name() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        publishing::get_top_publisher(&db).await.unwrap(),
        "Top Publisher: Harper with 2 books."
    );
}

#[tokio::test]
async fn test_top_main_author() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        publishing::get_top_main_author(&db).await.unwrap(),
        "Top Author: Alice, own book titles: Alpha, Beta, books average rating: 3.5"
    );
}

#[tokio::test]
async fn test_authors_by_books_count_includes_co_authored() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        publishing::get_authors_by_books_count(&db).await.unwrap(),
        "Bob authored 3 books.\nAlice authored 2 books.\nCarol authored 2 books."
    );
}

#[tokio::test]
async fn test_bestseller() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        publishing::get_bestseller(&db).await.unwrap(),
        "Top bestseller: Alpha, index: 7.0. Main author: Alice. Co-authors: Bob/Carol."
    );
}

#[tokio::test]
async fn test_bestseller_without_co_authors() {
    let db = common::setup().await;
    let publisher = publisher(&db, "Indie", None, 1.0).await;
    let author = author(&db, "Solo").await;
    book(&db, "Lonely", (2020, 1, 1), 10.0, &publisher, &author, 4.2, true, &[]).await;
    assert_eq!(
        publishing::get_bestseller(&db).await.unwrap(),
        "Top bestseller: Lonely, index: 5.2. Main author: Solo. Co-authors: N/A."
    );
}

#[tokio::test]
async fn test_increase_price() {
    let db = common::setup().await;
    seed(&db).await;

    assert_eq!(
        publishing::increase_price(&db).await.unwrap(),
        "Prices increased for 2 book/s."
    );
    let prices: Vec<(String, f64)> = Book::objects()
        .all()
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|b| (b.title, b.price))
        .collect();
    assert_eq!(
        prices,
        vec![
            ("Alpha".to_string(), 66.0),
            ("Beta".to_string(), 20.0),
            ("Gamma".to_string(), 30.0),
            ("Delta".to_string(), 48.0),
        ]
    );
}

#[tokio::test]
async fn test_increase_price_at_thresholds() {
    let db = common::setup().await;
    let harper = publisher(&db, "Harper", None, 4.0).await;
    let alice = author(&db, "Alice").await;
    book(&db, "Even", (2025, 2, 1), 50.0, &harper, &alice, 4.0, false, &[]).await;
    book(&db, "Short", (2025, 2, 1), 50.0, &harper, &alice, 3.5, false, &[]).await;

    assert_eq!(
        publishing::increase_price(&db).await.unwrap(),
        "Prices increased for 1 book/s."
    );
    let prices: Vec<(String, f64)> = Book::objects()
        .all()
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|b| (b.title, b.price))
        .collect();
    assert_eq!(
        prices,
        vec![("Even".to_string(), 60.0), ("Short".to_string(), 50.0)]
    );
}
