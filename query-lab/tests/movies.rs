mod common;

use query_lab::apps::movies::{self, Actor, Director, Movie, CAST};
use query_lab_db::{create_model, Lookup, Model, Q};
use query_lab_db_backends::SqliteBackend;

async fn director(db: &SqliteBackend, name: &str, nationality: &str, years: i64) -> Director {
    let mut d = Director::new(name);
    d.nationality = nationality.to_string();
    d.years_of_experience = years;
    create_model(&mut d, db).await.unwrap();
    d
}

async fn actor(db: &SqliteBackend, name: &str) -> Actor {
    let mut a = Actor::new(name);
    create_model(&mut a, db).await.unwrap();
    a
}

struct MovieSpec<'a> {
    title: &'a str,
    director: &'a Director,
    star: Option<&'a Actor>,
    rating: f64,
    classic: bool,
    awarded: bool,
    cast: &'a [&'a Actor],
}

async fn movie(db: &SqliteBackend, spec: MovieSpec<'_>) -> Movie {
    let mut m = Movie::new(spec.title, common::date(2010, 7, 16), spec.director.id);
    m.starring_actor_id = spec.star.map(|a| a.id);
    m.rating = spec.rating;
    m.is_classic = spec.classic;
    m.is_awarded = spec.awarded;
    create_model(&mut m, db).await.unwrap();
    let ids: Vec<i64> = spec.cast.iter().map(|a| a.id).collect();
    CAST.add(db, m.id, &ids).await.unwrap();
    m
}

async fn seed(db: &SqliteBackend) {
    let nolan = director(db, "Christopher Nolan", "British", 25).await;
    director(db, "Kathryn Bigelow", "American", 40).await;
    let spielberg = director(db, "Steven Spielberg", "American", 50).await;

    let leo = actor(db, "Leonardo DiCaprio").await;
    let tom = actor(db, "Tom Hardy").await;
    actor(db, "Meryl Streep").await;

    movie(
        db,
        MovieSpec {
            title: "Inception",
            director: &nolan,
            star: Some(&leo),
            rating: 8.8,
            classic: true,
            awarded: true,
            cast: &[&leo, &tom],
        },
    )
    .await;
    movie(
        db,
        MovieSpec {
            title: "Dunkirk",
            director: &nolan,
            star: Some(&tom),
            rating: 7.8,
            classic: false,
            awarded: false,
            cast: &[&tom],
        },
    )
    .await;
    movie(
        db,
        MovieSpec {
            title: "Catch Me If You Can",
            director: &spielberg,
            star: Some(&leo),
            rating: 8.0,
            classic: true,
            awarded: false,
            cast: &[],
        },
    )
    .await;
    movie(
        db,
        MovieSpec {
            title: "Jurassic Park",
            director: &spielberg,
            star: None,
            rating: 10.0,
            classic: true,
            awarded: false,
            cast: &[],
        },
    )
    .await;
}

#[tokio::test]
async fn test_empty_database() {
    let db = common::setup().await;
    assert_eq!(movies::get_directors(&db, None, None).await.unwrap(), "");
    assert_eq!(movies::get_top_director(&db).await.unwrap(), "");
    assert_eq!(movies::get_top_actor(&db).await.unwrap(), "");
    assert_eq!(movies::get_actors_by_movies_count(&db).await.unwrap(), "");
    assert_eq!(movies::get_top_rated_awarded_movie(&db).await.unwrap(), "");
    assert_eq!(movies::increase_rating(&db).await.unwrap(), "No ratings increased.");
}

#[tokio::test]
async fn test_get_directors() {
    let db = common::setup().await;
    seed(&db).await;

    assert_eq!(movies::get_directors(&db, None, None).await.unwrap(), "");
    assert_eq!(
        movies::get_directors(&db, None, Some("amer")).await.unwrap(),
        "Director: Kathryn Bigelow, nationality: American, experience: 40\n\
         Director: Steven Spielberg, nationality: American, experience: 50"
    );
    assert_eq!(
        movies::get_directors(&db, Some("SPIEL"), Some("american"))
            .await
            .unwrap(),
        "Director: Steven Spielberg, nationality: American, experience: 50"
    );
    assert_eq!(
        movies::get_directors(&db, Some("nolan"), Some("american"))
            .await
            .unwrap(),
        ""
    );
}

#[tokio::test]
async fn test_top_director_breaks_ties_by_name() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        movies::get_top_director(&db).await.unwrap(),
        "Top Director: Christopher Nolan, movies: 2."
    );
}

#[tokio::test]
async fn test_top_actor() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        movies::get_top_actor(&db).await.unwrap(),
        "Top Actor: Leonardo DiCaprio, starring in movies: Inception, Catch Me If You Can, \
         movies average rating: 8.4"
    );
}

#[tokio::test]
async fn test_actors_by_movies_count() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        movies::get_actors_by_movies_count(&db).await.unwrap(),
        "Tom Hardy, participated in 2 movies\n\
         Leonardo DiCaprio, participated in 1 movies\n\
         Meryl Streep, participated in 0 movies"
    );
}

#[tokio::test]
async fn test_top_rated_awarded_movie() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        movies::get_top_rated_awarded_movie(&db).await.unwrap(),
        "Top rated awarded movie: Inception, rating: 8.8. Starring actor: Leonardo DiCaprio. \
         Cast: Leonardo DiCaprio, Tom Hardy."
    );
}

#[tokio::test]
async fn test_awarded_movie_without_star() {
    let db = common::setup().await;
    let director = director(&db, "Greta Gerwig", "American", 15).await;
    movie(
        &db,
        MovieSpec {
            title: "Little Women",
            director: &director,
            star: None,
            rating: 7.8,
            classic: false,
            awarded: true,
            cast: &[],
        },
    )
    .await;
    assert_eq!(
        movies::get_top_rated_awarded_movie(&db).await.unwrap(),
        "Top rated awarded movie: Little Women, rating: 7.8. Starring actor: N/A. Cast: ."
    );
}

#[tokio::test]
async fn test_increase_rating_skips_perfect_scores() {
    let db = common::setup().await;
    seed(&db).await;
    assert_eq!(
        movies::increase_rating(&db).await.unwrap(),
        "Rating increased for 2 movies."
    );

    let inception = Movie::objects()
        .filter(Q::filter("title", Lookup::Exact("Inception".into())))
        .get_exec(&db)
        .await
        .unwrap();
    assert!((inception.rating - 8.9).abs() < 1e-9);
    let jurassic = Movie::objects()
        .filter(Q::filter("title", Lookup::Exact("Jurassic Park".into())))
        .get_exec(&db)
        .await
        .unwrap();
    assert!((jurassic.rating - 10.0).abs() < 1e-9);
}
