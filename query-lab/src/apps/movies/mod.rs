//! Directors, actors and movies: searches, rankings and a bulk rating bump.

pub mod models;

use query_lab_core::OrmResult;
use query_lab_db::query::expressions::{least, round};
use query_lab_db::{AggregateFunc, DbExecutor, Expression, Lookup, Model, OrderBy, Value, Q};

pub use models::{
    Actor, Director, DirectorManager, Genre, Movie, CAST, DIRECTOR_MOVIES, STARRING_ACTOR,
    STARRING_MOVIES,
};

use super::{exact, lines};

/// Creates the director, actor and movie tables and the cast junction.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(db, &[Director::meta(), Actor::meta(), Movie::meta()]).await
}

/// Directors whose name and/or nationality contain the search terms,
/// ignoring case, by name. Empty when no term is given.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_directors(
    db: &dyn DbExecutor,
    search_name: Option<&str>,
    search_nationality: Option<&str>,
) -> OrmResult<String> {
    let by_name = search_name.map(|n| Q::filter("full_name", Lookup::IContains(n.to_string())));
    let by_nationality =
        search_nationality.map(|n| Q::filter("nationality", Lookup::IContains(n.to_string())));
    let query = match (by_name, by_nationality) {
        (None, None) => return Ok(String::new()),
        (Some(q), None) | (None, Some(q)) => q,
        (Some(name), Some(nationality)) => name & nationality,
    };

    let directors = Director::objects()
        .filter(query)
        .order_by(vec![OrderBy::asc("full_name")])
        .execute_query(db)
        .await?;
    Ok(lines(directors.iter().map(|d| {
        format!(
            "Director: {}, nationality: {}, experience: {}",
            d.full_name, d.nationality, d.years_of_experience
        )
    })))
}

/// The director with the most movies.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_top_director(db: &dyn DbExecutor) -> OrmResult<String> {
    let Some(top) = Director::objects()
        .get_directors_by_movies_count()
        .first_annotated(db)
        .await?
    else {
        return Ok(String::new());
    };
    let movies: i64 = top.get("movies_count")?;
    Ok(format!(
        "Top Director: {}, movies: {movies}.",
        top.model.full_name
    ))
}

/// The actor starring in the most movies, with those movies and their
/// average rating. Empty when no actor stars in anything.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn get_top_actor(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Actor::objects()
        .all()
        .annotate("movies_count", Expression::related_count([STARRING_MOVIES]))
        .annotate(
            "avg_rating",
            Expression::related_aggregate(AggregateFunc::Avg, [STARRING_MOVIES], "rating"),
        )
        .order_by(vec![OrderBy::desc("movies_count"), OrderBy::asc("full_name")])
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(String::new());
    };
    if top.get::<i64>("movies_count")? == 0 {
        return Ok(String::new());
    }
    let avg_rating: f64 = top.get("avg_rating")?;

    let titles: Vec<String> = Movie::objects()
        .filter(exact("starring_actor_id", top.model.id))
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(db)
        .await?
        .into_iter()
        .map(|m| m.title)
        .collect();
    Ok(format!(
        "Top Actor: {}, starring in movies: {}, movies average rating: {avg_rating:.1}",
        top.model.full_name,
        titles.join(", ")
    ))
}

/// The three actors cast in the most movies.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_actors_by_movies_count(db: &dyn DbExecutor) -> OrmResult<String> {
    let actors = Actor::objects()
        .all()
        .annotate("movies_count", Expression::related_count([CAST.reverse()]))
        .order_by(vec![OrderBy::desc("movies_count"), OrderBy::asc("full_name")])
        .limit(3)
        .execute_annotated(db)
        .await?;
    match actors.first() {
        None => return Ok(String::new()),
        Some(first) if first.get::<i64>("movies_count")? == 0 => return Ok(String::new()),
        Some(_) => {}
    }

    let mut out = Vec::with_capacity(actors.len());
    for actor in &actors {
        let count: i64 = actor.get("movies_count")?;
        out.push(format!(
            "{}, participated in {count} movies",
            actor.model.full_name
        ));
    }
    Ok(lines(out))
}

/// The best rated awarded movie with its star and cast.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn get_top_rated_awarded_movie(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Movie::objects()
        .filter(exact("is_awarded", true))
        .annotate(
            "starring_actor_name",
            Expression::related_field([STARRING_ACTOR], "full_name"),
        )
        .order_by(vec![OrderBy::desc("rating"), OrderBy::asc("title")])
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(String::new());
    };
    let starring = top
        .get::<Option<String>>("starring_actor_name")?
        .unwrap_or_else(|| "N/A".to_string());

    let cast: Vec<String> = CAST
        .targets::<Actor>(top.model.id)
        .order_by(vec![OrderBy::asc("full_name")])
        .execute_query(db)
        .await?
        .into_iter()
        .map(|a| a.full_name)
        .collect();
    Ok(format!(
        "Top rated awarded movie: {}, rating: {:.1}. Starring actor: {starring}. Cast: {}.",
        top.model.title,
        top.model.rating,
        cast.join(", ")
    ))
}

/// Adds 0.1 to the rating of every classic rated below 10, capped at 10.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn increase_rating(db: &dyn DbExecutor) -> OrmResult<String> {
    let bumped = round(
        least(vec![
            Expression::f("rating") + Expression::value(0.1),
            Expression::value(10.0),
        ]),
        Some(1),
    );
    let updated = Movie::objects()
        .filter(exact("is_classic", true) & Q::filter("rating", Lookup::Lt(Value::Float(10.0))))
        .update(vec![("rating", bumped)])
        .update_exec(db)
        .await?;
    tracing::info!(updated, "classic movie ratings increased");

    if updated == 0 {
        Ok("No ratings increased.".to_string())
    } else {
        Ok(format!("Rating increased for {updated} movies."))
    }
}
