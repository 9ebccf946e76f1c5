//! Houses, dragons and quests: danger rankings, healing and quest results.

pub mod models;

use chrono::Datelike;
use query_lab_core::logging::exercise_span;
use query_lab_core::OrmResult;
use query_lab_db::query::expressions::round;
use query_lab_db::{
    delete_model, refresh_model, AggregateFunc, DbExecutor, Expression, Lookup, Model, OrderBy,
    Value, Q,
};
use tracing::Instrument;

pub use models::{
    Breath, Dragon, House, HouseManager, Quest, DRAGON_HOUSE, HOUSE_DRAGONS, QUEST_DRAGONS,
    QUEST_HOST,
};

use super::{exact, lines};

const NO_DATA: &str = "No relevant data.";

/// Creates the house, dragon and quest tables and the quest junction.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(db, &[House::meta(), Dragon::meta(), Quest::meta()]).await
}

fn strongest_first() -> Vec<OrderBy> {
    vec![OrderBy::desc("power"), OrderBy::asc("name")]
}

/// Houses whose name or motto start with `search`, ignoring case, most wins
/// first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_houses(db: &dyn DbExecutor, search: Option<&str>) -> OrmResult<String> {
    const NO_MATCH: &str = "No houses match your search.";
    let Some(search) = search.filter(|s| !s.is_empty()) else {
        return Ok(NO_MATCH.to_string());
    };
    let houses = House::objects()
        .filter(
            Q::filter("name", Lookup::IStartsWith(search.to_string()))
                | Q::filter("motto", Lookup::IStartsWith(search.to_string())),
        )
        .order_by(vec![OrderBy::desc("wins"), OrderBy::asc("name")])
        .execute_query(db)
        .await?;
    if houses.is_empty() {
        return Ok(NO_MATCH.to_string());
    }

    Ok(lines(houses.iter().map(|h| {
        format!(
            "House: {}, wins: {}, motto: {}",
            h.name,
            h.wins,
            h.motto.as_deref().unwrap_or("N/A")
        )
    })))
}

/// The house with the most dragons.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_most_dangerous_house(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = House::objects()
        .get_houses_by_dragons_count()
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(NO_DATA.to_string());
    };
    let dragons: i64 = top.get("dragons_count")?;
    if dragons == 0 {
        return Ok(NO_DATA.to_string());
    }
    let ruling = if top.model.is_ruling {
        "ruling"
    } else {
        "not ruling"
    };
    Ok(format!(
        "The most dangerous house is the House of {} with {dragons} dragons. Currently {ruling} the kingdom.",
        top.model.name
    ))
}

/// The strongest healthy dragon, its house and its quest count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_most_powerful_dragon(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Dragon::objects()
        .filter(exact("is_healthy", true))
        .annotate("house_name", Expression::related_field([DRAGON_HOUSE], "name"))
        .annotate(
            "quests_count",
            Expression::related_count([QUEST_DRAGONS.reverse()]),
        )
        .order_by(strongest_first())
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(NO_DATA.to_string());
    };
    let house: String = top.get("house_name")?;
    let quests: i64 = top.get("quests_count")?;
    let d = &top.model;
    Ok(format!(
        "The most powerful healthy dragon is {} with a power level of {:.1}, breath type {}, and {} wins, coming from the house of {house}. Currently participating in {quests} quests.",
        d.name, d.power, d.breath, d.wins
    ))
}

/// Heals every injured dragon stronger than the minimum, at the cost of 0.1
/// power.
///
/// # Errors
///
/// Returns an error if the update or the aggregate fails.
pub async fn update_dragons_data(db: &dyn DbExecutor) -> OrmResult<String> {
    let updated = Dragon::objects()
        .filter(exact("is_healthy", false) & Q::filter("power", Lookup::Gt(Value::Float(1.0))))
        .update(vec![
            (
                "power",
                round(Expression::f("power") - Expression::value(0.1), Some(1)),
            ),
            ("is_healthy", Expression::value(true)),
        ])
        .update_exec(db)
        .await?;
    tracing::info!(updated, "injured dragons healed");
    if updated == 0 {
        return Ok("No changes in dragons data.".to_string());
    }

    let min_power: f64 = Dragon::objects()
        .all()
        .aggregate_exec(
            db,
            vec![(
                "min_power",
                Expression::aggregate(AggregateFunc::Min, Expression::col("power")),
            )],
        )
        .await?
        .get("min_power")?;
    Ok(format!(
        "The data for {updated} dragon/s has been changed. The minimum power level among all dragons is {min_power:.1}"
    ))
}

/// The first quest to start, with its host and dragons.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn get_earliest_quest(db: &dyn DbExecutor) -> OrmResult<String> {
    let quest = Quest::objects()
        .all()
        .annotate("host_name", Expression::related_field([QUEST_HOST], "name"))
        .order_by(vec![OrderBy::asc("start_time"), OrderBy::asc("id")])
        .first_annotated(db)
        .await?;
    let Some(quest) = quest else {
        return Ok(NO_DATA.to_string());
    };
    let host: String = quest.get("host_name")?;
    let q = &quest.model;

    let dragons = QUEST_DRAGONS.targets::<Dragon>(q.id);
    let names: Vec<String> = dragons
        .clone()
        .order_by(strongest_first())
        .execute_query(db)
        .await?
        .into_iter()
        .map(|d| d.name)
        .collect();
    let avg_power: Option<f64> = dragons
        .aggregate_exec(
            db,
            vec![(
                "avg_power",
                Expression::aggregate(AggregateFunc::Avg, Expression::col("power")),
            )],
        )
        .await?
        .get("avg_power")?;

    let start = q.start_time;
    Ok(format!(
        "The earliest quest is: {}, code: {}, start date: {}.{}.{}, host: {host}. Dragons: {}. Average dragons power level: {:.2}",
        q.name,
        q.code,
        start.day(),
        start.month(),
        start.year(),
        names.join("*"),
        avg_power.unwrap_or(0.0)
    ))
}

/// Closes the quest with `code`: its strongest dragon and that dragon's
/// house each gain a win, and the quest is deleted.
///
/// # Errors
///
/// Returns an error if a query, update or delete fails.
pub async fn announce_quest_winner(db: &dyn DbExecutor, code: &str) -> OrmResult<String> {
    announce_winner(db, code)
        .instrument(exercise_span("announce_quest_winner"))
        .await
}

async fn announce_winner(db: &dyn DbExecutor, code: &str) -> OrmResult<String> {
    let Some(quest) = Quest::objects()
        .filter(exact("code", code))
        .first_exec(db)
        .await?
    else {
        return Ok("No such quest.".to_string());
    };
    let Some(mut dragon) = QUEST_DRAGONS
        .targets::<Dragon>(quest.id)
        .order_by(strongest_first())
        .first_exec(db)
        .await?
    else {
        return Ok(NO_DATA.to_string());
    };

    let one_more_win = || vec![("wins", Expression::f("wins") + Expression::value(1))];
    Dragon::objects()
        .filter(exact("id", dragon.id))
        .update(one_more_win())
        .update_exec(db)
        .await?;
    House::objects()
        .filter(exact("id", dragon.house_id))
        .update(one_more_win())
        .update_exec(db)
        .await?;
    refresh_model(&mut dragon, db).await?;
    let house = House::objects()
        .filter(exact("id", dragon.house_id))
        .get_exec(db)
        .await?;

    delete_model(&quest, db).await?;
    tracing::info!(quest = %quest.name, dragon = %dragon.name, "quest won");

    Ok(format!(
        "The quest: {} has been won by dragon {} from house {}. The number of wins has been updated as follows: {} total wins for the dragon and {} total wins for the house. The house was awarded with {:.2} coins.",
        quest.name, dragon.name, house.name, dragon.wins, house.wins, quest.reward
    ))
}
