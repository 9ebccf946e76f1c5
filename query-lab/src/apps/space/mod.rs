//! Astronauts, spacecraft and missions: crew rankings, mission reports and
//! a weight reduction.

pub mod models;

use query_lab_core::OrmResult;
use query_lab_db::query::expressions::coalesce;
use query_lab_db::{AggregateFunc, DbExecutor, Expression, Lookup, Model, OrderBy, Value, Q};

pub use models::{
    Astronaut, AstronautManager, Mission, MissionStatus, Spacecraft, COMMANDED_MISSIONS, CREW,
    MISSION_COMMANDER, MISSION_SPACECRAFT, SPACECRAFT_MISSIONS,
};

use super::{exact, lines};

const NO_DATA: &str = "No data.";

/// Creates the astronaut, spacecraft and mission tables and the crew
/// junction.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(db, &[Astronaut::meta(), Spacecraft::meta(), Mission::meta()])
        .await
}

/// Astronauts whose name or phone number contain `search`, ignoring case,
/// by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_astronauts(db: &dyn DbExecutor, search: Option<&str>) -> OrmResult<String> {
    let Some(search) = search else {
        return Ok(String::new());
    };
    let astronauts = Astronaut::objects()
        .filter(
            Q::filter("name", Lookup::IContains(search.to_string()))
                | Q::filter("phone_number", Lookup::IContains(search.to_string())),
        )
        .order_by(vec![OrderBy::asc("name")])
        .execute_query(db)
        .await?;
    Ok(lines(astronauts.iter().map(|a| {
        format!(
            "Astronaut: {}, phone number: {}, status: {}",
            a.name,
            a.phone_number,
            if a.is_active { "Active" } else { "Inactive" }
        )
    })))
}

/// The astronaut on the most missions.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_top_astronaut(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Astronaut::objects()
        .get_astronauts_by_missions_count()
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(NO_DATA.to_string());
    };
    let missions: i64 = top.get("missions_count")?;
    if missions == 0 {
        return Ok(NO_DATA.to_string());
    }
    Ok(format!(
        "Top Astronaut: {} with {missions} missions.",
        top.model.name
    ))
}

/// The astronaut who commanded the most missions.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_top_commander(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Astronaut::objects()
        .all()
        .annotate(
            "commanded_missions_count",
            Expression::related_count([COMMANDED_MISSIONS]),
        )
        .order_by(vec![
            OrderBy::desc("commanded_missions_count"),
            OrderBy::asc("phone_number"),
        ])
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(NO_DATA.to_string());
    };
    let commanded: i64 = top.get("commanded_missions_count")?;
    if commanded == 0 {
        return Ok(NO_DATA.to_string());
    }
    Ok(format!(
        "Top Commander: {} with {commanded} commanded missions.",
        top.model.name
    ))
}

/// The most recently launched completed mission with its crew.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn get_last_completed_mission(db: &dyn DbExecutor) -> OrmResult<String> {
    let mission = Mission::objects()
        .filter(exact("status", MissionStatus::Completed))
        .annotate(
            "commander_name",
            Expression::related_field([MISSION_COMMANDER], "name"),
        )
        .annotate(
            "spacecraft_name",
            Expression::related_field([MISSION_SPACECRAFT], "name"),
        )
        .order_by(vec![OrderBy::desc("launch_date"), OrderBy::desc("id")])
        .first_annotated(db)
        .await?;
    let Some(mission) = mission else {
        return Ok(NO_DATA.to_string());
    };
    let commander = mission
        .get::<Option<String>>("commander_name")?
        .unwrap_or_else(|| "TBA".to_string());
    let spacecraft: String = mission.get("spacecraft_name")?;

    let crew = CREW.targets::<Astronaut>(mission.model.id);
    let names: Vec<String> = crew
        .clone()
        .order_by(vec![OrderBy::asc("name")])
        .execute_query(db)
        .await?
        .into_iter()
        .map(|a| a.name)
        .collect();
    let spacewalks: i64 = crew
        .aggregate_exec(
            db,
            vec![(
                "total",
                coalesce(vec![
                    Expression::aggregate(AggregateFunc::Sum, Expression::col("spacewalks")),
                    Expression::value(0),
                ]),
            )],
        )
        .await?
        .get("total")?;

    Ok(format!(
        "The last completed mission is: {}. Commander: {commander}. Astronauts: {}. Spacecraft: {spacecraft}. Total spacewalks: {spacewalks}.",
        mission.model.name,
        names.join(", ")
    ))
}

/// The spacecraft used in the most missions and how many astronauts flew
/// in it.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_most_used_spacecraft(db: &dyn DbExecutor) -> OrmResult<String> {
    let top = Spacecraft::objects()
        .all()
        .annotate(
            "missions_count",
            Expression::related_count([SPACECRAFT_MISSIONS]),
        )
        .annotate(
            "astronauts_count",
            Expression::related_count([SPACECRAFT_MISSIONS, CREW.forward()]).distinct(),
        )
        .order_by(vec![OrderBy::desc("missions_count"), OrderBy::asc("name")])
        .first_annotated(db)
        .await?;
    let Some(top) = top else {
        return Ok(NO_DATA.to_string());
    };
    let missions: i64 = top.get("missions_count")?;
    if missions == 0 {
        return Ok(NO_DATA.to_string());
    }
    let astronauts: i64 = top.get("astronauts_count")?;
    Ok(format!(
        "The most used spacecraft is: {}, manufactured by {}, used in {missions} missions, astronauts on missions: {astronauts}.",
        top.model.name, top.model.manufacturer
    ))
}

/// Takes 200 off every spacecraft heavier than 200 assigned to a planned mission.
///
/// # Errors
///
/// Returns an error if the update or the aggregate fails.
pub async fn decrease_spacecrafts_weight(db: &dyn DbExecutor) -> OrmResult<String> {
    let updated = Spacecraft::objects()
        .filter(
            Q::filter("weight", Lookup::Gt(Value::Float(200.0)))
                & Q::related(
                    [SPACECRAFT_MISSIONS],
                    exact("status", MissionStatus::Planned),
                ),
        )
        .update(vec![(
            "weight",
            Expression::f("weight") - Expression::value(200.0),
        )])
        .update_exec(db)
        .await?;
    tracing::info!(updated, "spacecraft weight decreased");
    if updated == 0 {
        return Ok("No changes in weight.".to_string());
    }

    let avg_weight: f64 = Spacecraft::objects()
        .all()
        .aggregate_exec(
            db,
            vec![(
                "avg_weight",
                Expression::aggregate(AggregateFunc::Avg, Expression::col("weight")),
            )],
        )
        .await?
        .get("avg_weight")?;
    Ok(format!(
        "The weight of {updated} spacecrafts has been decreased. The new average weight of all spacecrafts is {avg_weight:.1}kg"
    ))
}
