//! One model per exercise: create, read back, update in place and delete.

pub mod models;

use query_lab_core::OrmResult;
use query_lab_db::{
    bulk_update, create_model, delete_model, save_model, DbExecutor, Expression, Lookup, Model,
    OrderBy, QuerySet, Q, Value,
};

pub use models::{Artifact, Car, HotelRoom, Location, Pet, RoomType, Task};

/// Creates every `basics_*` table.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(
        db,
        &[
            Pet::meta(),
            Artifact::meta(),
            Location::meta(),
            Car::meta(),
            Task::meta(),
            HotelRoom::meta(),
        ],
    )
    .await
}

// ── Pets and artifacts ─────────────────────────────────────────────────

/// Inserts a pet and describes it.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn create_pet(db: &dyn DbExecutor, name: &str, species: &str) -> OrmResult<String> {
    let mut pet = Pet {
        id: 0,
        name: name.to_string(),
        species: species.to_string(),
    };
    create_model(&mut pet, db).await?;
    Ok(format!("{} is a very cute {}!", pet.name, pet.species))
}

/// Inserts an artifact and reports its age.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn create_artifact(
    db: &dyn DbExecutor,
    name: &str,
    origin: &str,
    age: i64,
    description: &str,
    is_magical: bool,
) -> OrmResult<String> {
    let mut artifact = Artifact {
        id: 0,
        name: name.to_string(),
        origin: origin.to_string(),
        age,
        description: description.to_string(),
        is_magical,
    };
    create_model(&mut artifact, db).await?;
    Ok(format!(
        "The artifact {} is {} years old!",
        artifact.name, artifact.age
    ))
}

/// Renames an old magical artifact. Other artifacts are left untouched.
///
/// # Errors
///
/// Returns an error if the save fails.
pub async fn rename_artifact(
    db: &dyn DbExecutor,
    artifact: &mut Artifact,
    new_name: &str,
) -> OrmResult<()> {
    if artifact.age > 250 && artifact.is_magical {
        artifact.name = new_name.to_string();
        save_model(artifact, db).await?;
    }
    Ok(())
}

/// Deletes every artifact.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn delete_all_artifacts(db: &dyn DbExecutor) -> OrmResult<()> {
    Artifact::objects().all().delete().delete_exec(db).await?;
    Ok(())
}

// ── Locations ──────────────────────────────────────────────────────────

/// Every location, newest first, with its population.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn show_all_locations(db: &dyn DbExecutor) -> OrmResult<String> {
    let locations = Location::objects()
        .all()
        .order_by(vec![OrderBy::desc("id")])
        .execute_query(db)
        .await?;
    Ok(locations
        .iter()
        .map(|l| format!("{} has a population of {}!", l.name, l.population))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Marks the first location as a capital. Does nothing on an empty table.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn new_capital(db: &dyn DbExecutor) -> OrmResult<()> {
    if let Some(mut first) = Location::objects().all().first_exec(db).await? {
        first.is_capital = true;
        save_model(&mut first, db).await?;
    }
    Ok(())
}

/// The capital locations.
pub fn get_capitals() -> QuerySet<Location> {
    Location::objects().filter(Q::filter("is_capital", Lookup::Exact(Value::Bool(true))))
}

/// Deletes the first location, if any.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn delete_first_location(db: &dyn DbExecutor) -> OrmResult<()> {
    if let Some(first) = Location::objects().all().first_exec(db).await? {
        delete_model(&first, db).await?;
    }
    Ok(())
}

// ── Cars ───────────────────────────────────────────────────────────────

fn digit_sum(year: i64) -> i64 {
    year.abs()
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(i64::from)
        .sum()
}

/// Discounts every car by the digit sum of its year, as a percentage.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn apply_discount(db: &dyn DbExecutor) -> OrmResult<()> {
    let cars = Car::objects().all().execute_query(db).await?;
    for mut car in cars {
        let discount = digit_sum(car.year) as f64 / 100.0;
        car.price_with_discount = car.price * (1.0 - discount);
        save_model(&mut car, db).await?;
    }
    Ok(())
}

/// `(model, price_with_discount)` of every car newer than 2020.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_recent_cars(db: &dyn DbExecutor) -> OrmResult<Vec<(String, f64)>> {
    let rows = Car::objects()
        .filter(Q::filter("year", Lookup::Gt(Value::Int(2020))))
        .values(&["model", "price_with_discount"])
        .values_exec(db)
        .await?;
    rows.iter()
        .map(|row| -> OrmResult<(String, f64)> {
            Ok((row.get("model")?, row.get("price_with_discount")?))
        })
        .collect()
}

/// Deletes the last car, if any.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn delete_last_car(db: &dyn DbExecutor) -> OrmResult<()> {
    if let Some(last) = Car::objects().all().last_exec(db).await? {
        delete_model(&last, db).await?;
    }
    Ok(())
}

// ── Tasks ──────────────────────────────────────────────────────────────

/// Every unfinished task with its deadline.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn show_unfinished_tasks(db: &dyn DbExecutor) -> OrmResult<String> {
    let tasks = Task::objects()
        .filter(Q::filter("is_finished", Lookup::Exact(Value::Bool(false))))
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(db)
        .await?;
    Ok(tasks
        .iter()
        .map(|t| format!("Task - {} needs to be done until {}!", t.title, t.due_date))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Marks every task with an odd id as finished.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn complete_odd_tasks(db: &dyn DbExecutor) -> OrmResult<()> {
    let odd: Vec<Task> = Task::objects()
        .all()
        .execute_query(db)
        .await?
        .into_iter()
        .filter(|t| t.id % 2 != 0)
        .map(|mut t| {
            t.is_finished = true;
            t
        })
        .collect();
    bulk_update(&odd, &["is_finished"], db).await?;
    Ok(())
}

/// Shifts every character of `text` down by three code points.
///
/// Characters that would fall outside the valid range are kept as they are.
pub fn encode(text: &str) -> String {
    text.chars()
        .map(|c| {
            u32::from(c)
                .checked_sub(3)
                .and_then(char::from_u32)
                .unwrap_or(c)
        })
        .collect()
}

/// Replaces the description of every task titled `task_title` with the
/// encoded `text`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn encode_and_replace(
    db: &dyn DbExecutor,
    text: &str,
    task_title: &str,
) -> OrmResult<()> {
    Task::objects()
        .filter(Q::filter("title", Lookup::Exact(Value::from(task_title))))
        .update(vec![("description", Expression::value(encode(text)))])
        .update_exec(db)
        .await?;
    Ok(())
}

// ── Hotel rooms ────────────────────────────────────────────────────────

/// Deluxe rooms with an even id and their nightly price.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_deluxe_rooms(db: &dyn DbExecutor) -> OrmResult<String> {
    let rooms = HotelRoom::objects()
        .filter(Q::filter("room_type", Lookup::Exact(RoomType::Deluxe.into())))
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(db)
        .await?;
    Ok(rooms
        .iter()
        .filter(|r| r.id % 2 == 0)
        .map(|r| {
            format!(
                "Deluxe room with number {} costs {:.2}$ per night!",
                r.room_number, r.price_per_night
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Grows the capacity of reserved rooms in id order: the first by its own
/// id, each later one by the new capacity of the room before it.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn increase_room_capacity(db: &dyn DbExecutor) -> OrmResult<()> {
    let rooms = HotelRoom::objects()
        .filter(Q::filter("is_reserved", Lookup::Exact(Value::Bool(true))))
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(db)
        .await?;
    let mut previous: Option<i64> = None;
    for mut room in rooms {
        room.capacity += previous.unwrap_or(room.id);
        previous = Some(room.capacity);
        save_model(&mut room, db).await?;
    }
    Ok(())
}

/// Reserves the first room, if any.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn reserve_first_room(db: &dyn DbExecutor) -> OrmResult<()> {
    if let Some(mut room) = HotelRoom::objects().all().first_exec(db).await? {
        room.is_reserved = true;
        save_model(&mut room, db).await?;
    }
    Ok(())
}

/// Deletes the last room unless it is reserved.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn delete_last_room(db: &dyn DbExecutor) -> OrmResult<()> {
    match HotelRoom::objects().all().last_exec(db).await? {
        Some(room) if !room.is_reserved => {
            delete_model(&room, db).await?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_sum() {
        assert_eq!(digit_sum(2014), 7);
        assert_eq!(digit_sum(1999), 28);
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("Zdvk#wkh#glvkhv$"), "Wash the dishes!");
        assert_eq!(encode("\u{1}a"), "\u{1}^");
    }
}
