//! Bulk creation, filtered updates and `CASE` rewrites over flat tables.

pub mod models;

use query_lab_core::OrmResult;
use query_lab_db::{
    bulk_create, DbExecutor, Expression, Lookup, Model, OrderBy, QuerySet, Value, When, Q,
};

pub use models::{
    ArtworkGallery, ChessPlayer, Dungeon, DungeonDifficulty, Laptop, LaptopBrand, Meal,
    MealType, OperationSystem, Workout, WorkoutType, NO_TITLE,
};

use super::{exact, lines, one_of};

/// Creates every `catalog_*` table.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(
        db,
        &[
            ArtworkGallery::meta(),
            Laptop::meta(),
            ChessPlayer::meta(),
            Meal::meta(),
            Dungeon::meta(),
            Workout::meta(),
        ],
    )
    .await
}

/// `CASE` over `field` that keeps the current value when no branch matches.
fn case_or_keep(field: &str, whens: Vec<When>) -> Expression {
    Expression::case(whens, Some(Expression::f(field)))
}

// ── Artworks ───────────────────────────────────────────────────────────

/// The best rated artwork; the earliest one wins a tie.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn show_highest_rated_art(db: &dyn DbExecutor) -> OrmResult<String> {
    let best = ArtworkGallery::objects()
        .all()
        .order_by(vec![OrderBy::desc("rating"), OrderBy::asc("id")])
        .first_exec(db)
        .await?;
    Ok(best.map_or_else(String::new, |art| {
        format!(
            "{} is the highest-rated art with a {} rating!",
            art.art_name, art.rating
        )
    }))
}

/// Inserts two artworks in one statement.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn bulk_create_arts(
    db: &dyn DbExecutor,
    first_art: ArtworkGallery,
    second_art: ArtworkGallery,
) -> OrmResult<()> {
    bulk_create(&mut [first_art, second_art], db).await?;
    Ok(())
}

/// Deletes every artwork rated below zero.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn delete_negative_rated_arts(db: &dyn DbExecutor) -> OrmResult<()> {
    ArtworkGallery::objects()
        .filter(Q::filter("rating", Lookup::Lt(Value::Int(0))))
        .delete()
        .delete_exec(db)
        .await?;
    Ok(())
}

// ── Laptops ────────────────────────────────────────────────────────────

/// The priciest laptop; the newest one wins a tie.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn show_the_most_expensive_laptop(db: &dyn DbExecutor) -> OrmResult<String> {
    let laptop = Laptop::objects()
        .all()
        .order_by(vec![OrderBy::desc("price"), OrderBy::desc("id")])
        .first_exec(db)
        .await?;
    Ok(laptop.map_or_else(String::new, |l| {
        format!(
            "{} is the most expensive laptop available for {:.2}$!",
            l.brand, l.price
        )
    }))
}

/// Inserts the given laptops in one statement.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn bulk_create_laptops(db: &dyn DbExecutor, laptops: Vec<Laptop>) -> OrmResult<()> {
    let mut laptops = laptops;
    bulk_create(&mut laptops, db).await?;
    Ok(())
}

/// Upgrades Asus and Lenovo laptops to at least 512 GB of storage.
///
/// # Errors
///
/// Returns an error if the update fails.
#[allow(non_snake_case)]
pub async fn update_to_512_GB_storage(db: &dyn DbExecutor) -> OrmResult<()> {
    Laptop::objects()
        .filter(one_of("brand", [LaptopBrand::Asus, LaptopBrand::Lenovo]))
        .filter(Q::filter("storage", Lookup::Lt(Value::Int(512))))
        .update(vec![("storage", Expression::value(512))])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Upgrades Apple, Dell and Acer laptops to at least 16 GB of memory.
///
/// # Errors
///
/// Returns an error if the update fails.
#[allow(non_snake_case)]
pub async fn update_to_16_GB_memory(db: &dyn DbExecutor) -> OrmResult<()> {
    Laptop::objects()
        .filter(one_of(
            "brand",
            [LaptopBrand::Apple, LaptopBrand::Dell, LaptopBrand::Acer],
        ))
        .filter(Q::filter("memory", Lookup::Lt(Value::Int(16))))
        .update(vec![("memory", Expression::value(16))])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Installs each brand's usual operating system.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn update_operation_systems(db: &dyn DbExecutor) -> OrmResult<()> {
    let os = case_or_keep(
        "operation_system",
        vec![
            When::new(exact("brand", LaptopBrand::Asus), OperationSystem::Windows.as_str()),
            When::new(exact("brand", LaptopBrand::Apple), OperationSystem::MacOs.as_str()),
            When::new(exact("brand", LaptopBrand::Lenovo), OperationSystem::ChromeOs.as_str()),
            When::new(
                one_of("brand", [LaptopBrand::Dell, LaptopBrand::Acer]),
                OperationSystem::Linux.as_str(),
            ),
        ],
    );
    Laptop::objects()
        .all()
        .update(vec![("operation_system", os)])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Deletes every laptop cheaper than 1200.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn delete_inexpensive_laptops(db: &dyn DbExecutor) -> OrmResult<()> {
    Laptop::objects()
        .filter(Q::filter("price", Lookup::Lt(Value::Float(1200.0))))
        .delete()
        .delete_exec(db)
        .await?;
    Ok(())
}

// ── Chess players ──────────────────────────────────────────────────────

/// Inserts the given players in one statement.
///
/// # Errors
///
/// Returns an error if the insert fails, e.g. on a duplicate username.
pub async fn bulk_create_chess_players(
    db: &dyn DbExecutor,
    players: Vec<ChessPlayer>,
) -> OrmResult<()> {
    let mut players = players;
    bulk_create(&mut players, db).await?;
    Ok(())
}

/// Deletes every untitled player.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn delete_chess_players(db: &dyn DbExecutor) -> OrmResult<()> {
    ChessPlayer::objects()
        .filter(exact("title", NO_TITLE))
        .delete()
        .delete_exec(db)
        .await?;
    Ok(())
}

async fn set_players(
    db: &dyn DbExecutor,
    players: QuerySet<ChessPlayer>,
    column: &str,
    value: impl Into<Value>,
) -> OrmResult<()> {
    let updated = players
        .update(vec![(column, Expression::value(value))])
        .update_exec(db)
        .await?;
    tracing::info!(column, updated, "chess players updated");
    Ok(())
}

/// Grandmasters are credited with 30 won games.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn change_chess_games_won(db: &dyn DbExecutor) -> OrmResult<()> {
    set_players(db, ChessPlayer::objects().filter(exact("title", "GM")), "games_won", 30).await
}

/// Untitled players are charged with 25 lost games.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn change_chess_games_lost(db: &dyn DbExecutor) -> OrmResult<()> {
    set_players(
        db,
        ChessPlayer::objects().filter(exact("title", NO_TITLE)),
        "games_lost",
        25,
    )
    .await
}

/// Every player gets 10 drawn games.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn change_chess_games_drawn(db: &dyn DbExecutor) -> OrmResult<()> {
    set_players(db, ChessPlayer::objects().all(), "games_drawn", 10).await
}

fn rated_between(low: i64, high: i64) -> Q {
    Q::filter(
        "rating",
        Lookup::Range(Value::Int(low), Value::Int(high)),
    )
}

/// Players rated 2400 or more become `GM`.
///
/// # Errors
///
/// Returns an error if the update fails.
#[allow(non_snake_case)]
pub async fn grand_chess_title_GM(db: &dyn DbExecutor) -> OrmResult<()> {
    let players = ChessPlayer::objects().filter(Q::filter("rating", Lookup::Gte(Value::Int(2400))));
    set_players(db, players, "title", "GM").await
}

/// Players rated 2300 to 2399 become `IM`.
///
/// # Errors
///
/// Returns an error if the update fails.
#[allow(non_snake_case)]
pub async fn grand_chess_title_IM(db: &dyn DbExecutor) -> OrmResult<()> {
    set_players(db, ChessPlayer::objects().filter(rated_between(2300, 2399)), "title", "IM").await
}

/// Players rated 2200 to 2299 become `FM`.
///
/// # Errors
///
/// Returns an error if the update fails.
#[allow(non_snake_case)]
pub async fn grand_chess_title_FM(db: &dyn DbExecutor) -> OrmResult<()> {
    set_players(db, ChessPlayer::objects().filter(rated_between(2200, 2299)), "title", "FM").await
}

/// Players rated 2199 or less become `regular player`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn grand_chess_title_regular_player(db: &dyn DbExecutor) -> OrmResult<()> {
    let players = ChessPlayer::objects().filter(Q::filter("rating", Lookup::Lte(Value::Int(2199))));
    set_players(db, players, "title", "regular player").await
}

// ── Meals ──────────────────────────────────────────────────────────────

async fn set_by_meal_type(
    db: &dyn DbExecutor,
    column: &str,
    values: [(MealType, &str); 4],
) -> OrmResult<()> {
    for (meal_type, value) in values {
        Meal::objects()
            .filter(exact("meal_type", meal_type))
            .update(vec![(column, Expression::value(value))])
            .update_exec(db)
            .await?;
    }
    Ok(())
}

/// Assigns a chef per meal type.
///
/// # Errors
///
/// Returns an error if an update fails.
pub async fn set_new_chefs(db: &dyn DbExecutor) -> OrmResult<()> {
    set_by_meal_type(
        db,
        "chef",
        [
            (MealType::Breakfast, "Gordon Ramsay"),
            (MealType::Lunch, "Julia Child"),
            (MealType::Dinner, "Jamie Oliver"),
            (MealType::Snack, "Thomas Keller"),
        ],
    )
    .await
}

/// Assigns a preparation time per meal type.
///
/// # Errors
///
/// Returns an error if an update fails.
pub async fn set_new_preparation_times(db: &dyn DbExecutor) -> OrmResult<()> {
    set_by_meal_type(
        db,
        "preparation_time",
        [
            (MealType::Breakfast, "10 minutes"),
            (MealType::Lunch, "12 minutes"),
            (MealType::Dinner, "15 minutes"),
            (MealType::Snack, "5 minutes"),
        ],
    )
    .await
}

/// Breakfasts and dinners are set to 400 calories.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn update_low_calorie_meals(db: &dyn DbExecutor) -> OrmResult<()> {
    Meal::objects()
        .filter(one_of("meal_type", [MealType::Breakfast, MealType::Dinner]))
        .update(vec![("calories", Expression::value(400))])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Lunches and snacks are set to 700 calories.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn update_high_calorie_meals(db: &dyn DbExecutor) -> OrmResult<()> {
    Meal::objects()
        .filter(one_of("meal_type", [MealType::Lunch, MealType::Snack]))
        .update(vec![("calories", Expression::value(700))])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Deletes every lunch and snack.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn delete_lunch_and_snack_meals(db: &dyn DbExecutor) -> OrmResult<()> {
    Meal::objects()
        .filter(one_of("meal_type", [MealType::Lunch, MealType::Snack]))
        .delete()
        .delete_exec(db)
        .await?;
    Ok(())
}

// ── Dungeons ───────────────────────────────────────────────────────────

/// Hard dungeons by location, descending, with their boss.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn show_hard_dungeons(db: &dyn DbExecutor) -> OrmResult<String> {
    let dungeons = Dungeon::objects()
        .filter(exact("difficulty", DungeonDifficulty::Hard))
        .order_by(vec![OrderBy::desc("location")])
        .execute_query(db)
        .await?;
    Ok(lines(dungeons.iter().map(|d| {
        format!(
            "{} is guarded by {} who has {} health points!",
            d.name, d.boss_name, d.boss_health
        )
    })))
}

/// Inserts the given dungeons in one statement.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn bulk_create_dungeons(db: &dyn DbExecutor, dungeons: Vec<Dungeon>) -> OrmResult<()> {
    let mut dungeons = dungeons;
    bulk_create(&mut dungeons, db).await?;
    Ok(())
}

fn by_difficulty<V: Into<Expression>>(easy: V, medium: V, hard: V) -> Vec<When> {
    vec![
        When::new(exact("difficulty", DungeonDifficulty::Easy), easy),
        When::new(exact("difficulty", DungeonDifficulty::Medium), medium),
        When::new(exact("difficulty", DungeonDifficulty::Hard), hard),
    ]
}

/// Renames every dungeon after its difficulty.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn update_dungeon_names(db: &dyn DbExecutor) -> OrmResult<()> {
    let name = case_or_keep(
        "name",
        by_difficulty("The Erased Thombs", "The Coral Labyrinth", "The Lost Haunt"),
    );
    Dungeon::objects()
        .all()
        .update(vec![("name", name)])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Bosses outside easy dungeons get 500 health.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn update_dungeon_bosses_health(db: &dyn DbExecutor) -> OrmResult<()> {
    Dungeon::objects()
        .exclude(exact("difficulty", DungeonDifficulty::Easy))
        .update(vec![("boss_health", Expression::value(500))])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Recommended levels become 25, 50 or 75 by difficulty.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn update_dungeon_recommended_levels(db: &dyn DbExecutor) -> OrmResult<()> {
    let level = case_or_keep("recommended_level", by_difficulty(25, 50, 75));
    Dungeon::objects()
        .all()
        .update(vec![("recommended_level", level)])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Rewards follow the first matching rule: boss health 500, a location
/// starting with `E`, then a location ending with `s`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn update_dungeon_rewards(db: &dyn DbExecutor) -> OrmResult<()> {
    let reward = case_or_keep(
        "reward",
        vec![
            When::new(exact("boss_health", 500), "1000 Gold"),
            When::new(
                Q::filter("location", Lookup::StartsWith("E".to_string())),
                "New dungeon unlocked",
            ),
            When::new(
                Q::filter("location", Lookup::EndsWith("s".to_string())),
                "Dragonheart Amulet",
            ),
        ],
    );
    Dungeon::objects()
        .all()
        .update(vec![("reward", reward)])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Locations follow the recommended level.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn set_new_locations(db: &dyn DbExecutor) -> OrmResult<()> {
    let location = case_or_keep(
        "location",
        vec![
            When::new(exact("recommended_level", 25), "Enchanted Maze"),
            When::new(exact("recommended_level", 50), "Grimstone Mines"),
            When::new(exact("recommended_level", 75), "Shadowed Abyss"),
        ],
    );
    Dungeon::objects()
        .all()
        .update(vec![("location", location)])
        .update_exec(db)
        .await?;
    Ok(())
}

// ── Workouts ───────────────────────────────────────────────────────────

/// Calisthenics and CrossFit workouts in id order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn show_workouts(db: &dyn DbExecutor) -> OrmResult<String> {
    let workouts = Workout::objects()
        .filter(one_of(
            "workout_type",
            [WorkoutType::Calisthenics, WorkoutType::CrossFit],
        ))
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(db)
        .await?;
    Ok(lines(workouts.iter().map(|w| {
        format!(
            "{} from {} type has {} difficulty!",
            w.name, w.workout_type, w.difficulty
        )
    })))
}

/// High difficulty cardio workouts by instructor.
pub fn get_high_difficulty_cardio_workouts() -> QuerySet<Workout> {
    Workout::objects()
        .filter(exact("workout_type", WorkoutType::Cardio) & exact("difficulty", "High"))
        .order_by(vec![OrderBy::asc("instructor")])
}

/// Assigns an instructor per workout type.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn set_new_instructors(db: &dyn DbExecutor) -> OrmResult<()> {
    let instructor = case_or_keep(
        "instructor",
        [
            (WorkoutType::Cardio, "John Smith"),
            (WorkoutType::Strength, "Michael Williams"),
            (WorkoutType::Yoga, "Emily Johnson"),
            (WorkoutType::CrossFit, "Sarah Davis"),
            (WorkoutType::Calisthenics, "Chris Heria"),
        ]
        .into_iter()
        .map(|(kind, name)| When::new(exact("workout_type", kind), name))
        .collect(),
    );
    Workout::objects()
        .all()
        .update(vec![("instructor", instructor)])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Sets the duration by instructor.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn set_new_duration_times(db: &dyn DbExecutor) -> OrmResult<()> {
    let duration = case_or_keep(
        "duration",
        [
            ("John Smith", "15 minutes"),
            ("Sarah Davis", "30 minutes"),
            ("Chris Heria", "45 minutes"),
            ("Michael Williams", "1 hour"),
            ("Emily Johnson", "1 hour and 30 minutes"),
        ]
        .into_iter()
        .map(|(instructor, time)| When::new(exact("instructor", instructor), time))
        .collect(),
    );
    Workout::objects()
        .all()
        .update(vec![("duration", duration)])
        .update_exec(db)
        .await?;
    Ok(())
}

/// Deletes everything except strength and calisthenics workouts.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn delete_workouts(db: &dyn DbExecutor) -> OrmResult<()> {
    Workout::objects()
        .exclude(one_of(
            "workout_type",
            [WorkoutType::Strength, WorkoutType::Calisthenics],
        ))
        .delete()
        .delete_exec(db)
        .await?;
    Ok(())
}
