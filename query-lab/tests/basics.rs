mod common;

use query_lab::apps::basics::{self, Artifact, Car, HotelRoom, Location, RoomType, Task};
use query_lab_db::{create_model, Lookup, Model, Q};

async fn seed_locations(db: &dyn query_lab_db::DbExecutor) {
    for (name, region, population) in [
        ("Sofia", "Sofia Region", 1_329_000),
        ("Plovdiv", "Plovdiv Region", 346_942),
        ("Varna", "Varna Region", 330_486),
    ] {
        let mut location = Location::new(name, region, population, "");
        create_model(&mut location, db).await.unwrap();
    }
}

#[tokio::test]
async fn test_create_pet() {
    let db = common::setup().await;
    let msg = basics::create_pet(&db, "Buddy", "Dog").await.unwrap();
    assert_eq!(msg, "Buddy is a very cute Dog!");
}

#[tokio::test]
async fn test_artifacts() {
    let db = common::setup().await;
    let msg = basics::create_artifact(&db, "Ancient Sword", "Lost Kingdom", 500, "A legendary sword", true)
        .await
        .unwrap();
    assert_eq!(msg, "The artifact Ancient Sword is 500 years old!");

    let mut artifact = Artifact::objects().all().first_exec(&db).await.unwrap().unwrap();
    basics::rename_artifact(&db, &mut artifact, "Ancient Shield").await.unwrap();
    let stored = Artifact::objects().all().first_exec(&db).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ancient Shield");

    basics::delete_all_artifacts(&db).await.unwrap();
    assert!(!Artifact::objects().all().exists_exec(&db).await.unwrap());
}

#[tokio::test]
async fn test_rename_skips_young_artifacts() {
    let db = common::setup().await;
    basics::create_artifact(&db, "Old Lamp", "Bazaar", 100, "", true)
        .await
        .unwrap();
    let mut artifact = Artifact::objects().all().first_exec(&db).await.unwrap().unwrap();
    basics::rename_artifact(&db, &mut artifact, "Magic Lamp").await.unwrap();
    assert_eq!(artifact.name, "Old Lamp");
}

#[tokio::test]
async fn test_locations() {
    let db = common::setup().await;
    seed_locations(&db).await;
    assert_eq!(
        basics::show_all_locations(&db).await.unwrap(),
        "Varna has a population of 330486!\n\
         Plovdiv has a population of 346942!\n\
         Sofia has a population of 1329000!"
    );

    basics::new_capital(&db).await.unwrap();
    let capitals = basics::get_capitals().execute_query(&db).await.unwrap();
    assert_eq!(capitals.len(), 1);
    assert_eq!(capitals[0].name, "Sofia");

    basics::delete_first_location(&db).await.unwrap();
    assert_eq!(Location::objects().all().count_exec(&db).await.unwrap(), 2);
    assert!(basics::get_capitals().execute_query(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_location_helpers_on_empty_table() {
    let db = common::setup().await;
    basics::new_capital(&db).await.unwrap();
    basics::delete_first_location(&db).await.unwrap();
    assert_eq!(basics::show_all_locations(&db).await.unwrap(), "");
}

#[tokio::test]
async fn test_cars() {
    let db = common::setup().await;
    for (model, year, price) in [("Mercedes C63 AMG", 2014, 10000.0), ("Audi Q7 S line", 2022, 20000.0)] {
        let mut car = Car::new(model, year, "Black", price);
        create_model(&mut car, &db).await.unwrap();
    }

    basics::apply_discount(&db).await.unwrap();
    let recent = basics::get_recent_cars(&db).await.unwrap();
    assert_eq!(recent, vec![("Audi Q7 S line".to_string(), 18800.0)]);

    let old = Car::objects()
        .filter(Q::filter("year", Lookup::Exact(2014.into())))
        .get_exec(&db)
        .await
        .unwrap();
    assert!((old.price_with_discount - 9300.0).abs() < 1e-9);

    basics::delete_last_car(&db).await.unwrap();
    let left = Car::objects().all().execute_query(&db).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].model, "Mercedes C63 AMG");
}

#[tokio::test]
async fn test_tasks() {
    let db = common::setup().await;
    for (title, day) in [("Sample Task", 1), ("Second Task", 2), ("Third Task", 3)] {
        let mut task = Task::new(title, "", common::date(2023, 10, day));
        create_model(&mut task, &db).await.unwrap();
    }

    basics::complete_odd_tasks(&db).await.unwrap();
    assert_eq!(
        basics::show_unfinished_tasks(&db).await.unwrap(),
        "Task - Second Task needs to be done until 2023-10-02!"
    );

    basics::encode_and_replace(&db, "Zdvk#wkh#glvkhv$", "Second Task")
        .await
        .unwrap();
    let second = Task::objects()
        .filter(Q::filter("title", Lookup::Exact("Second Task".into())))
        .get_exec(&db)
        .await
        .unwrap();
    assert_eq!(second.description, "Wash the dishes!");
}

#[tokio::test]
async fn test_hotel_rooms() {
    let db = common::setup().await;
    for (number, kind, capacity, price) in [
        (101, RoomType::Standard, 2, 100.0),
        (201, RoomType::Deluxe, 3, 200.0),
        (202, RoomType::Deluxe, 3, 250.5),
        (301, RoomType::Deluxe, 4, 300.0),
    ] {
        let mut room = HotelRoom::new(number, kind, capacity, "", price);
        create_model(&mut room, &db).await.unwrap();
    }

    assert_eq!(
        basics::get_deluxe_rooms(&db).await.unwrap(),
        "Deluxe room with number 201 costs 200.00$ per night!\n\
         Deluxe room with number 301 costs 300.00$ per night!"
    );

    basics::reserve_first_room(&db).await.unwrap();
    basics::increase_room_capacity(&db).await.unwrap();
    let first = HotelRoom::objects().all().first_exec(&db).await.unwrap().unwrap();
    assert!(first.is_reserved);
    assert_eq!(first.capacity, 3);

    basics::delete_last_room(&db).await.unwrap();
    assert_eq!(HotelRoom::objects().all().count_exec(&db).await.unwrap(), 3);
}
