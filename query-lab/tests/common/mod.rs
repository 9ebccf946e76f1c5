//! Shared fixtures for the app integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use query_lab::apps;
use query_lab_db_backends::SqliteBackend;

/// A fresh in-memory database with every app's tables.
pub async fn setup() -> SqliteBackend {
    let db = SqliteBackend::memory().unwrap();
    apps::create_all_tables(&db).await.unwrap();
    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}
