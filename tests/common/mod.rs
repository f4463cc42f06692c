#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::sqlite::SqliteConnection;

use keiba_pool::accounts::create_user;
use keiba_pool::catalog::insert_races;
use keiba_pool::db;
use keiba_pool::models::{NewRace, NewUser, Race, RaceResult, Role, User};

pub fn connection() -> SqliteConnection {
    db::open(":memory:").expect("in-memory database should open")
}

/// A fresh database file in the temp dir, for tests that need more than one
/// connection.
pub fn database_file(name: &str) -> String {
    let mut path = PathBuf::from(std::env::temp_dir());
    path.push(format!("keiba-pool-{}-{}.db", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path.to_string_lossy().into_owned()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(hour, minute, 0).unwrap()
}

/// Inserts a user without hashing, for tests that never log in.
pub fn user(conn: &mut SqliteConnection, name: &str) -> User {
    create_user(
        conn,
        &NewUser {
            username: name,
            encrypted_password: "",
            role: Role::User,
        },
    )
    .expect("user should be created")
}

pub fn new_race(race_date: NaiveDate, place: &str, grade: &str, name: &str) -> NewRace {
    NewRace {
        race_date,
        race_place: place.to_string(),
        race_ground: Some("芝".to_string()),
        race_distance: Some("2000m".to_string()),
        race_number: Some(11),
        race_grade: grade.to_string(),
        race_name: name.to_string(),
        start_time: Some("15:40".to_string()),
    }
}

pub fn race(conn: &mut SqliteConnection, race_date: NaiveDate) -> Race {
    race_with(conn, race_date, "東京", "G1")
}

pub fn race_with(conn: &mut SqliteConnection, race_date: NaiveDate, place: &str, grade: &str) -> Race {
    insert_races(conn, &[new_race(race_date, place, grade, "テストステークス")])
        .expect("race should be inserted")
        .remove(0)
}

pub fn result(race_id: i32, podium: [&str; 5], odds: [f64; 3]) -> RaceResult {
    RaceResult {
        race_id,
        first_place: podium[0].to_string(),
        second_place: podium[1].to_string(),
        third_place: podium[2].to_string(),
        fourth_place: podium[3].to_string(),
        fifth_place: podium[4].to_string(),
        odds_first: Some(odds[0]),
        odds_second: Some(odds[1]),
        odds_third: Some(odds[2]),
    }
}

/// Races are created well in the past; this is before any of their deadlines.
pub fn early() -> NaiveDateTime {
    at(2000, 1, 1, 0, 0)
}
