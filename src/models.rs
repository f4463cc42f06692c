use super::schema::*;
use chrono::prelude::*;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::schema::Role;

#[derive(Queryable, Identifiable, Debug, Clone, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub encrypted_password: String,
    pub role: Role,
    pub first: i32,
    pub second: i32,
    pub third: i32,
    pub bbs: i32,
    pub out_of_place: i32,
    pub score: i32,
    pub win_rate: f64,
    pub placing_bets_rate: f64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn stats(&self) -> UserStats {
        UserStats {
            first: self.first,
            second: self.second,
            third: self.third,
            bbs: self.bbs,
            out_of_place: self.out_of_place,
            score: self.score,
            win_rate: self.win_rate,
            placing_bets_rate: self.placing_bets_rate,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub encrypted_password: &'a str,
    pub role: Role,
}

/// Cumulative statistics cached on the `users` row.
///
/// Always rebuilt from the user's scored predictions, never incremented.
#[derive(AsChangeset, Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[diesel(table_name = users)]
pub struct UserStats {
    pub first: i32,
    pub second: i32,
    pub third: i32,
    pub bbs: i32,
    pub out_of_place: i32,
    pub score: i32,
    pub win_rate: f64,
    pub placing_bets_rate: f64,
}

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = race_schedule)]
pub struct Race {
    pub id: i32,
    pub race_date: NaiveDate,
    pub race_place: String,
    pub race_ground: Option<String>,
    pub race_distance: Option<String>,
    pub race_number: Option<i32>,
    pub race_grade: String,
    pub race_name: String,
    pub start_time: Option<String>,
}

#[derive(Insertable, Debug, Clone, Deserialize)]
#[diesel(table_name = race_schedule)]
pub struct NewRace {
    pub race_date: NaiveDate,
    pub race_place: String,
    #[serde(default)]
    pub race_ground: Option<String>,
    #[serde(default)]
    pub race_distance: Option<String>,
    #[serde(default)]
    pub race_number: Option<i32>,
    pub race_grade: String,
    pub race_name: String,
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = race_entries)]
pub struct Entrant {
    pub id: i32,
    pub race_id: i32,
    pub horse_number: Option<i32>,
    pub horse_name: String,
    pub jockey: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEntrant {
    #[serde(default)]
    pub horse_number: Option<i32>,
    pub horse_name: String,
    #[serde(default)]
    pub jockey: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = race_entries)]
pub struct EntrantRow<'a> {
    pub race_id: i32,
    pub horse_number: Option<i32>,
    pub horse_name: &'a str,
    pub jockey: Option<&'a str>,
}

#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = provisional_entries)]
pub struct ProvisionalEntrant {
    pub id: i32,
    pub race_id: i32,
    pub horse_number: i32,
    pub horse_name: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = provisional_entries)]
pub struct ProvisionalEntrantRow<'a> {
    pub race_id: i32,
    pub horse_number: i32,
    pub horse_name: &'a str,
}

/// A user's honmeiba for one race, plus the outcome once the race is scored.
#[derive(Queryable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = raise_horse)]
pub struct Prediction {
    pub id: i32,
    pub race_id: i32,
    pub username: String,
    pub honmeiba: String,
    pub honmeiba_rank: i32,
    pub honmeiba_odds: Option<f64>,
    pub score: i32,
    pub scored: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = raise_horse)]
pub struct NewPrediction<'a> {
    pub race_id: i32,
    pub username: &'a str,
    pub honmeiba: &'a str,
}

#[derive(Queryable, Insertable, AsChangeset, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = race_result, primary_key(race_id), treat_none_as_null = true)]
pub struct RaceResult {
    pub race_id: i32,
    pub first_place: String,
    pub second_place: String,
    pub third_place: String,
    #[serde(default)]
    pub fourth_place: String,
    #[serde(default)]
    pub fifth_place: String,
    pub odds_first: Option<f64>,
    pub odds_second: Option<f64>,
    pub odds_third: Option<f64>,
}
