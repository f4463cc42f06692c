use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

table! {
    provisional_entries (id) {
        id -> Integer,
        race_id -> Integer,
        horse_number -> Integer,
        horse_name -> Text,
    }
}

table! {
    race_entries (id) {
        id -> Integer,
        race_id -> Integer,
        horse_number -> Nullable<Integer>,
        horse_name -> Text,
        jockey -> Nullable<Text>,
    }
}

table! {
    race_result (race_id) {
        race_id -> Integer,
        first_place -> Text,
        second_place -> Text,
        third_place -> Text,
        fourth_place -> Text,
        fifth_place -> Text,
        odds_first -> Nullable<Double>,
        odds_second -> Nullable<Double>,
        odds_third -> Nullable<Double>,
    }
}

table! {
    race_schedule (id) {
        id -> Integer,
        race_date -> Date,
        race_place -> Text,
        race_ground -> Nullable<Text>,
        race_distance -> Nullable<Text>,
        race_number -> Nullable<Integer>,
        race_grade -> Text,
        race_name -> Text,
        start_time -> Nullable<Text>,
    }
}

table! {
    raise_horse (id) {
        id -> Integer,
        race_id -> Integer,
        username -> Text,
        honmeiba -> Text,
        honmeiba_rank -> Integer,
        honmeiba_odds -> Nullable<Double>,
        score -> Integer,
        scored -> Bool,
    }
}

table! {
    use diesel::sql_types::{Double, Integer, Text};
    use super::RoleMapping;
    users (id) {
        id -> Integer,
        username -> Text,
        encrypted_password -> Text,
        role -> RoleMapping,
        first -> Integer,
        second -> Integer,
        third -> Integer,
        bbs -> Integer,
        out_of_place -> Integer,
        score -> Integer,
        win_rate -> Double,
        placing_bets_rate -> Double,
    }
}

joinable!(provisional_entries -> race_schedule (race_id));
joinable!(race_entries -> race_schedule (race_id));
joinable!(race_result -> race_schedule (race_id));
joinable!(raise_horse -> race_schedule (race_id));

allow_tables_to_appear_in_same_query!(
    provisional_entries,
    race_entries,
    race_result,
    race_schedule,
    raise_horse,
    users,
);
