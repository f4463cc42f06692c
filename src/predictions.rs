use chrono::{Duration, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::accounts::find_user;
use crate::catalog::find_race;
use crate::error::Error;
use crate::models::{NewPrediction, Prediction, Race};
use crate::results::find_result;

/// Predictions close this long before the advertised start time.
pub fn lock_margin() -> Duration {
    Duration::minutes(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionState {
    Open,
    Locked,
}

/// Start of the race in venue-local time, if the schedule has a usable
/// "HH:MM" start time.
pub fn race_start(race: &Race) -> Option<NaiveDateTime> {
    let start_time = race.start_time.as_deref()?;
    let time = NaiveTime::parse_from_str(start_time.trim(), "%H:%M").ok()?;
    Some(race.race_date.and_time(time))
}

pub fn voting_deadline(race: &Race) -> Result<NaiveDateTime, Error> {
    race_start(race)
        .map(|start| start - lock_margin())
        .ok_or(Error::InvalidRaceTime(race.id))
}

pub fn prediction_state(race: &Race, now: NaiveDateTime) -> Result<PredictionState, Error> {
    let deadline = voting_deadline(race)?;
    Ok(if now >= deadline {
        PredictionState::Locked
    } else {
        PredictionState::Open
    })
}

/// Records or replaces a user's honmeiba while the race is still open.
pub fn submit_prediction(
    conn: &mut SqliteConnection,
    for_race: i32,
    for_user: &str,
    horse: &str,
    now: NaiveDateTime,
) -> Result<Prediction, Error> {
    let horse = horse.trim();
    if horse.is_empty() {
        return Err(Error::Validation("a horse must be chosen".to_string()));
    }

    conn.transaction(|conn| {
        let race = find_race(conn, for_race)?;
        if find_user(conn, for_user)?.is_none() {
            return Err(Error::UnknownUser(for_user.to_string()));
        }
        if prediction_state(&race, now)? == PredictionState::Locked {
            return Err(Error::SubmissionClosed(for_race));
        }
        // a recorded result closes the race even before its start time
        if find_result(conn, for_race)?.is_some() {
            return Err(Error::SubmissionClosed(for_race));
        }

        use crate::schema::raise_horse::dsl::*;

        let prediction = NewPrediction {
            race_id: for_race,
            username: for_user,
            honmeiba: horse,
        };
        diesel::insert_into(raise_horse)
            .values(&prediction)
            .on_conflict((race_id, username))
            .do_update()
            .set(honmeiba.eq(horse))
            .execute(conn)?;

        Ok(raise_horse
            .filter(race_id.eq(for_race))
            .filter(username.eq(for_user))
            .first::<Prediction>(conn)?)
    })
}

pub fn find_prediction(
    conn: &mut SqliteConnection,
    for_race: i32,
    for_user: &str,
) -> Result<Option<Prediction>, Error> {
    use crate::schema::raise_horse::dsl::*;

    Ok(raise_horse
        .filter(race_id.eq(for_race))
        .filter(username.eq(for_user))
        .first::<Prediction>(conn)
        .optional()?)
}

pub fn predictions_for_race(
    conn: &mut SqliteConnection,
    for_race: i32,
) -> Result<Vec<Prediction>, Error> {
    use crate::schema::raise_horse::dsl::*;

    Ok(raise_horse
        .filter(race_id.eq(for_race))
        .order(username.asc())
        .load::<Prediction>(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn race(start_time: Option<&str>) -> Race {
        Race {
            id: 3,
            race_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            race_place: "Tokyo".to_string(),
            race_ground: Some("turf".to_string()),
            race_distance: Some("2400".to_string()),
            race_number: Some(11),
            race_grade: "G1".to_string(),
            race_name: "Tokyo Yushun".to_string(),
            start_time: start_time.map(str::to_string),
        }
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn deadline_is_one_minute_before_start() {
        assert_eq!(voting_deadline(&race(Some("15:40"))).unwrap(), at(15, 39, 0));
    }

    #[test]
    fn state_locks_at_the_deadline() {
        let race = race(Some("15:40"));
        assert_eq!(prediction_state(&race, at(15, 38, 59)).unwrap(), PredictionState::Open);
        assert_eq!(prediction_state(&race, at(15, 39, 0)).unwrap(), PredictionState::Locked);
        assert_eq!(prediction_state(&race, at(16, 0, 0)).unwrap(), PredictionState::Locked);
    }

    #[test]
    fn missing_or_garbled_start_time_is_an_error() {
        assert!(matches!(voting_deadline(&race(None)), Err(Error::InvalidRaceTime(3))));
        assert!(matches!(voting_deadline(&race(Some("late"))), Err(Error::InvalidRaceTime(3))));
    }
}
