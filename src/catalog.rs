use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::Error;
use crate::models::{NewRace, Race};
use crate::scoring::refresh_user_stats;

fn validate(race: &NewRace) -> Result<(), Error> {
    if race.race_place.trim().is_empty() {
        return Err(Error::Validation("race venue must not be blank".to_string()));
    }
    if race.race_name.trim().is_empty() {
        return Err(Error::Validation("race name must not be blank".to_string()));
    }
    if let Some(start_time) = race.start_time.as_deref().filter(|t| !t.is_empty()) {
        if chrono::NaiveTime::parse_from_str(start_time, "%H:%M").is_err() {
            return Err(Error::Validation(format!(
                "start time {:?} is not in HH:MM form",
                start_time
            )));
        }
    }
    Ok(())
}

/// Inserts a batch of races; either every race is stored or none is.
pub fn insert_races(conn: &mut SqliteConnection, races: &[NewRace]) -> Result<Vec<Race>, Error> {
    use crate::schema::race_schedule::dsl::*;

    for race in races {
        validate(race)?;
    }

    conn.transaction(|conn| {
        let mut inserted = Vec::with_capacity(races.len());
        for race in races {
            let race = NewRace {
                start_time: race.start_time.clone().filter(|t| !t.is_empty()),
                ..race.clone()
            };
            diesel::insert_into(race_schedule)
                .values(&race)
                .execute(conn)?;
            inserted.push(race_schedule.order(id.desc()).first::<Race>(conn)?);
        }
        Ok(inserted)
    })
}

pub fn find_race(conn: &mut SqliteConnection, race_id: i32) -> Result<Race, Error> {
    use crate::schema::race_schedule::dsl::*;

    race_schedule
        .find(race_id)
        .first::<Race>(conn)
        .optional()?
        .ok_or(Error::RaceNotFound(race_id))
}

/// All races, newest first.
pub fn list_races(conn: &mut SqliteConnection) -> Result<Vec<Race>, Error> {
    use crate::schema::race_schedule::dsl::*;

    Ok(race_schedule
        .order((race_date.desc(), start_time.asc(), id.asc()))
        .load::<Race>(conn)?)
}

pub fn races_between(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Race>, Error> {
    use crate::schema::race_schedule::dsl::*;

    Ok(race_schedule
        .filter(race_date.ge(from))
        .filter(race_date.le(to))
        .order((race_date.asc(), start_time.asc(), id.asc()))
        .load::<Race>(conn)?)
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Races of one month keyed by day of month, for the calendar view.
pub fn races_in_month(
    conn: &mut SqliteConnection,
    year: i32,
    month: u32,
) -> Result<BTreeMap<u32, Vec<Race>>, Error> {
    let (first, last) = month_bounds(year, month)
        .ok_or_else(|| Error::Validation(format!("{}-{} is not a valid month", year, month)))?;

    let mut events: BTreeMap<u32, Vec<Race>> = BTreeMap::new();
    for race in races_between(conn, first, last)? {
        events.entry(race.race_date.day()).or_default().push(race);
    }
    Ok(events)
}

/// Monday and Sunday of the week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Days::new(u64::from(day.weekday().num_days_from_monday()));
    (monday, monday + Days::new(6))
}

pub fn races_in_week(conn: &mut SqliteConnection, today: NaiveDate) -> Result<Vec<Race>, Error> {
    let (monday, sunday) = week_bounds(today);
    races_between(conn, monday, sunday)
}

/// Deletes a race together with its entries, predictions and result, then
/// rebuilds the statistics of everyone who had predicted it.
pub fn delete_race(conn: &mut SqliteConnection, race_id: i32) -> Result<(), Error> {
    use crate::schema::{race_schedule, raise_horse};

    conn.transaction(|conn| {
        find_race(conn, race_id)?;

        let predictors = raise_horse::table
            .filter(raise_horse::race_id.eq(race_id))
            .select(raise_horse::username)
            .load::<String>(conn)?;

        diesel::delete(race_schedule::table.find(race_id)).execute(conn)?;

        for username in &predictors {
            refresh_user_stats(conn, username)?;
        }
        info!(
            "deleted race {} and refreshed {} user(s)",
            race_id,
            predictors.len()
        );
        Ok(())
    })
}

pub fn distinct_grades(conn: &mut SqliteConnection) -> Result<Vec<String>, Error> {
    use crate::schema::race_schedule::dsl::*;

    Ok(race_schedule
        .select(race_grade)
        .distinct()
        .order(race_grade.asc())
        .load::<String>(conn)?)
}

pub fn distinct_venues(conn: &mut SqliteConnection) -> Result<Vec<String>, Error> {
    use crate::schema::race_schedule::dsl::*;

    Ok(race_schedule
        .select(race_place)
        .distinct()
        .order(race_place.asc())
        .load::<String>(conn)?)
}
