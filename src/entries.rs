use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::catalog::find_race;
use crate::error::Error;
use crate::models::{
    Entrant, EntrantRow, NewEntrant, ProvisionalEntrant, ProvisionalEntrantRow, Race,
};
use crate::predictions::{predictions_for_race, prediction_state, voting_deadline, PredictionState};

/// Which list is shown to users when they pick a horse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Announced field, before the draw is final.
    Provisional,
    /// Final entry list with horse numbers.
    Confirmed,
}

/// Midnight between Friday and Saturday of the race's week (Monday + 5 days).
/// The confirmed entry list is shown from then on.
pub fn entry_cutoff(race_date: NaiveDate) -> NaiveDateTime {
    let monday = race_date - Days::new(u64::from(race_date.weekday().num_days_from_monday()));
    (monday + Days::new(5)).and_time(chrono::NaiveTime::MIN)
}

pub fn entry_source(race_date: NaiveDate, now: NaiveDateTime) -> EntrySource {
    if now < entry_cutoff(race_date) {
        EntrySource::Provisional
    } else {
        EntrySource::Confirmed
    }
}

/// Replaces the confirmed entry list of a race. Rows with a blank horse name
/// are skipped.
pub fn replace_entries(
    conn: &mut SqliteConnection,
    for_race: i32,
    entrants: &[NewEntrant],
) -> Result<Vec<Entrant>, Error> {
    use crate::schema::race_entries::dsl::*;

    conn.transaction(|conn| {
        find_race(conn, for_race)?;
        diesel::delete(race_entries.filter(race_id.eq(for_race))).execute(conn)?;

        for entrant in entrants {
            let name = entrant.horse_name.trim();
            if name.is_empty() {
                continue;
            }
            let row = EntrantRow {
                race_id: for_race,
                horse_number: entrant.horse_number,
                horse_name: name,
                jockey: entrant.jockey.as_deref().map(str::trim).filter(|j| !j.is_empty()),
            };
            diesel::insert_into(race_entries).values(&row).execute(conn)?;
        }

        entries_for_race(conn, for_race)
    })
}

/// Replaces the provisional list; horses are numbered in the order given.
pub fn replace_provisional_entries(
    conn: &mut SqliteConnection,
    for_race: i32,
    names: &[String],
) -> Result<Vec<ProvisionalEntrant>, Error> {
    use crate::schema::provisional_entries::dsl::*;

    conn.transaction(|conn| {
        find_race(conn, for_race)?;
        diesel::delete(provisional_entries.filter(race_id.eq(for_race))).execute(conn)?;

        let names = names.iter().map(|n| n.trim()).filter(|n| !n.is_empty());
        for (number, name) in (1..).zip(names) {
            let row = ProvisionalEntrantRow {
                race_id: for_race,
                horse_number: number,
                horse_name: name,
            };
            diesel::insert_into(provisional_entries)
                .values(&row)
                .execute(conn)?;
        }

        provisional_entries_for_race(conn, for_race)
    })
}

pub fn entries_for_race(conn: &mut SqliteConnection, for_race: i32) -> Result<Vec<Entrant>, Error> {
    use crate::schema::race_entries::dsl::*;

    Ok(race_entries
        .filter(race_id.eq(for_race))
        .order(id.asc())
        .load::<Entrant>(conn)?)
}

pub fn provisional_entries_for_race(
    conn: &mut SqliteConnection,
    for_race: i32,
) -> Result<Vec<ProvisionalEntrant>, Error> {
    use crate::schema::provisional_entries::dsl::*;

    Ok(provisional_entries
        .filter(race_id.eq(for_race))
        .order(horse_number.asc())
        .load::<ProvisionalEntrant>(conn)?)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayEntry {
    pub horse_number: Option<i32>,
    pub horse_name: String,
    pub jockey: Option<String>,
    pub voted_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryListing {
    pub race: Race,
    pub source: EntrySource,
    pub cutoff: NaiveDateTime,
    /// `None` when the race has no usable start time.
    pub deadline: Option<NaiveDateTime>,
    pub state: Option<PredictionState>,
    pub entries: Vec<DisplayEntry>,
}

/// The entry list a user sees for a race, with the users who picked each horse.
pub fn display_entries(
    conn: &mut SqliteConnection,
    for_race: i32,
    now: NaiveDateTime,
) -> Result<EntryListing, Error> {
    let race = find_race(conn, for_race)?;
    let source = entry_source(race.race_date, now);

    let mut entries: Vec<DisplayEntry> = match source {
        EntrySource::Provisional => provisional_entries_for_race(conn, for_race)?
            .into_iter()
            .map(|e| DisplayEntry {
                horse_number: Some(e.horse_number),
                horse_name: e.horse_name,
                jockey: None,
                voted_by: Vec::new(),
            })
            .collect(),
        EntrySource::Confirmed => entries_for_race(conn, for_race)?
            .into_iter()
            .map(|e| DisplayEntry {
                horse_number: e.horse_number,
                horse_name: e.horse_name,
                jockey: e.jockey,
                voted_by: Vec::new(),
            })
            .collect(),
    };

    let mut votes: HashMap<String, Vec<String>> = HashMap::new();
    for prediction in predictions_for_race(conn, for_race)? {
        votes
            .entry(prediction.honmeiba)
            .or_default()
            .push(prediction.username);
    }
    for entry in &mut entries {
        if let Some(voters) = votes.remove(&entry.horse_name) {
            entry.voted_by = voters;
        }
    }

    Ok(EntryListing {
        source,
        cutoff: entry_cutoff(race.race_date),
        deadline: voting_deadline(&race).ok(),
        state: prediction_state(&race, now).ok(),
        race,
        entries,
    })
}
