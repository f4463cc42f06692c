use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

use crate::catalog::{distinct_grades, distinct_venues, month_bounds};
use crate::error::Error;
use crate::scores::Tally;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub grade: Option<String>,
    pub venue: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub username: String,
    pub total_races: i32,
    pub total_score: i32,
    pub first: i32,
    pub second: i32,
    pub third: i32,
    pub bbs: i32,
    pub out_of_place: i32,
    pub win_rate: f64,
    pub placing_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceStanding {
    pub rank: usize,
    pub username: String,
    pub honmeiba: String,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub grades: Vec<String>,
    pub venues: Vec<String>,
}

/// Competition ranking ("1224") over keys already sorted best first: equal
/// keys share a rank and the next distinct key ranks at its position.
pub fn competition_ranks<K: PartialEq>(keys: &[K]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate() {
        let rank = if index > 0 && keys[index - 1] == *key {
            ranks[index - 1]
        } else {
            index + 1
        };
        ranks.push(rank);
    }
    ranks
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Groups `(username, rank, score)` rows per user and orders them by total
/// score, then first, second and third place counts.
pub fn build_standings<I>(rows: I) -> Vec<Standing>
where
    I: IntoIterator<Item = (String, i32, i32)>,
{
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for (username, rank, score) in rows {
        tallies.entry(username).or_default().add(rank, score);
    }

    let mut tallies: Vec<(String, Tally)> = tallies.into_iter().collect();
    tallies.sort_by(|(a_name, a), (b_name, b)| {
        b.score
            .cmp(&a.score)
            .then(b.first.cmp(&a.first))
            .then(b.second.cmp(&a.second))
            .then(b.third.cmp(&a.third))
            .then(a_name.cmp(b_name))
    });

    let keys: Vec<_> = tallies
        .iter()
        .map(|(_, t)| (t.score, t.first, t.second, t.third))
        .collect();
    let ranks = competition_ranks(&keys);

    tallies
        .into_iter()
        .zip(ranks)
        .map(|((username, tally), rank)| Standing {
            rank,
            username,
            total_races: tally.races,
            total_score: tally.score,
            first: tally.first,
            second: tally.second,
            third: tally.third,
            bbs: tally.bbs,
            out_of_place: tally.out_of_place,
            win_rate: round4(tally.win_rate()),
            placing_rate: round4(tally.placing_rate()),
        })
        .collect()
}

fn scored_rows(
    conn: &mut SqliteConnection,
    filter: &LeaderboardFilter,
    only_user: Option<&str>,
) -> Result<Vec<(String, i32, i32)>, Error> {
    use crate::schema::{race_schedule, raise_horse};

    let mut query = raise_horse::table
        .inner_join(race_schedule::table)
        .filter(raise_horse::scored.eq(true))
        .select((
            raise_horse::username,
            raise_horse::honmeiba_rank,
            raise_horse::score,
        ))
        .into_boxed::<diesel::sqlite::Sqlite>();

    if let Some(from) = filter.from {
        query = query.filter(race_schedule::race_date.ge(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(race_schedule::race_date.le(to));
    }
    if let Some(grade) = filter.grade.as_deref().filter(|g| !g.is_empty()) {
        query = query.filter(race_schedule::race_grade.eq(grade.to_string()));
    }
    if let Some(venue) = filter.venue.as_deref().filter(|v| !v.is_empty()) {
        query = query.filter(race_schedule::race_place.eq(venue.to_string()));
    }
    if let Some(user) = only_user {
        query = query.filter(raise_horse::username.eq(user.to_string()));
    }

    Ok(query.load::<(String, i32, i32)>(conn)?)
}

pub fn leaderboard(
    conn: &mut SqliteConnection,
    filter: &LeaderboardFilter,
) -> Result<Vec<Standing>, Error> {
    let mut standings = build_standings(scored_rows(conn, filter, None)?);
    if let Some(limit) = filter.limit {
        standings.truncate(limit);
    }
    Ok(standings)
}

pub fn monthly_leaderboard(
    conn: &mut SqliteConnection,
    year: i32,
    month: u32,
    limit: Option<usize>,
) -> Result<Vec<Standing>, Error> {
    let (from, to) = month_bounds(year, month)
        .ok_or_else(|| Error::Validation(format!("{}-{} is not a valid month", year, month)))?;
    leaderboard(
        conn,
        &LeaderboardFilter {
            from: Some(from),
            to: Some(to),
            limit,
            ..LeaderboardFilter::default()
        },
    )
}

/// One user's totals across every scored race, or `None` before their first
/// scored prediction.
pub fn personal_summary(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<Standing>, Error> {
    let rows = scored_rows(conn, &LeaderboardFilter::default(), Some(username))?;
    Ok(build_standings(rows).into_iter().next())
}

pub fn filter_options(conn: &mut SqliteConnection) -> Result<FilterOptions, Error> {
    Ok(FilterOptions {
        grades: distinct_grades(conn)?,
        venues: distinct_venues(conn)?,
    })
}

/// Per-race table of picks ordered by score, sharing ranks on equal scores.
pub fn race_standings(conn: &mut SqliteConnection, for_race: i32) -> Result<Vec<RaceStanding>, Error> {
    use crate::schema::raise_horse::dsl::*;

    let rows = raise_horse
        .filter(race_id.eq(for_race))
        .order((score.desc(), username.asc()))
        .select((username, honmeiba, score))
        .load::<(String, String, i32)>(conn)?;

    let scores: Vec<i32> = rows.iter().map(|row| row.2).collect();
    let ranks = competition_ranks(&scores);

    Ok(rows
        .into_iter()
        .zip(ranks)
        .map(|((user, horse, points), rank)| RaceStanding {
            rank,
            username: user,
            honmeiba: horse,
            score: points,
        })
        .collect())
}
