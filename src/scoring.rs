//! Turns a race result into points.
//!
//! Scoring a race writes rank, odds and score onto every prediction for that
//! race and then rebuilds the statistics of each user involved from their
//! complete prediction history. Nothing is ever incremented, so scoring the
//! same race again (for example after correcting a result) leaves the
//! database exactly as a single pass would.

use std::collections::BTreeSet;
use std::fmt;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::catalog::find_race;
use crate::error::Error;
use crate::models::{Prediction, RaceResult, UserStats};
use crate::results::{find_result, upsert_result};
use crate::scores::{judge, Outcome, Tally};

/// A prediction that could not be paid out because of bad odds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsWarning {
    pub username: String,
    pub honmeiba: String,
    pub rank: i32,
    pub message: String,
}

impl fmt::Display for OddsWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}): {}", self.username, self.honmeiba, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub race_id: i32,
    pub scored: usize,
    pub users_updated: usize,
    pub warnings: Vec<OddsWarning>,
}

/// Rebuilds one user's cached statistics from all of their scored predictions.
pub fn refresh_user_stats(conn: &mut SqliteConnection, for_user: &str) -> Result<UserStats, Error> {
    let tally = {
        use crate::schema::raise_horse::dsl::*;

        raise_horse
            .filter(username.eq(for_user))
            .filter(scored.eq(true))
            .select((honmeiba_rank, score))
            .load::<(i32, i32)>(conn)?
            .into_iter()
            .collect::<Tally>()
    };
    let stats = tally.stats();

    {
        use crate::schema::users::dsl::*;

        diesel::update(users.filter(username.eq(for_user)))
            .set(&stats)
            .execute(conn)?;
    }

    Ok(stats)
}

fn outcome_for(
    result: &RaceResult,
    prediction: &Prediction,
    warnings: &mut Vec<OddsWarning>,
) -> Outcome {
    match judge(result, &prediction.honmeiba) {
        Ok(outcome) => outcome,
        Err(error) => {
            let rank = match &error {
                Error::MalformedOdds { rank, .. } => *rank,
                _ => 0,
            };
            warn!(
                "race {}: scoring {}'s pick {:?} as unplaced: {}",
                result.race_id, prediction.username, prediction.honmeiba, error
            );
            warnings.push(OddsWarning {
                username: prediction.username.clone(),
                honmeiba: prediction.honmeiba.clone(),
                rank,
                message: error.to_string(),
            });
            Outcome::unplaced()
        }
    }
}

/// Scores every prediction of a race against its recorded result.
///
/// Runs in a single transaction: either all predictions and the statistics
/// of every affected user are updated, or nothing is.
pub fn score_race(conn: &mut SqliteConnection, for_race: i32) -> Result<ScoreReport, Error> {
    conn.transaction(|conn| {
        let result = find_result(conn, for_race)?.ok_or(Error::ResultNotFound(for_race))?;

        let predictions = {
            use crate::schema::raise_horse::dsl::*;

            raise_horse
                .filter(race_id.eq(for_race))
                .order(username.asc())
                .load::<Prediction>(conn)?
        };

        let mut warnings = Vec::new();
        let mut touched = BTreeSet::new();
        for prediction in &predictions {
            let outcome = outcome_for(&result, prediction, &mut warnings);
            {
                use crate::schema::raise_horse::dsl::*;

                diesel::update(raise_horse.find(prediction.id))
                    .set((
                        honmeiba_rank.eq(outcome.rank),
                        honmeiba_odds.eq(outcome.odds),
                        score.eq(outcome.score),
                        scored.eq(true),
                    ))
                    .execute(conn)?;
            }
            touched.insert(prediction.username.as_str());
        }

        for username in &touched {
            refresh_user_stats(conn, username)?;
        }

        info!(
            "scored {} prediction(s) for race {} ({} warning(s))",
            predictions.len(),
            for_race,
            warnings.len()
        );

        Ok(ScoreReport {
            race_id: for_race,
            scored: predictions.len(),
            users_updated: touched.len(),
            warnings,
        })
    })
}

/// Stores a race's official result and scores the race against it.
///
/// The result is committed before scoring starts, so a scoring failure
/// leaves the result in place and scoring can simply be retried.
pub fn record_result(conn: &mut SqliteConnection, result: &RaceResult) -> Result<ScoreReport, Error> {
    find_race(conn, result.race_id)?;
    conn.transaction(|conn| upsert_result(conn, result))?;
    score_race(conn, result.race_id)
}

/// Scores every race that has a result again, oldest race first. Used after
/// the scoring rules or historical results change.
pub fn rescore_all(conn: &mut SqliteConnection) -> Result<Vec<ScoreReport>, Error> {
    let race_ids = {
        use crate::schema::race_result::dsl::*;

        race_result.select(race_id).order(race_id.asc()).load::<i32>(conn)?
    };

    let reports = race_ids
        .into_iter()
        .map(|id| score_race(conn, id))
        .collect::<Result<Vec<_>, _>>()?;
    info!("rescored {} race(s)", reports.len());
    Ok(reports)
}
