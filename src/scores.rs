use crate::error::Error;
use crate::models::{RaceResult, UserStats};

const WIN_MULTIPLIER: f64 = 10.0;
const PLACE_MULTIPLIER: f64 = 3.0;
const SHOW_MULTIPLIER: f64 = 1.0;

/// Highest odds accepted for a payout. Anything above is treated as a typo.
pub const MAX_ODDS: f64 = 10_000.0;

/// Rank, applied odds and points for a single honmeiba.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub rank: i32,
    pub odds: Option<f64>,
    pub score: i32,
}

impl Outcome {
    pub fn unplaced() -> Outcome {
        Outcome {
            rank: 0,
            odds: None,
            score: 0,
        }
    }

    fn unpaid(rank: i32) -> Outcome {
        Outcome {
            rank,
            odds: None,
            score: 0,
        }
    }
}

/// Rounds half to even, so 4.5 becomes 4 and 5.5 becomes 6.
pub fn round_half_even(value: f64) -> i32 {
    value.round_ties_even() as i32
}

fn finishing_position(result: &RaceResult, honmeiba: &str) -> i32 {
    let honmeiba = honmeiba.trim();
    if honmeiba.is_empty() {
        return 0;
    }

    let finishers = [
        &result.first_place,
        &result.second_place,
        &result.third_place,
        &result.fourth_place,
        &result.fifth_place,
    ];
    finishers
        .iter()
        .position(|name| name.trim() == honmeiba)
        .map(|index| index as i32 + 1)
        .unwrap_or(0)
}

fn payout(race_id: i32, rank: i32, odds: Option<f64>, multiplier: f64) -> Result<Outcome, Error> {
    match odds {
        Some(odds) if (0.0..=MAX_ODDS).contains(&odds) => Ok(Outcome {
            rank,
            odds: Some(odds),
            score: round_half_even(odds * multiplier),
        }),
        _ => Err(Error::MalformedOdds { race_id, rank }),
    }
}

/// Scores one honmeiba against the official result.
///
/// Only the first three places pay out; 4th and 5th keep their rank with no
/// points. Fails with `MalformedOdds` when a paying placing has no usable odds
/// (missing, negative, NaN or above `MAX_ODDS`).
pub fn judge(result: &RaceResult, honmeiba: &str) -> Result<Outcome, Error> {
    match finishing_position(result, honmeiba) {
        1 => payout(result.race_id, 1, result.odds_first, WIN_MULTIPLIER),
        2 => payout(result.race_id, 2, result.odds_second, PLACE_MULTIPLIER),
        3 => payout(result.race_id, 3, result.odds_third, SHOW_MULTIPLIER),
        rank @ 4..=5 => Ok(Outcome::unpaid(rank)),
        _ => Ok(Outcome::unplaced()),
    }
}

/// Counts per rank class over a set of scored predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub races: i32,
    pub first: i32,
    pub second: i32,
    pub third: i32,
    pub bbs: i32,
    pub out_of_place: i32,
    pub score: i32,
}

impl Tally {
    pub fn add(&mut self, rank: i32, score: i32) {
        self.races += 1;
        self.score = self.score.saturating_add(score);
        match rank {
            1 => self.first += 1,
            2 => self.second += 1,
            3 => self.third += 1,
            4 | 5 => self.bbs += 1,
            _ => self.out_of_place += 1,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.races == 0 {
            0.0
        } else {
            f64::from(self.first) / f64::from(self.races)
        }
    }

    pub fn placing_rate(&self) -> f64 {
        if self.races == 0 {
            0.0
        } else {
            f64::from(self.first + self.second + self.third) / f64::from(self.races)
        }
    }

    pub fn stats(&self) -> UserStats {
        UserStats {
            first: self.first,
            second: self.second,
            third: self.third,
            bbs: self.bbs,
            out_of_place: self.out_of_place,
            score: self.score,
            win_rate: self.win_rate(),
            placing_bets_rate: self.placing_rate(),
        }
    }
}

impl FromIterator<(i32, i32)> for Tally {
    fn from_iter<I: IntoIterator<Item = (i32, i32)>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for (rank, score) in iter {
            tally.add(rank, score);
        }
        tally
    }
}
