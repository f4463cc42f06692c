mod common;

use keiba_pool::accounts::find_user;
use keiba_pool::error::Error;
use keiba_pool::models::NewRace;
use keiba_pool::catalog::insert_races;
use keiba_pool::scoring::record_result;
use keiba_pool::predictions::{
    find_prediction, prediction_state, predictions_for_race, submit_prediction, PredictionState,
};

use common::*;

#[test]
fn a_second_pick_replaces_the_first_until_the_deadline() {
    let mut conn = connection();
    let race = race(&mut conn, date(2025, 5, 25));
    user(&mut conn, "taro");

    submit_prediction(&mut conn, race.id, "taro", "A", at(2025, 5, 24, 20, 0)).unwrap();
    let replaced =
        submit_prediction(&mut conn, race.id, "taro", " B ", at(2025, 5, 25, 15, 38)).unwrap();
    assert_eq!(replaced.honmeiba, "B");

    let all = predictions_for_race(&mut conn, race.id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].honmeiba, "B");
    assert!(!all[0].scored);
}

#[test]
fn picks_close_one_minute_before_the_start() {
    let mut conn = connection();
    // starts 15:40
    let race = race(&mut conn, date(2025, 5, 25));
    user(&mut conn, "taro");

    assert_eq!(
        prediction_state(&race, at(2025, 5, 25, 15, 38)).unwrap(),
        PredictionState::Open
    );
    assert_eq!(
        prediction_state(&race, at(2025, 5, 25, 15, 39)).unwrap(),
        PredictionState::Locked
    );

    submit_prediction(&mut conn, race.id, "taro", "A", at(2025, 5, 25, 15, 0)).unwrap();
    let error =
        submit_prediction(&mut conn, race.id, "taro", "B", at(2025, 5, 25, 15, 39)).unwrap_err();
    assert!(matches!(error, Error::SubmissionClosed(id) if id == race.id));

    let kept = find_prediction(&mut conn, race.id, "taro").unwrap().unwrap();
    assert_eq!(kept.honmeiba, "A");
}

#[test]
fn submissions_are_checked() {
    let mut conn = connection();
    let race = race(&mut conn, date(2025, 5, 25));
    user(&mut conn, "taro");

    assert!(matches!(
        submit_prediction(&mut conn, 999, "taro", "A", early()),
        Err(Error::RaceNotFound(999))
    ));
    assert!(matches!(
        submit_prediction(&mut conn, race.id, "ghost", "A", early()),
        Err(Error::UnknownUser(_))
    ));
    assert!(matches!(
        submit_prediction(&mut conn, race.id, "taro", "  ", early()),
        Err(Error::Validation(_))
    ));
    assert_eq!(find_prediction(&mut conn, race.id, "taro").unwrap(), None);
}

#[test]
fn a_race_without_start_time_cannot_take_picks() {
    let mut conn = connection();
    user(&mut conn, "taro");
    let untimed = NewRace {
        start_time: None,
        ..new_race(date(2025, 5, 25), "東京", "G1", "時刻未定")
    };
    let race = insert_races(&mut conn, &[untimed]).unwrap().remove(0);

    assert!(matches!(
        submit_prediction(&mut conn, race.id, "taro", "A", early()),
        Err(Error::InvalidRaceTime(_))
    ));
}

#[test]
fn a_recorded_result_closes_the_race_early() {
    let mut conn = connection();
    // starts 15:40 on the 25th
    let race = race(&mut conn, date(2025, 5, 25));
    user(&mut conn, "taro");
    submit_prediction(&mut conn, race.id, "taro", "A", at(2025, 5, 24, 12, 0)).unwrap();
    record_result(&mut conn, &result(race.id, ["A", "B", "C", "D", "E"], [3.2, 1.8, 1.1])).unwrap();

    let error =
        submit_prediction(&mut conn, race.id, "taro", "Z", at(2025, 5, 24, 13, 0)).unwrap_err();
    assert!(matches!(error, Error::SubmissionClosed(id) if id == race.id));

    let kept = find_prediction(&mut conn, race.id, "taro").unwrap().unwrap();
    assert_eq!((kept.honmeiba.as_str(), kept.honmeiba_rank, kept.score), ("A", 1, 32));
    let taro = find_user(&mut conn, "taro").unwrap().unwrap();
    assert_eq!((taro.first, taro.score), (1, 32));
}
