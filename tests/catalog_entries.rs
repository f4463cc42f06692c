mod common;

use keiba_pool::accounts::find_user;
use keiba_pool::catalog::{delete_race, find_race, insert_races, list_races, races_in_month, races_in_week};
use keiba_pool::entries::{
    display_entries, entry_cutoff, replace_entries, replace_provisional_entries, EntrySource,
};
use keiba_pool::error::Error;
use keiba_pool::models::{NewEntrant, NewRace};
use keiba_pool::predictions::{find_prediction, submit_prediction};
use keiba_pool::results::find_result;
use keiba_pool::scoring::record_result;

use common::*;

fn entrant(number: i32, name: &str, jockey: &str) -> NewEntrant {
    NewEntrant {
        horse_number: Some(number),
        horse_name: name.to_string(),
        jockey: Some(jockey.to_string()),
    }
}

#[test]
fn a_bad_row_rejects_the_whole_batch() {
    let mut conn = connection();
    let good = new_race(date(2025, 5, 25), "東京", "G1", "日本ダービー");
    let bad = NewRace {
        start_time: Some("25時".to_string()),
        ..new_race(date(2025, 5, 25), "東京", "G1", "壊れた行")
    };

    assert!(matches!(
        insert_races(&mut conn, &[good.clone(), bad]),
        Err(Error::Validation(_))
    ));
    assert!(list_races(&mut conn).unwrap().is_empty());

    let inserted = insert_races(&mut conn, &[good]).unwrap();
    assert_eq!(inserted[0].race_name, "日本ダービー");
    assert_eq!(find_race(&mut conn, inserted[0].id).unwrap(), inserted[0]);
}

#[test]
fn races_are_grouped_by_month_and_week() {
    let mut conn = connection();
    // Saturday and Sunday of one week, and the next Sunday
    race(&mut conn, date(2025, 5, 24));
    race(&mut conn, date(2025, 5, 25));
    race(&mut conn, date(2025, 6, 1));

    let may = races_in_month(&mut conn, 2025, 5).unwrap();
    assert_eq!(may.keys().copied().collect::<Vec<_>>(), vec![24, 25]);

    let week = races_in_week(&mut conn, date(2025, 5, 21)).unwrap();
    assert_eq!(week.len(), 2);
    assert_eq!(week[0].race_date, date(2025, 5, 24));

    assert!(matches!(races_in_month(&mut conn, 2025, 0), Err(Error::Validation(_))));
}

#[test]
fn deleting_a_race_removes_its_picks_and_rebuilds_stats() {
    let mut conn = connection();
    let kept = race(&mut conn, date(2025, 5, 18));
    let doomed = race(&mut conn, date(2025, 5, 25));
    user(&mut conn, "taro");
    submit_prediction(&mut conn, kept.id, "taro", "A", early()).unwrap();
    submit_prediction(&mut conn, doomed.id, "taro", "A", early()).unwrap();
    record_result(&mut conn, &result(kept.id, ["A", "B", "C", "D", "E"], [2.0, 1.5, 1.1])).unwrap();
    record_result(&mut conn, &result(doomed.id, ["A", "B", "C", "D", "E"], [4.0, 1.5, 1.1])).unwrap();
    assert_eq!(find_user(&mut conn, "taro").unwrap().unwrap().score, 60);

    delete_race(&mut conn, doomed.id).unwrap();

    assert!(matches!(find_race(&mut conn, doomed.id), Err(Error::RaceNotFound(_))));
    assert_eq!(find_prediction(&mut conn, doomed.id, "taro").unwrap(), None);
    assert_eq!(find_result(&mut conn, doomed.id).unwrap(), None);
    let taro = find_user(&mut conn, "taro").unwrap().unwrap();
    assert_eq!((taro.first, taro.score), (1, 20));

    assert!(matches!(delete_race(&mut conn, doomed.id), Err(Error::RaceNotFound(_))));
}

#[test]
fn entry_lists_are_replaced_wholesale() {
    let mut conn = connection();
    let race = race(&mut conn, date(2025, 5, 25));

    replace_entries(&mut conn, race.id, &[entrant(1, "A", "武"), entrant(2, "B", "ルメール")]).unwrap();
    let saved = replace_entries(
        &mut conn,
        race.id,
        &[entrant(3, "C", "川田"), entrant(4, "  ", "空行")],
    )
    .unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].horse_name, "C");

    let provisional = replace_provisional_entries(
        &mut conn,
        race.id,
        &["X".to_string(), "".to_string(), "Y".to_string()],
    )
    .unwrap();
    assert_eq!(
        provisional
            .iter()
            .map(|e| (e.horse_number, e.horse_name.as_str()))
            .collect::<Vec<_>>(),
        vec![(1, "X"), (2, "Y")]
    );

    assert!(matches!(
        replace_entries(&mut conn, 999, &[entrant(1, "A", "武")]),
        Err(Error::RaceNotFound(999))
    ));
}

#[test]
fn the_displayed_list_switches_at_the_cutoff() {
    let mut conn = connection();
    // Sunday race; the cutoff is Saturday 00:00
    let race = race(&mut conn, date(2025, 5, 25));
    assert_eq!(entry_cutoff(race.race_date), at(2025, 5, 24, 0, 0));

    user(&mut conn, "taro");
    user(&mut conn, "hanako");
    replace_provisional_entries(&mut conn, race.id, &["A".to_string(), "B".to_string()]).unwrap();
    replace_entries(&mut conn, race.id, &[entrant(7, "B", "武"), entrant(3, "A", "川田")]).unwrap();
    submit_prediction(&mut conn, race.id, "taro", "A", early()).unwrap();
    submit_prediction(&mut conn, race.id, "hanako", "A", early()).unwrap();

    let before = display_entries(&mut conn, race.id, at(2025, 5, 23, 23, 59)).unwrap();
    assert_eq!(before.source, EntrySource::Provisional);
    assert_eq!(before.entries[0].horse_name, "A");
    assert_eq!(before.entries[0].horse_number, Some(1));
    assert_eq!(before.entries[0].voted_by, vec!["hanako", "taro"]);

    let after = display_entries(&mut conn, race.id, at(2025, 5, 24, 0, 0)).unwrap();
    assert_eq!(after.source, EntrySource::Confirmed);
    let a = after.entries.iter().find(|e| e.horse_name == "A").unwrap();
    assert_eq!(a.horse_number, Some(3));
    assert_eq!(a.jockey.as_deref(), Some("川田"));
    assert_eq!(a.voted_by.len(), 2);
    assert!(after.deadline.is_some());
}
