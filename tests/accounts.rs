mod common;

use keiba_pool::accounts::{prediction_history, register, set_role, verify_credentials};
use keiba_pool::error::Error;
use keiba_pool::models::Role;
use keiba_pool::predictions::submit_prediction;
use keiba_pool::scoring::record_result;

use common::*;

const COST: u32 = bcrypt::DEFAULT_COST - 8;

#[test]
fn registered_users_can_sign_in() {
    let mut conn = connection();
    let user = register(&mut conn, " taro ", "umauma", COST).unwrap();
    assert_eq!(user.username, "taro");
    assert_eq!(user.role, Role::User);
    assert_ne!(user.encrypted_password, "umauma");

    let signed_in = verify_credentials(&mut conn, "taro", "umauma").unwrap();
    assert_eq!(signed_in.map(|u| u.id), Some(user.id));
    assert!(verify_credentials(&mut conn, "taro", "wrong").unwrap().is_none());
    assert!(verify_credentials(&mut conn, "ghost", "umauma").unwrap().is_none());
}

#[test]
fn usernames_are_unique() {
    let mut conn = connection();
    register(&mut conn, "taro", "umauma", COST).unwrap();
    assert!(matches!(
        register(&mut conn, "taro", "other", COST),
        Err(Error::UsernameTaken(name)) if name == "taro"
    ));
}

#[test]
fn registration_input_is_validated() {
    let mut conn = connection();
    assert!(matches!(register(&mut conn, "  ", "umauma", COST), Err(Error::Validation(_))));
    assert!(matches!(register(&mut conn, "taro", "abc", COST), Err(Error::Validation(_))));
}

#[test]
fn roles_can_be_changed() {
    let mut conn = connection();
    register(&mut conn, "admin", "umauma", COST).unwrap();
    set_role(&mut conn, "admin", Role::Admin).unwrap();
    let admin = verify_credentials(&mut conn, "admin", "umauma").unwrap().unwrap();
    assert!(admin.is_admin());

    assert!(matches!(
        set_role(&mut conn, "ghost", Role::Admin),
        Err(Error::UnknownUser(_))
    ));
}

#[test]
fn history_lists_newest_races_first() {
    let mut conn = connection();
    user(&mut conn, "taro");
    let older = race(&mut conn, date(2025, 5, 18));
    let newer = race(&mut conn, date(2025, 5, 25));
    submit_prediction(&mut conn, older.id, "taro", "A", early()).unwrap();
    submit_prediction(&mut conn, newer.id, "taro", "B", early()).unwrap();
    record_result(&mut conn, &result(older.id, ["A", "B", "C", "D", "E"], [2.0, 1.5, 1.1])).unwrap();

    let history = prediction_history(&mut conn, "taro").unwrap();
    assert_eq!(
        history.iter().map(|h| h.race_id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );
    assert!(!history[0].scored);
    assert_eq!((history[1].honmeiba_rank, history[1].score), (1, 20));
}
