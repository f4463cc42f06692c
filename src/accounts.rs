use bcrypt::{hash, verify};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error::DatabaseError};
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::error::Error;
use crate::models::{NewUser, Role, User};

pub const MIN_PASSWORD_LENGTH: usize = 4;

pub fn find_user(conn: &mut SqliteConnection, name: &str) -> Result<Option<User>, Error> {
    use crate::schema::users::dsl::*;

    Ok(users
        .filter(username.eq(name))
        .first::<User>(conn)
        .optional()?)
}

/// Inserts a user whose password is already hashed.
pub fn create_user(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<User, Error> {
    use crate::schema::users::dsl::*;

    match diesel::insert_into(users).values(new_user).execute(conn) {
        Err(DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(Error::UsernameTaken(new_user.username.to_string()))
        }
        other => other?,
    };

    Ok(users
        .filter(username.eq(new_user.username))
        .first::<User>(conn)?)
}

/// Checks a registration form, returning the trimmed username.
pub fn check_registration<'a>(name: &'a str, password: &str) -> Result<&'a str, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("username must not be blank".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(name)
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, Error> {
    Ok(hash(password, cost)?)
}

pub fn password_matches(user: &User, password: &str) -> Result<bool, Error> {
    Ok(verify(password, &user.encrypted_password)?)
}

/// Inserts a regular user with an already hashed password.
pub fn create_account(
    conn: &mut SqliteConnection,
    name: &str,
    encrypted_password: &str,
) -> Result<User, Error> {
    let user = create_user(
        conn,
        &NewUser {
            username: name,
            encrypted_password,
            role: Role::User,
        },
    )?;
    info!("registered user {}", user.username);
    Ok(user)
}

/// Registers a regular user, hashing the password with the given bcrypt cost.
pub fn register(
    conn: &mut SqliteConnection,
    name: &str,
    password: &str,
    cost: u32,
) -> Result<User, Error> {
    let name = check_registration(name, password)?;
    let hashed = hash_password(password, cost)?;
    create_account(conn, name, &hashed)
}

/// Returns the user when the password matches, `None` for an unknown user or
/// a wrong password.
pub fn verify_credentials(
    conn: &mut SqliteConnection,
    name: &str,
    password: &str,
) -> Result<Option<User>, Error> {
    match find_user(conn, name)? {
        Some(user) if password_matches(&user, password)? => Ok(Some(user)),
        _ => Ok(None),
    }
}

pub fn set_role(conn: &mut SqliteConnection, name: &str, new_role: Role) -> Result<(), Error> {
    use crate::schema::users::dsl::*;

    let updated = diesel::update(users.filter(username.eq(name)))
        .set(role.eq(new_role))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::UnknownUser(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub race_id: i32,
    pub race_date: NaiveDate,
    pub race_place: String,
    pub race_name: String,
    pub honmeiba: String,
    pub honmeiba_rank: i32,
    pub score: i32,
    pub scored: bool,
}

/// Every prediction a user has made, newest race first.
pub fn prediction_history(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Vec<HistoryEntry>, Error> {
    use crate::schema::{race_schedule, raise_horse};

    let rows = raise_horse::table
        .inner_join(race_schedule::table)
        .filter(raise_horse::username.eq(name))
        .order((race_schedule::race_date.desc(), race_schedule::id.desc()))
        .select((
            race_schedule::id,
            race_schedule::race_date,
            race_schedule::race_place,
            race_schedule::race_name,
            raise_horse::honmeiba,
            raise_horse::honmeiba_rank,
            raise_horse::score,
            raise_horse::scored,
        ))
        .load::<(i32, NaiveDate, String, String, String, i32, i32, bool)>(conn)?;

    Ok(rows
        .into_iter()
        .map(
            |(race_id, race_date, race_place, race_name, honmeiba, honmeiba_rank, score, scored)| {
                HistoryEntry {
                    race_id,
                    race_date,
                    race_place,
                    race_name,
                    honmeiba,
                    honmeiba_rank,
                    score,
                    scored,
                }
            },
        )
        .collect())
}
