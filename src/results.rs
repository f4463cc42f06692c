use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::Error;
use crate::models::RaceResult;

fn validate(result: &RaceResult) -> Result<(), Error> {
    let podium = [
        ("first", &result.first_place),
        ("second", &result.second_place),
        ("third", &result.third_place),
    ];
    for (place, horse) in podium.iter() {
        if horse.trim().is_empty() {
            return Err(Error::Validation(format!(
                "{} place of race {} must name a horse",
                place, result.race_id
            )));
        }
    }
    Ok(())
}

/// Creates the result of a race or replaces it wholesale.
pub fn upsert_result(conn: &mut SqliteConnection, result: &RaceResult) -> Result<(), Error> {
    use crate::schema::race_result::dsl::*;

    validate(result)?;

    diesel::insert_into(race_result)
        .values(result)
        .on_conflict(race_id)
        .do_update()
        .set(result)
        .execute(conn)?;
    Ok(())
}

pub fn find_result(
    conn: &mut SqliteConnection,
    for_race: i32,
) -> Result<Option<RaceResult>, Error> {
    use crate::schema::race_result::dsl::*;

    Ok(race_result
        .find(for_race)
        .first::<RaceResult>(conn)
        .optional()?)
}
