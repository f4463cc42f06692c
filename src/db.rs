use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::Error;

const MIGRATIONS: &[(&str, &str)] = &[(
    "2025-05-01-000000_create_tables",
    include_str!("../migrations/2025-05-01-000000_create_tables/up.sql"),
)];

/// Opens the database and enables the pragmas every connection relies on.
///
/// Foreign keys are off by default in SQLite; race deletion depends on the
/// cascades declared in the schema.
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, Error> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
    Ok(conn)
}

/// Applies the bundled schema. Every statement is `IF NOT EXISTS`, so this
/// is safe to run at every start.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), Error> {
    for (name, sql) in MIGRATIONS {
        debug!("applying migration {}", name);
        conn.batch_execute(sql)?;
    }
    Ok(())
}

pub fn open(database_url: &str) -> Result<SqliteConnection, Error> {
    let mut conn = establish_connection(database_url)?;
    run_migrations(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::race_schedule;

    #[test]
    fn migrations_are_repeatable() {
        let mut conn = open(":memory:").unwrap();
        run_migrations(&mut conn).unwrap();

        let count: i64 = race_schedule::table.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 0);
    }
}
