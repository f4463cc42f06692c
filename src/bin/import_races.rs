#[macro_use]
extern crate log;

use std::env;
use std::path::Path;

use anyhow::{bail, Context};
use diesel::sqlite::SqliteConnection;
use dotenv::dotenv;

use keiba_pool::catalog::insert_races;
use keiba_pool::config::Config;
use keiba_pool::db;
use keiba_pool::models::{NewRace, Race};

fn read_races(path: &Path) -> anyhow::Result<Vec<NewRace>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut races = Vec::new();
    for (line, row) in rdr.deserialize::<NewRace>().enumerate() {
        // line 1 is the header
        let race = row.with_context(|| format!("{} line {}", path.display(), line + 2))?;
        debug!("{:?}", race);
        races.push(race);
    }
    Ok(races)
}

fn import_races(conn: &mut SqliteConnection, path: &Path) -> anyhow::Result<Vec<Race>> {
    let races = read_races(path)?;
    Ok(insert_races(conn, &races)?)
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => bail!("usage: import_races <race_schedule.csv>"),
    };

    let config = Config::from_env()?;
    let mut conn = db::open(&config.database_url)?;

    let imported = import_races(&mut conn, Path::new(&path))?;
    info!("imported {} race(s) from {}", imported.len(), path);
    Ok(())
}
