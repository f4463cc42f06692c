#[macro_use]
extern crate log;

use std::env;

use anyhow::bail;
use dotenv::dotenv;

use keiba_pool::accounts::set_role;
use keiba_pool::config::Config;
use keiba_pool::db;
use keiba_pool::models::Role;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let username = match env::args().nth(1) {
        Some(username) => username,
        None => bail!("usage: make_admin <username>"),
    };

    let config = Config::from_env()?;
    let mut conn = db::open(&config.database_url)?;

    set_role(&mut conn, &username, Role::Admin)?;
    info!("{} is now an admin", username);
    Ok(())
}
