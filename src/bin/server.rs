#[macro_use]
extern crate log;

use std::sync::Arc;

use actix::prelude::*;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;

use keiba_pool::backup::{BackupManager, CsvDirectorySink};
use keiba_pool::config::Config;
use keiba_pool::db;
use keiba_pool::web::app_state::{AppState, DbExecutor};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    // applies migrations once before the executor starts
    db::open(&config.database_url)
        .with_context(|| format!("opening database {}", config.database_url))?;

    let backup = config.backup_dir.as_ref().map(|dir| {
        info!("backing up to {}", dir.display());
        Arc::new(BackupManager::new(
            &config.database_url,
            Arc::new(CsvDirectorySink::new(dir.clone())),
            config.backup_interval,
        ))
    });
    match &backup {
        Some(backup) if !config.skip_startup_backup => {
            backup.trigger(false);
        }
        Some(_) => info!("skipping startup backup"),
        None => info!("BACKUP_DIR not set, backups disabled"),
    }

    // A single executor thread: SQLite takes one writer at a time.
    let database_url = config.database_url.clone();
    let addr = SyncArbiter::start(1, move || {
        DbExecutor::open(&database_url).unwrap_or_else(|e| {
            error!("could not open database: {}", e);
            panic!("could not open database {}", database_url)
        })
    });

    let state = web::Data::new(AppState {
        db: addr,
        backup,
        utc_offset: config.utc_offset,
        bcrypt_cost: config.bcrypt_cost,
    });

    let url = config.bind_address();
    info!("Listening http server {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(keiba_pool::web::configure)
    })
    .bind(&url)
    .with_context(|| format!("binding {}", url))?
    .run()
    .await?;

    Ok(())
}
