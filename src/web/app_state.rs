use std::sync::Arc;

use actix::prelude::*;
use chrono::{FixedOffset, NaiveDateTime, Utc};
use diesel::sqlite::SqliteConnection;

use crate::backup::BackupManager;
use crate::db;
use crate::error::Error;

pub struct DbExecutor {
    pub connection: SqliteConnection,
}

impl Actor for DbExecutor {
    type Context = SyncContext<Self>;
}

impl DbExecutor {
    pub fn open(database_url: &str) -> Result<DbExecutor, Error> {
        Ok(DbExecutor {
            connection: db::open(database_url)?,
        })
    }
}

/// This is state where we will store *DbExecutor* address.
pub struct AppState {
    pub db: Addr<DbExecutor>,
    pub backup: Option<Arc<BackupManager>>,
    pub utc_offset: FixedOffset,
    /// Passwords are hashed on the blocking pool, outside the executor.
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Current wall-clock time at the venues, the clock race times use.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.utc_offset).naive_local()
    }

    /// Mirrors the database after a write. Forced backups ignore the interval.
    pub fn backup_after_write(&self, force: bool) {
        if let Some(backup) = &self.backup {
            backup.trigger(force);
        }
    }
}
