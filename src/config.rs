//! Settings read from the environment (and `.env` via `dotenv`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Duration, FixedOffset};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_url: String,
    pub bind_port: u16,
    /// Backups are disabled when unset.
    pub backup_dir: Option<PathBuf>,
    pub backup_interval: Duration,
    pub skip_startup_backup: bool,
    pub bcrypt_cost: u32,
    /// Offset of the venues' local time from UTC; race times are stored in it.
    pub utc_offset: FixedOffset,
}

fn parse<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, Error> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value {:?}", name, raw))),
    }
}

impl Config {
    pub fn from_env() -> Result<Config, Error> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| Error::Config("DATABASE_URL must be set".to_string()))?;

        let interval_secs: i64 = parse("BACKUP_INTERVAL_SECS", lookup("BACKUP_INTERVAL_SECS"), 600)?;
        let offset_hours: i32 = parse("UTC_OFFSET_HOURS", lookup("UTC_OFFSET_HOURS"), 9)?;
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            Error::Config(format!("UTC_OFFSET_HOURS {} is out of range", offset_hours))
        })?;

        Ok(Config {
            database_url,
            bind_url: lookup("BIND_URL").unwrap_or_else(|| "127.0.0.1".to_owned()),
            bind_port: parse("BIND_PORT", lookup("BIND_PORT"), 8080)?,
            backup_dir: lookup("BACKUP_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            backup_interval: Duration::seconds(interval_secs),
            skip_startup_backup: parse(
                "SKIP_STARTUP_BACKUP",
                lookup("SKIP_STARTUP_BACKUP").map(|v| v.to_lowercase()),
                false,
            )?,
            bcrypt_cost: parse("BCRYPT_COST", lookup("BCRYPT_COST"), bcrypt::DEFAULT_COST)?,
            utc_offset,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_url, self.bind_port)
    }
}
