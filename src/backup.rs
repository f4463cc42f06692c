//! Best-effort mirror of the database to an external backup target.
//!
//! Backups run on a sync actor of their own, with their own connection. A
//! failure is logged and never reaches the request that triggered it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use actix::prelude::*;
use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::db::establish_connection;
use crate::error::Error;
use crate::models::{Entrant, Prediction, ProvisionalEntrant, Race, RaceResult, User};

/// Column names and stringified rows of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

pub trait BackupSink: Send + Sync {
    fn write_table(&self, table: &TableSnapshot) -> anyhow::Result<()>;
    fn last_backup(&self) -> anyhow::Result<Option<DateTime<Utc>>>;
    fn mark_backup(&self, at: DateTime<Utc>) -> anyhow::Result<()>;
}

/// Writes each table to `<dir>/<table>.csv` and the time of the last complete
/// backup to `<dir>/timestamp`.
pub struct CsvDirectorySink {
    dir: PathBuf,
}

impl CsvDirectorySink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> CsvDirectorySink {
        CsvDirectorySink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn timestamp_path(&self) -> PathBuf {
        self.dir.join("timestamp")
    }
}

impl BackupSink for CsvDirectorySink {
    fn write_table(&self, table: &TableSnapshot) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating backup directory {}", self.dir.display()))?;

        let path = self.dir.join(format!("{}.csv", table.name));
        let partial = self.dir.join(format!("{}.csv.partial", table.name));

        let mut writer = csv::Writer::from_path(&partial)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        fs::rename(&partial, &path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    fn last_backup(&self) -> anyhow::Result<Option<DateTime<Utc>>> {
        match fs::read_to_string(self.timestamp_path()) {
            Ok(raw) => {
                let at = DateTime::parse_from_rfc3339(raw.trim())
                    .with_context(|| format!("parsing backup timestamp {:?}", raw))?;
                Ok(Some(at.with_timezone(&Utc)))
            }
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn mark_backup(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.timestamp_path(), at.to_rfc3339())?;
        Ok(())
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(T::to_string).unwrap_or_default()
}

/// Reads every table that a restore would need. Password hashes stay local.
pub fn snapshot(conn: &mut SqliteConnection) -> Result<Vec<TableSnapshot>, Error> {
    use crate::schema::{provisional_entries, race_entries, race_result, race_schedule, raise_horse, users};

    let races = race_schedule::table
        .order(race_schedule::id.asc())
        .load::<Race>(conn)?;
    let entrants = race_entries::table
        .order(race_entries::id.asc())
        .load::<Entrant>(conn)?;
    let provisional = provisional_entries::table
        .order(provisional_entries::id.asc())
        .load::<ProvisionalEntrant>(conn)?;
    let results = race_result::table
        .order(race_result::race_id.asc())
        .load::<RaceResult>(conn)?;
    let predictions = raise_horse::table
        .order(raise_horse::id.asc())
        .load::<Prediction>(conn)?;
    let accounts = users::table.order(users::id.asc()).load::<User>(conn)?;

    Ok(vec![
        TableSnapshot {
            name: "race_schedule",
            columns: vec![
                "id", "race_date", "race_place", "race_ground", "race_distance",
                "race_number", "race_grade", "race_name", "start_time",
            ],
            rows: races
                .into_iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.race_date.to_string(),
                        r.race_place,
                        opt(&r.race_ground),
                        opt(&r.race_distance),
                        opt(&r.race_number),
                        r.race_grade,
                        r.race_name,
                        opt(&r.start_time),
                    ]
                })
                .collect(),
        },
        TableSnapshot {
            name: "race_entries",
            columns: vec!["id", "race_id", "horse_number", "horse_name", "jockey"],
            rows: entrants
                .into_iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.race_id.to_string(),
                        opt(&e.horse_number),
                        e.horse_name,
                        opt(&e.jockey),
                    ]
                })
                .collect(),
        },
        TableSnapshot {
            name: "provisional_entries",
            columns: vec!["id", "race_id", "horse_number", "horse_name"],
            rows: provisional
                .into_iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.race_id.to_string(),
                        e.horse_number.to_string(),
                        e.horse_name,
                    ]
                })
                .collect(),
        },
        TableSnapshot {
            name: "race_result",
            columns: vec![
                "race_id", "first_place", "second_place", "third_place", "fourth_place",
                "fifth_place", "odds_first", "odds_second", "odds_third",
            ],
            rows: results
                .into_iter()
                .map(|r| {
                    vec![
                        r.race_id.to_string(),
                        r.first_place,
                        r.second_place,
                        r.third_place,
                        r.fourth_place,
                        r.fifth_place,
                        opt(&r.odds_first),
                        opt(&r.odds_second),
                        opt(&r.odds_third),
                    ]
                })
                .collect(),
        },
        TableSnapshot {
            name: "raise_horse",
            columns: vec![
                "id", "race_id", "username", "honmeiba", "honmeiba_rank", "honmeiba_odds",
                "score", "scored",
            ],
            rows: predictions
                .into_iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        p.race_id.to_string(),
                        p.username,
                        p.honmeiba,
                        p.honmeiba_rank.to_string(),
                        opt(&p.honmeiba_odds),
                        p.score.to_string(),
                        (p.scored as i32).to_string(),
                    ]
                })
                .collect(),
        },
        TableSnapshot {
            name: "users",
            columns: vec![
                "id", "username", "role", "first", "second", "third", "bbs", "out_of_place",
                "score", "win_rate", "placing_bets_rate",
            ],
            rows: accounts
                .into_iter()
                .map(|u| {
                    let role = if u.is_admin() { "admin" } else { "user" };
                    vec![
                        u.id.to_string(),
                        u.username,
                        role.to_string(),
                        u.first.to_string(),
                        u.second.to_string(),
                        u.third.to_string(),
                        u.bbs.to_string(),
                        u.out_of_place.to_string(),
                        u.score.to_string(),
                        u.win_rate.to_string(),
                        u.placing_bets_rate.to_string(),
                    ]
                })
                .collect(),
        },
    ])
}

/// Copies every table to the sink, table by table. A table that fails is
/// logged and skipped; the timestamp is only moved when all tables made it.
pub fn run_backup(database_url: &str, sink: &dyn BackupSink) -> bool {
    let tables = match establish_connection(database_url).and_then(|mut conn| snapshot(&mut conn)) {
        Ok(tables) => tables,
        Err(e) => {
            error!("backup could not read the database: {}", e);
            return false;
        }
    };

    let mut complete = true;
    for table in &tables {
        debug!("backing up {} ({} rows)", table.name, table.rows.len());
        if let Err(e) = sink.write_table(table) {
            warn!("backup of table {} failed: {:#}", table.name, e);
            complete = false;
        }
    }

    if complete {
        if let Err(e) = sink.mark_backup(Utc::now()) {
            warn!("could not record backup time: {:#}", e);
        }
        info!("backup finished ({} tables)", tables.len());
    }
    complete
}

/// Clears the running flag when a backup ends, even by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs backups one at a time on a dedicated sync thread.
pub struct BackupWorker {
    database_url: String,
    sink: Arc<dyn BackupSink>,
}

impl Actor for BackupWorker {
    type Context = SyncContext<Self>;
}

struct RunBackup {
    guard: RunningGuard,
}

impl Message for RunBackup {
    type Result = bool;
}

impl Handler<RunBackup> for BackupWorker {
    type Result = bool;

    fn handle(&mut self, msg: RunBackup, _: &mut Self::Context) -> Self::Result {
        let _guard = msg.guard;
        run_backup(&self.database_url, self.sink.as_ref())
    }
}

/// Owns the single backup slot: at most one backup runs at a time.
pub struct BackupManager {
    worker: Addr<BackupWorker>,
    sink: Arc<dyn BackupSink>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl BackupManager {
    /// Starts the backup worker. Must be called inside a running actix system.
    pub fn new(database_url: &str, sink: Arc<dyn BackupSink>, interval: Duration) -> BackupManager {
        let database_url = database_url.to_string();
        let worker_sink = sink.clone();
        let worker = SyncArbiter::start(1, move || BackupWorker {
            database_url: database_url.clone(),
            sink: worker_sink.clone(),
        });

        BackupManager {
            worker,
            sink,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether the last complete backup is older than the interval. An
    /// unreadable timestamp counts as due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.sink.last_backup() {
            Ok(Some(last)) => now - last >= self.interval,
            Ok(None) => true,
            Err(e) => {
                warn!("could not read last backup time: {:#}", e);
                true
            }
        }
    }

    /// Starts a backup in the background when forced or due. Returns whether
    /// a backup was started; a trigger while one is running is skipped.
    pub fn trigger(&self, force: bool) -> bool {
        if !force && !self.is_due(Utc::now()) {
            return false;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("backup already running, skipping");
            return false;
        }

        let guard = RunningGuard(self.running.clone());
        match self.worker.try_send(RunBackup { guard }) {
            Ok(()) => true,
            Err(e) => {
                // the unsent message drops its guard and clears the flag
                warn!("could not start backup: {}", e);
                false
            }
        }
    }
}
