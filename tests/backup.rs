mod common;

use std::fs;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration as StdDuration, Instant};

use actix_web::rt::time::sleep;
use chrono::{DateTime, Duration, Utc};

use keiba_pool::accounts::register;
use keiba_pool::backup::{run_backup, snapshot, BackupManager, BackupSink, CsvDirectorySink, TableSnapshot};
use keiba_pool::db;
use keiba_pool::predictions::submit_prediction;

use common::*;

fn seeded_database(name: &str) -> String {
    let url = database_file(name);
    let mut conn = db::open(&url).unwrap();
    register(&mut conn, "taro", "umauma", 4).unwrap();
    let race = race(&mut conn, date(2025, 5, 25));
    submit_prediction(&mut conn, race.id, "taro", "A", early()).unwrap();
    url
}

fn backup_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("keiba-pool-backup-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

async fn wait_until_idle(manager: &BackupManager) {
    let started = Instant::now();
    while manager.is_running() {
        assert!(started.elapsed() < StdDuration::from_secs(10), "backup never finished");
        sleep(StdDuration::from_millis(10)).await;
    }
}

#[test]
fn snapshots_leave_out_password_hashes() {
    let url = seeded_database("snapshot");
    let mut conn = db::open(&url).unwrap();
    let tables = snapshot(&mut conn).unwrap();

    let names: Vec<&str> = tables.iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec!["race_schedule", "race_entries", "provisional_entries", "race_result", "raise_horse", "users"]
    );
    let users = tables.iter().find(|t| t.name == "users").unwrap();
    assert!(!users.columns.contains(&"encrypted_password"));
    assert_eq!(users.rows.len(), 1);
    assert_eq!(users.rows[0][1], "taro");
}

#[test]
fn csv_backups_write_every_table_and_the_time() {
    let url = seeded_database("csv");
    let dir = backup_dir("csv");
    let sink = CsvDirectorySink::new(&dir);
    assert_eq!(sink.last_backup().unwrap(), None);

    assert!(run_backup(&url, &sink));

    let predictions = fs::read_to_string(dir.join("raise_horse.csv")).unwrap();
    let mut lines = predictions.lines();
    assert_eq!(
        lines.next(),
        Some("id,race_id,username,honmeiba,honmeiba_rank,honmeiba_odds,score,scored")
    );
    assert!(lines.next().unwrap().contains(",taro,A,0,,0,0"));
    assert!(dir.join("race_schedule.csv").exists());
    assert!(!dir.join("users.csv.partial").exists());

    let last = sink.last_backup().unwrap().unwrap();
    assert!(Utc::now() - last < Duration::minutes(1));
}

/// Holds every write until released.
struct GatedSink {
    open: Mutex<bool>,
    opened: Condvar,
    marked: Mutex<Option<DateTime<Utc>>>,
}

impl GatedSink {
    fn new() -> GatedSink {
        GatedSink {
            open: Mutex::new(false),
            opened: Condvar::new(),
            marked: Mutex::new(None),
        }
    }

    fn release(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl BackupSink for GatedSink {
    fn write_table(&self, _table: &TableSnapshot) -> anyhow::Result<()> {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        Ok(())
    }

    fn last_backup(&self) -> anyhow::Result<Option<DateTime<Utc>>> {
        Ok(*self.marked.lock().unwrap())
    }

    fn mark_backup(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        *self.marked.lock().unwrap() = Some(at);
        Ok(())
    }
}

#[actix_web::test]
async fn a_trigger_while_running_is_skipped() {
    let url = seeded_database("gated");
    let sink = Arc::new(GatedSink::new());
    let manager = BackupManager::new(&url, sink.clone(), Duration::minutes(10));

    assert!(manager.trigger(true));
    assert!(manager.is_running());
    assert!(!manager.trigger(true));

    sink.release();
    wait_until_idle(&manager).await;
    assert!(sink.last_backup().unwrap().is_some());

    // within the interval only a forced backup runs
    assert!(!manager.trigger(false));
    assert!(manager.trigger(true));
    wait_until_idle(&manager).await;
}

#[actix_web::test]
async fn unforced_backups_wait_for_the_interval() {
    let url = seeded_database("interval");
    let sink = Arc::new(GatedSink::new());
    sink.release();
    let manager = BackupManager::new(&url, sink.clone(), Duration::minutes(10));

    assert!(manager.is_due(Utc::now()));
    sink.mark_backup(Utc::now() - Duration::minutes(5)).unwrap();
    assert!(!manager.is_due(Utc::now()));
    assert!(manager.is_due(Utc::now() + Duration::minutes(6)));
}
