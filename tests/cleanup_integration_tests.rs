//! Integration Tests for the Cleanup Service
//!
//! Drives full ticks against a real temp directory and SQLite database.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeDelta, Utc};
use grafana_cleanup::cleanup::StepOutcome;
use grafana_cleanup::lock::{InMemoryServerLock, SqliteServerLock};
use grafana_cleanup::store::SqliteStore;
use grafana_cleanup::{CleanupService, Config};
use rusqlite::params;
use tempfile::TempDir;

// == Helper Functions ==

fn touch(dir: &Path, name: &str, modified: DateTime<Utc>) {
    let file = File::create(dir.join(name)).unwrap();
    file.set_modified(SystemTime::from(modified)).unwrap();
}

fn test_config(workspace: &TempDir) -> Config {
    let images_dir = workspace.path().join("png");
    std::fs::create_dir_all(&images_dir).unwrap();
    Config {
        images_dir,
        temp_data_lifetime: Duration::from_secs(3600),
        user_invite_max_lifetime_days: 3,
        database_path: workspace.path().join("grafana.db"),
        ..Config::default()
    }
}

fn invite_emails(store: &SqliteStore) -> Vec<String> {
    store
        .with_session(|conn| {
            let mut stmt = conn.prepare("SELECT email FROM temp_user ORDER BY email")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .unwrap()
}

// == Temp File Scenarios ==

#[test]
fn test_tick_removes_only_stale_images() {
    let workspace = tempfile::tempdir().unwrap();
    let config = test_config(&workspace);
    let now = Utc::now();
    touch(&config.images_dir, "a.png", now - TimeDelta::hours(2));
    touch(&config.images_dir, "b.png", now - TimeDelta::minutes(30));

    let store = SqliteStore::new(&config.database_path).unwrap();
    let images_dir = config.images_dir.clone();
    let service = CleanupService::new(
        config,
        Arc::new(store),
        Arc::new(InMemoryServerLock::new()),
    );

    let report = service.run_tick_at(now);

    assert_eq!(report.temp_files.deleted, 1);
    assert_eq!(report.temp_files.kept, 1);
    assert!(!images_dir.join("a.png").exists());
    assert!(images_dir.join("b.png").exists());

    let again = service.run_tick_at(now);
    assert_eq!(again.temp_files.deleted, 0, "second pass should find nothing stale");
}

#[test]
fn test_missing_images_dir_is_ignored() {
    let workspace = tempfile::tempdir().unwrap();
    let config = Config {
        images_dir: workspace.path().join("does-not-exist"),
        ..test_config(&workspace)
    };
    let store = SqliteStore::new(&config.database_path).unwrap();
    let service = CleanupService::new(
        config,
        Arc::new(store),
        Arc::new(InMemoryServerLock::new()),
    );

    let report = service.run_tick_at(Utc::now());

    assert_eq!(report.temp_files.scanned, 0);
    assert_eq!(report.failed_steps(), 0);
}

// == Database Scenarios ==

#[test]
fn test_expired_user_invites_are_removed() {
    let workspace = tempfile::tempdir().unwrap();
    let config = test_config(&workspace);
    let now = Utc::now();

    let store = Arc::new(SqliteStore::new(&config.database_path).unwrap());
    store
        .with_session(|conn| {
            conn.execute(
                "INSERT INTO temp_user (email, status, created_at) VALUES
                 ('old@example.com', 'InvitePending', ?1),
                 ('new@example.com', 'InvitePending', ?2)",
                params![
                    (now - TimeDelta::days(4)).timestamp(),
                    (now - TimeDelta::days(2)).timestamp()
                ],
            )
        })
        .unwrap();

    let service = CleanupService::new(
        config,
        store.clone(),
        Arc::new(InMemoryServerLock::new()),
    );
    let report = service.run_tick_at(now);

    assert_eq!(report.user_invites, StepOutcome::Deleted(1));
    assert_eq!(invite_emails(&store), vec!["new@example.com".to_string()]);
}

#[test]
fn test_one_instance_purges_login_attempts_per_window() {
    let workspace = tempfile::tempdir().unwrap();
    let config = test_config(&workspace);
    let now = Utc::now();

    let store = Arc::new(SqliteStore::new(&config.database_path).unwrap());
    store
        .with_session(|conn| {
            conn.execute(
                "INSERT INTO login_attempt (username, ip_address, created) VALUES
                 ('admin', '10.0.0.1', ?1), ('admin', '10.0.0.2', ?1)",
                params![(now - TimeDelta::hours(1)).timestamp()],
            )
        })
        .unwrap();

    let instances: Vec<CleanupService> = (0..2)
        .map(|_| {
            let lock = SqliteServerLock::new(&config.database_path).unwrap();
            CleanupService::new(config.clone(), store.clone(), Arc::new(lock))
        })
        .collect();

    let first = instances[0].run_tick_at(now);
    let second = instances[1].run_tick_at(now + TimeDelta::minutes(1));

    assert_eq!(first.login_attempts, StepOutcome::Deleted(2));
    assert_eq!(second.login_attempts, StepOutcome::Skipped);
}

#[test]
fn test_all_database_passes_run_in_one_tick() {
    let workspace = tempfile::tempdir().unwrap();
    let config = Config {
        dashboard_versions_to_keep: 1,
        ..test_config(&workspace)
    };
    let now = Utc::now();

    let store = Arc::new(SqliteStore::new(&config.database_path).unwrap());
    store
        .with_session(|conn| {
            conn.execute(
                "INSERT INTO dashboard_snapshot (key, dashboard_id, created, expires)
                 VALUES ('gone', 1, ?1, ?1)",
                params![(now - TimeDelta::days(1)).timestamp()],
            )?;
            conn.execute(
                "INSERT INTO dashboard_version (dashboard_id, version, created)
                 VALUES (1, 1, 0), (1, 2, 0), (1, 3, 0)",
                [],
            )
        })
        .unwrap();

    let service = CleanupService::new(
        config,
        store.clone(),
        Arc::new(InMemoryServerLock::new()),
    );
    let report = service.run_tick_at(now);

    assert_eq!(report.snapshots, StepOutcome::Deleted(1));
    assert_eq!(report.dashboard_versions, StepOutcome::Deleted(2));
    assert_eq!(report.user_invites, StepOutcome::Deleted(0));
    assert_eq!(report.login_attempts, StepOutcome::Deleted(0));
}
