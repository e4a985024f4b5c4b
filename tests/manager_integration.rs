//! End-to-end integration tests for the job manager over persistent stores.
//!
//! These tests drive the full flow: build jobs, persist them through a
//! manager, reopen the backing store, and evaluate due jobs.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use cronstore::{
    FileJobStore, Job, JobManager, JobStatus, JobType, ManagerConfig, SqliteJobStore,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn nightly_backup() -> Job {
    Job::new()
        .with_expression("0 2 * * *")
        .with_command("/usr/local/bin/backup.sh")
        .with_type(JobType::Single)
        .with_active(true)
        .with_comment("Nightly database backup")
}

fn minutely_probe() -> Job {
    Job::new()
        .with_expression("* * * * *")
        .with_command("/usr/local/bin/probe.sh")
        .with_type(JobType::Multiple)
        .with_active(true)
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Test: full job lifecycle over a file-backed store.
#[tokio::test]
async fn test_file_store_job_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileJobStore::new(temp_dir.path()).await.unwrap());
    let manager = JobManager::new(store);

    let backup = nightly_backup();
    let probe = minutely_probe();

    manager.add_job(&backup).await.unwrap();
    manager.add_job(&probe).await.unwrap();

    let jobs = manager.get_jobs().await.unwrap();
    assert_eq!(jobs, vec![Some(backup.clone()), Some(probe.clone())]);

    // Record an execution window through set_job
    let started = Utc.with_ymd_and_hms(2024, 5, 15, 2, 0, 0).unwrap();
    let ended = Utc.with_ymd_and_hms(2024, 5, 15, 2, 4, 30).unwrap();
    let ran = backup
        .clone()
        .with_started_at(started)
        .with_ended_at(ended);
    manager.set_job(&ran.id, &ran).await.unwrap();

    let fetched = manager.get_job(&backup.id).await.unwrap().unwrap();
    assert_eq!(fetched.status(), JobStatus::Done);
    assert_eq!(fetched.duration(), Some(Duration::seconds(270)));

    manager.remove_job(&probe.id).await.unwrap();
    assert_eq!(manager.get_job(&probe.id).await.unwrap(), None);
    assert_eq!(manager.get_jobs().await.unwrap().len(), 1);
}

/// Test: the collection persists across a store reopen.
#[tokio::test]
async fn test_file_store_collection_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    let backup = nightly_backup();
    let probe = minutely_probe();

    {
        let store = Arc::new(FileJobStore::new(temp_dir.path()).await.unwrap());
        let manager = JobManager::new(store);
        manager.add_job(&backup).await.unwrap();
        manager.add_job(&probe).await.unwrap();
    }

    let store = Arc::new(FileJobStore::new(temp_dir.path()).await.unwrap());
    let manager = JobManager::new(store);

    let jobs = manager.get_jobs().await.unwrap();
    assert_eq!(jobs, vec![Some(backup), Some(probe)]);
}

/// Test: due evaluation over a file store honors type, active flag, and
/// the expression at a fixed instant.
#[tokio::test]
async fn test_due_jobs_over_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileJobStore::new(temp_dir.path()).await.unwrap());
    let manager = JobManager::new(store);

    let backup = nightly_backup();
    let probe = minutely_probe();
    let disabled = minutely_probe().with_active(false);

    manager.add_job(&backup).await.unwrap();
    manager.add_job(&probe).await.unwrap();
    manager.add_job(&disabled).await.unwrap();

    // Mid-minute instant inside the backup's 02:00 trigger
    let at = Utc.with_ymd_and_hms(2024, 5, 15, 2, 0, 15).unwrap();

    let due = manager.get_due_jobs_at(JobType::Single, at).await.unwrap();
    assert_eq!(due, vec![backup.clone()]);

    // The inactive probe is excluded even though its expression matches
    let due = manager.get_due_jobs_at(JobType::Multiple, at).await.unwrap();
    assert_eq!(due, vec![probe]);

    // An hour later the backup expression no longer matches
    let at = Utc.with_ymd_and_hms(2024, 5, 15, 3, 0, 0).unwrap();
    let due = manager.get_due_jobs_at(JobType::Single, at).await.unwrap();
    assert_eq!(due, vec![]);
}

/// Test: full job lifecycle over a SQLite-backed store.
#[tokio::test]
async fn test_sqlite_store_job_lifecycle() {
    let store = Arc::new(SqliteJobStore::in_memory().await.unwrap());
    let manager = JobManager::new(store);

    let backup = nightly_backup();
    let probe = minutely_probe();

    manager.add_job(&backup).await.unwrap();
    manager.add_job(&probe).await.unwrap();

    let jobs = manager.get_jobs().await.unwrap();
    assert_eq!(jobs, vec![Some(backup.clone()), Some(probe.clone())]);

    manager.remove_job(&backup.id).await.unwrap();
    assert_eq!(manager.get_jobs().await.unwrap(), vec![Some(probe)]);
}

/// Test: bulk replace with orphan deletion over a SQLite database file.
#[tokio::test]
async fn test_sqlite_replace_deletes_orphans() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("jobs.db");

    let backup = nightly_backup();
    let probe = minutely_probe();

    {
        let store = Arc::new(SqliteJobStore::open(&db_path).await.unwrap());
        let config = ManagerConfig {
            delete_orphans: true,
            ..Default::default()
        };
        let manager = JobManager::with_config(config, store);

        manager.add_job(&backup).await.unwrap();
        manager.add_job(&probe).await.unwrap();
        manager.set_jobs(&[probe.clone()]).await.unwrap();

        assert_eq!(manager.get_job(&backup.id).await.unwrap(), None);
    }

    // The replaced collection is what a fresh manager sees
    let store = Arc::new(SqliteJobStore::open(&db_path).await.unwrap());
    let manager = JobManager::new(store);
    assert_eq!(manager.get_jobs().await.unwrap(), vec![Some(probe)]);
}
