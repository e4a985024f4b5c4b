//! # Cronstore
//!
//! Persistence and query layer for cron-scheduled jobs.
//!
//! ## Features
//!
//! - Indexed job collection over a pluggable key-value store
//! - Explicit write batching with one commit per operation
//! - Due-job evaluation against five/six-field cron expressions
//! - Memory, file, and SQLite store backends

pub mod config;
pub mod error;
pub mod job;
pub mod schedule;
pub mod index;
pub mod store;
pub mod sqlite;
pub mod manager;

pub use config::ManagerConfig;
pub use error::StoreError;
pub use job::{Job, JobStatus, JobType};
pub use index::JobIndex;
pub use manager::JobManager;
pub use store::{FileJobStore, JobStore, MemoryJobStore, WriteBatch};
pub use sqlite::SqliteJobStore;
