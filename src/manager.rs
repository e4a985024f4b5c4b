//! Job collection manager.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::error::StoreError;
use crate::index::JobIndex;
use crate::job::{Job, JobType};
use crate::schedule;
use crate::store::{JobStore, WriteBatch};

/// Manages a collection of jobs backed by a [`JobStore`].
///
/// The manager keeps one index record listing every tracked job id, plus one
/// record per job stored under `"{job_key_prefix}.{id}"`. Every mutating
/// operation stages its writes on a [`WriteBatch`] and commits once.
///
/// Two managers mutating the same index concurrently race: both read the
/// index, both commit an updated copy, and the later commit wins. Callers
/// needing stronger guarantees must serialize index mutations externally.
pub struct JobManager {
    config: ManagerConfig,
    store: Arc<dyn JobStore>,
}

impl JobManager {
    /// Create a manager with default configuration.
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self::with_config(ManagerConfig::default(), store)
    }

    /// Create a manager with the given configuration.
    pub fn with_config(config: ManagerConfig, store: Arc<dyn JobStore>) -> Self {
        Self { config, store }
    }

    /// Store key for a job record.
    fn job_key(&self, id: &str) -> String {
        format!("{}.{}", self.config.job_key_prefix, id)
    }

    /// Load the id index, treating an absent record as empty.
    async fn load_index(&self) -> Result<JobIndex, StoreError> {
        let Some(value) = self.store.get(&self.config.index_key).await? else {
            return Ok(JobIndex::new());
        };

        serde_json::from_value(value).map_err(|e| {
            StoreError::Serialization(format!("Failed to deserialize job index: {}", e))
        })
    }

    fn encode_index(index: &JobIndex) -> Result<Value, StoreError> {
        serde_json::to_value(index).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize job index: {}", e))
        })
    }

    fn encode_job(job: &Job) -> Result<Value, StoreError> {
        serde_json::to_value(job).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize job '{}': {}", job.id, e))
        })
    }

    fn decode_job(value: Value) -> Result<Job, StoreError> {
        serde_json::from_value(value).map_err(|e| {
            StoreError::Serialization(format!("Failed to deserialize job record: {}", e))
        })
    }

    /// Fetch a single job by id. Returns `None` when no record exists.
    pub async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let Some(value) = self.store.get(&self.job_key(id)).await? else {
            return Ok(None);
        };

        Ok(Some(Self::decode_job(value)?))
    }

    /// Overwrite the record stored under `id`.
    ///
    /// The index is left untouched, so writing to an untracked id produces a
    /// record that no listing will return.
    pub async fn set_job(&self, id: &str, job: &Job) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.put(self.job_key(id), Self::encode_job(job)?);
        self.store.commit(batch).await?;

        debug!("Saved job record '{}'", id);
        Ok(())
    }

    /// Fetch every indexed job, in index order.
    ///
    /// A `None` slot marks an id whose record is missing from the store, so
    /// the index and store have drifted apart for that entry.
    pub async fn get_jobs(&self) -> Result<Vec<Option<Job>>, StoreError> {
        let index = self.load_index().await?;
        let keys: Vec<String> = index.ids().iter().map(|id| self.job_key(id)).collect();
        let values = self.store.get_many(&keys).await?;

        let mut jobs = Vec::with_capacity(values.len());
        for (id, value) in index.ids().iter().zip(values) {
            match value {
                Some(value) => jobs.push(Some(Self::decode_job(value)?)),
                None => {
                    warn!("Job '{}' is indexed but has no record", id);
                    jobs.push(None);
                }
            }
        }

        Ok(jobs)
    }

    /// Replace the whole collection with `jobs`.
    ///
    /// The index is rebuilt from the given jobs (duplicate ids keep their
    /// first position, the last record for an id wins) and every record is
    /// written in one commit. Records of previously indexed ids missing from
    /// `jobs` are left behind unless [`ManagerConfig::delete_orphans`] is
    /// set, in which case they are deleted in the same batch.
    pub async fn set_jobs(&self, jobs: &[Job]) -> Result<(), StoreError> {
        let index = JobIndex::from_ids(jobs.iter().map(|job| job.id.as_str()));

        let mut batch = WriteBatch::new();

        if self.config.delete_orphans {
            let previous = self.load_index().await?;
            for id in previous.ids() {
                if !index.contains(id) {
                    batch.delete(self.job_key(id));
                }
            }
        }

        for job in jobs {
            batch.put(self.job_key(&job.id), Self::encode_job(job)?);
        }
        batch.put(self.config.index_key.clone(), Self::encode_index(&index)?);

        self.store.commit(batch).await?;

        info!("Replaced job collection, {} jobs indexed", index.len());
        Ok(())
    }

    /// Append `job` to the collection.
    ///
    /// The id is appended to the index when not already tracked; the record
    /// is written either way, so re-adding an id refreshes its record.
    pub async fn add_job(&self, job: &Job) -> Result<(), StoreError> {
        let mut index = self.load_index().await?;
        let appended = index.insert(job.id.as_str());

        let mut batch = WriteBatch::new();
        batch.put(self.job_key(&job.id), Self::encode_job(job)?);
        batch.put(self.config.index_key.clone(), Self::encode_index(&index)?);
        self.store.commit(batch).await?;

        if appended {
            debug!("Added job '{}'", job.id);
        } else {
            debug!("Job '{}' already indexed, record refreshed", job.id);
        }
        Ok(())
    }

    /// Remove the job with `id` from the collection.
    ///
    /// Removal acts on the index entry and the record key directly. An
    /// untracked id is not an error; its record key is deleted anyway, which
    /// also purges orphaned records.
    pub async fn remove_job(&self, id: &str) -> Result<(), StoreError> {
        let mut index = self.load_index().await?;
        let removed = index.remove(id);

        let mut batch = WriteBatch::new();
        batch.put(self.config.index_key.clone(), Self::encode_index(&index)?);
        batch.delete(self.job_key(id));
        self.store.commit(batch).await?;

        if removed {
            debug!("Removed job '{}'", id);
        } else {
            debug!("Job '{}' was not indexed", id);
        }
        Ok(())
    }

    /// Fetch the active jobs of `job_type` that are due right now.
    pub async fn get_due_jobs(&self, job_type: JobType) -> Result<Vec<Job>, StoreError> {
        self.get_due_jobs_at(job_type, Utc::now()).await
    }

    /// Fetch the active jobs of `job_type` whose expression matches `at`.
    ///
    /// Results follow index order. Index entries without a record are
    /// skipped. A malformed expression on a candidate job aborts with
    /// [`StoreError::InvalidSchedule`].
    pub async fn get_due_jobs_at(
        &self,
        job_type: JobType,
        at: DateTime<Utc>,
    ) -> Result<Vec<Job>, StoreError> {
        let mut due = Vec::new();
        for job in self.get_jobs().await?.into_iter().flatten() {
            if !job.active || job.job_type != job_type {
                continue;
            }
            if schedule::is_due(&job.expression, at)? {
                due.push(job);
            }
        }

        debug!("{} {} jobs due at {}", due.len(), job_type, at);
        Ok(due)
    }
}
