//! Manager configuration.

use serde::{Deserialize, Serialize};

/// Job manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Store key holding the job identifier index.
    #[serde(default = "default_index_key")]
    pub index_key: String,

    /// Prefix for job record keys; records are stored under `{prefix}.{id}`.
    #[serde(default = "default_job_key_prefix")]
    pub job_key_prefix: String,

    /// Delete store records whose identifiers are dropped by a bulk replace.
    ///
    /// When false (the default), `set_jobs` leaves such records in the store
    /// as orphans and only rewrites the index.
    #[serde(default)]
    pub delete_orphans: bool,
}

fn default_index_key() -> String {
    "ids".to_string()
}

fn default_job_key_prefix() -> String {
    "job".to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            index_key: default_index_key(),
            job_key_prefix: default_job_key_prefix(),
            delete_orphans: false,
        }
    }
}
