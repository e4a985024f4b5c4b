//! Job definition, type and status.

use chrono::{DateTime, Duration, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

/// Length of generated job identifiers.
const ID_LENGTH: usize = 12;

/// Job type.
///
/// Which due-job bucket a job belongs to. The distinction (e.g. whether
/// concurrent executions of the same job are allowed) is owned by the
/// caller, not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    /// One execution at a time.
    Single,
    /// Concurrent executions allowed.
    Multiple,
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Single
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Single => write!(f, "single"),
            JobType::Multiple => write!(f, "multiple"),
        }
    }
}

/// Job execution status, derived from the execution window timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Never executed.
    NeverStarted,
    /// Currently executing.
    InProgress,
    /// Last execution finished.
    Done,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::NeverStarted => write!(f, "never started"),
            JobStatus::InProgress => write!(f, "in progress"),
            JobStatus::Done => write!(f, "done"),
        }
    }
}

/// A scheduled-task definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID. Generated at construction; treated as immutable.
    pub id: String,
    /// Cron recurrence expression (5-field standard or 6-field with seconds).
    pub expression: String,
    /// What to run. Opaque payload, never executed by this crate.
    pub command: String,
    /// Job type.
    pub job_type: JobType,
    /// Whether the job participates in due-job evaluation.
    pub active: bool,
    /// Free-text comment.
    pub comment: String,
    /// Start of the most recent execution window.
    pub started_at: Option<DateTime<Utc>>,
    /// End of the most recent execution window.
    pub ended_at: Option<DateTime<Utc>>,
    /// Creation time. Caller-maintained, never set by this crate.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time. Caller-maintained, never set by this crate.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new job with a freshly generated ID.
    ///
    /// Everything else starts empty and inactive; populate fields with the
    /// `with_*` builders.
    pub fn new() -> Self {
        Self {
            id: nanoid!(ID_LENGTH),
            expression: String::new(),
            command: String::new(),
            job_type: JobType::Single,
            active: false,
            comment: String::new(),
            started_at: None,
            ended_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the cron expression.
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    /// Set the command payload.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the job type.
    pub fn with_type(mut self, job_type: JobType) -> Self {
        self.job_type = job_type;
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the start of the execution window.
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Set the end of the execution window.
    pub fn with_ended_at(mut self, ended_at: DateTime<Utc>) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    /// Set the creation time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set the last update time.
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Derive the execution status from the execution window.
    ///
    /// A window that ends exactly when it started counts as done.
    pub fn status(&self) -> JobStatus {
        match (self.started_at, self.ended_at) {
            (None, _) => JobStatus::NeverStarted,
            (Some(_), None) => JobStatus::InProgress,
            (Some(started), Some(ended)) if started > ended => JobStatus::InProgress,
            _ => JobStatus::Done,
        }
    }

    /// Duration of the most recent execution window.
    ///
    /// `None` unless both timestamps are set and the window is non-negative.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(started), Some(ended)) if ended >= started => Some(ended - started),
            _ => None,
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_new() {
        let job = Job::new();
        assert_eq!(job.id.len(), 12);
        assert!(!job.active);
        assert_eq!(job.job_type, JobType::Single);
        assert_eq!(job.status(), JobStatus::NeverStarted);
    }

    #[test]
    fn test_job_ids_distinct() {
        let a = Job::new();
        let b = Job::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_builders() {
        let job = Job::new()
            .with_expression("*/5 * * * *")
            .with_command("backup.sh")
            .with_type(JobType::Multiple)
            .with_active(true)
            .with_comment("nightly");

        assert_eq!(job.expression, "*/5 * * * *");
        assert_eq!(job.command, "backup.sh");
        assert_eq!(job.job_type, JobType::Multiple);
        assert!(job.active);
        assert_eq!(job.comment, "nightly");
    }

    #[test]
    fn test_status_derivation() {
        let started = Utc::now();

        let job = Job::new();
        assert_eq!(job.status(), JobStatus::NeverStarted);

        let job = Job::new().with_started_at(started);
        assert_eq!(job.status(), JobStatus::InProgress);

        // Started after the previous run ended: a new run is in progress.
        let job = Job::new()
            .with_started_at(started)
            .with_ended_at(started - Duration::minutes(5));
        assert_eq!(job.status(), JobStatus::InProgress);

        let job = Job::new()
            .with_started_at(started)
            .with_ended_at(started + Duration::minutes(5));
        assert_eq!(job.status(), JobStatus::Done);

        // Zero-length window still counts as done.
        let job = Job::new().with_started_at(started).with_ended_at(started);
        assert_eq!(job.status(), JobStatus::Done);
    }

    #[test]
    fn test_duration() {
        let started = Utc::now();

        assert_eq!(Job::new().duration(), None);
        assert_eq!(Job::new().with_started_at(started).duration(), None);

        let job = Job::new()
            .with_started_at(started)
            .with_ended_at(started + Duration::seconds(90));
        assert_eq!(job.duration(), Some(Duration::seconds(90)));

        // Inverted window has no duration.
        let job = Job::new()
            .with_started_at(started)
            .with_ended_at(started - Duration::seconds(1));
        assert_eq!(job.duration(), None);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(JobType::Single.to_string(), "single");
        assert_eq!(JobType::Multiple.to_string(), "multiple");
        assert_eq!(JobStatus::NeverStarted.to_string(), "never started");
        assert_eq!(JobStatus::InProgress.to_string(), "in progress");
        assert_eq!(JobStatus::Done.to_string(), "done");

        let job = Job::new();
        assert_eq!(job.to_string(), job.id);
    }
}
