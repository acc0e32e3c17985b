// crates/types/src/job.rs
//! The `Job` entity as the server serializes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a batch-login job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal statuses expect no further transitions from the server.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One batch-processing unit of work, identified by a server-assigned id.
///
/// Every payload the server sends (snapshot fetch or stream replacement) is a
/// complete `Job` value, not a delta. Counter fields are whatever the server
/// last reported; the client replaces, it does not validate or merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub total_accounts: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub fail_count: u64,
    #[serde(default)]
    pub processing_count: u64,
    /// Fraction complete in [0,1].
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Set by the server only once the job reaches a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_file: Option<String>,
    #[serde(default)]
    pub workers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_file: Option<String>,
}

impl Job {
    /// Progress as a whole percentage, `round(progress * 100)`.
    pub fn progress_percent(&self) -> u32 {
        (self.progress * 100.0).round() as u32
    }
}
