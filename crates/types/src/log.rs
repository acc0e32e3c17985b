// crates/types/src/log.rs
//! Log events forwarded by the server while a job is processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a server-side log event.
///
/// Unknown level strings fold to `Info` rather than failing the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Warn,
    Error,
    // serde requires the catch-all variant to come last.
    #[serde(other)]
    Info,
}

/// One log line from the processing engine, immutable once received.
///
/// There is no identifier and no dedup key; ordering is arrival order on the
/// stream. Timestamps may be absent or unordered and are never used to
/// re-sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub message: String,
}
