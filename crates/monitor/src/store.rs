// crates/monitor/src/store.rs
//! The reconciliation authority for one job's state.

use tracing::debug;

use autologin_types::{Job, LogEvent, StreamMessage};

use crate::log_buffer::LogBuffer;

/// Merges the two update channels (snapshot fetch, event stream) into one
/// authoritative `Job` view.
///
/// Both channels deliver complete `Job` values, so the merge function is
/// last-write-wins whole-entity replacement: whichever update is processed
/// later wins outright. No field-level merge, no version vectors. If the
/// stream outruns the snapshot fetch, a logically older snapshot can briefly
/// regress the view until the next stream message — accepted tradeoff, kept
/// simple on purpose.
#[derive(Debug, Default)]
pub struct JobStateStore {
    current: Option<Job>,
    logs: LogBuffer,
}

impl JobStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the one-shot snapshot fetch result. Whole-value write, whether
    /// or not a stream message already landed.
    pub fn apply_initial_snapshot(&mut self, job: Job) {
        debug!(job_id = %job.id, status = ?job.status, "applying snapshot");
        self.current = Some(job);
    }

    /// Apply one decoded stream message: logs append, job payloads replace.
    pub fn apply_stream_message(&mut self, msg: StreamMessage) {
        match msg {
            StreamMessage::Log(event) => self.logs.append(event),
            StreamMessage::Snapshot(job) => {
                debug!(job_id = %job.id, status = ?job.status, "applying stream replacement");
                self.current = Some(job);
            }
        }
    }

    /// The current authoritative view; absent until the first update lands.
    pub fn current(&self) -> Option<&Job> {
        self.current.as_ref()
    }

    pub fn logs(&self) -> &[LogEvent] {
        self.logs.events()
    }
}
