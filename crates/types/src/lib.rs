// crates/types/src/lib.rs
//! Shared data model for the autologin batch-processing client.
//!
//! Mirrors the JSON the server speaks: `Job` snapshots from the REST API and
//! the two message shapes delivered over the per-job WebSocket.

pub mod job;
pub mod log;
pub mod wire;

pub use job::{Job, JobStatus};
pub use log::{LogEvent, LogLevel};
pub use wire::{StreamMessage, WireError};
