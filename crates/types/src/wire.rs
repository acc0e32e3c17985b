// crates/types/src/wire.rs
//! Translation boundary for the per-job WebSocket protocol.
//!
//! The server sends two payload shapes on the same channel:
//!
//! - `{"type": "log", "data": {..LogEvent..}}`
//! - a bare `Job` object with no `type` field at all
//!
//! The protocol carries no discriminator on Job frames, so "has no `type`
//! field" is itself the tag. Whether that is an intentional minimal protocol
//! or an oversight is unknowable from this side of the wire; we preserve the
//! behavior but confine the ambiguity to [`StreamMessage::parse`]. Everything
//! past this function works with an explicitly tagged variant.

use serde::Deserialize;
use thiserror::Error;

use crate::job::Job;
use crate::log::LogEvent;

/// One decoded unit from the job event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// A log line to append to the session's log buffer.
    Log(LogEvent),
    /// A full replacement of the current `Job` value.
    Snapshot(Job),
}

/// Decode failures at the wire boundary.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed stream message: {0}")]
    MalformedMessage(String),
}

#[derive(Deserialize)]
struct LogEnvelope {
    data: LogEvent,
}

impl StreamMessage {
    /// Decode one text frame from the job stream.
    ///
    /// Frames that match neither shape yield `WireError::MalformedMessage`;
    /// callers drop those with the current state left unchanged.
    pub fn parse(payload: &str) -> Result<StreamMessage, WireError> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| WireError::MalformedMessage(format!("invalid JSON: {e}")))?;

        let tag = value
            .as_object()
            .ok_or_else(|| WireError::MalformedMessage("payload is not an object".into()))?
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_owned);

        match tag.as_deref() {
            Some("log") => {
                let envelope: LogEnvelope = serde_json::from_value(value)
                    .map_err(|e| WireError::MalformedMessage(format!("bad log envelope: {e}")))?;
                Ok(StreamMessage::Log(envelope.data))
            }
            Some(other) => Err(WireError::MalformedMessage(format!(
                "unknown message type {other:?}"
            ))),
            // No `type` field: the server's only signal that this is a Job.
            None => {
                let job: Job = serde_json::from_value(value)
                    .map_err(|e| WireError::MalformedMessage(format!("bad job payload: {e}")))?;
                Ok(StreamMessage::Snapshot(job))
            }
        }
    }
}
