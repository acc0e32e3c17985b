// crates/monitor/src/log_buffer.rs
//! Append-only buffer of streamed log events.

use autologin_types::LogEvent;

/// Ordered store of log events for one monitoring session.
///
/// Pure append: no eviction, no size cap, no timestamp re-sorting (server
/// timestamps may be absent or out of order; arrival order is the only
/// guarantee). The buffer lives and dies with its session.
#[derive(Debug, Default)]
pub struct LogBuffer {
    events: Vec<LogEvent>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    /// All events, in exactly the order they arrived.
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autologin_types::LogLevel;
    use chrono::{TimeZone, Utc};

    fn event(message: &str, time: Option<i64>) -> LogEvent {
        LogEvent {
            time: time.map(|t| Utc.timestamp_opt(t, 0).unwrap()),
            level: LogLevel::Info,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut buffer = LogBuffer::new();
        for i in 0..5 {
            buffer.append(event(&format!("line {i}"), None));
        }
        assert_eq!(buffer.len(), 5);
        let messages: Vec<&str> = buffer.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["line 0", "line 1", "line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_unordered_timestamps_are_not_resorted() {
        let mut buffer = LogBuffer::new();
        buffer.append(event("newest first", Some(3000)));
        buffer.append(event("no timestamp", None));
        buffer.append(event("oldest last", Some(1000)));

        let messages: Vec<&str> = buffer.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["newest first", "no timestamp", "oldest last"]);
    }

    #[test]
    fn test_empty() {
        let buffer = LogBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }
}
