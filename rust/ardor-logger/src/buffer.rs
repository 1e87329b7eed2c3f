use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ApiLevel;

/// One buffered line, as submitted to the logs API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The assembled message, without level or time prefix
    pub message: String,
    /// Severity
    pub log_level: ApiLevel,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

/// Request body of a submission.
#[derive(Debug, Serialize)]
pub struct LogBatch<'a> {
    /// The entries, oldest first
    pub logs: &'a [LogEntry],
}

/// Bounded queue of entries awaiting delivery. When full, the oldest
/// entries are dropped.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    /// An empty buffer holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `entry`.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        self.trim();
    }

    /// Remove and return everything, oldest first.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        self.entries.drain(..).collect()
    }

    /// Put a batch that failed to send back in front of anything buffered
    /// since.
    pub fn requeue(&mut self, batch: Vec<LogEntry>) {
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        self.trim();
    }

    /// The held entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            message: message.into(),
            log_level: ApiLevel::Error,
            timestamp: 1_700_000_000,
        }
    }

    fn messages(buffer: &LogBuffer) -> Vec<&str> {
        buffer.entries().map(|entry| entry.message.as_str()).collect()
    }

    #[test]
    fn it_keeps_only_the_newest_entries() {
        let mut buffer = LogBuffer::new(2);

        buffer.push(entry("a"));
        buffer.push(entry("b"));
        buffer.push(entry("c"));

        assert_eq!(messages(&buffer), vec!["b", "c"]);
    }

    #[test]
    fn it_requeues_failed_batches_ahead_of_newer_entries() {
        let mut buffer = LogBuffer::new(3);
        buffer.push(entry("a"));
        buffer.push(entry("b"));
        let batch = buffer.drain();
        buffer.push(entry("c"));
        buffer.push(entry("d"));

        buffer.requeue(batch);

        assert_eq!(messages(&buffer), vec!["b", "c", "d"]);
    }

    #[test]
    fn it_encodes_batches_for_the_logs_api() -> anyhow::Result<()> {
        let logs = vec![entry("boom")];

        assert_eq!(
            serde_json::to_value(LogBatch { logs: &logs })?,
            serde_json::json!({
                "logs": [{ "message": "boom", "log_level": "error", "timestamp": 1_700_000_000 }]
            })
        );
        Ok(())
    }
}
