//! Bounded per-provider call history.

use super::ProviderCallRecord;
use std::collections::VecDeque;

/// A ring buffer for call records with a maximum capacity.
#[derive(Debug)]
pub struct LogRingBuffer {
    buffer: VecDeque<ProviderCallRecord>,
    max_size: usize,
}

impl LogRingBuffer {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            buffer: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    /// Add a record, evicting the oldest when full.
    pub fn push(&mut self, record: ProviderCallRecord) {
        if self.buffer.len() >= self.max_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(record);
    }

    /// The most recent `count` records, oldest first.
    pub fn get_recent(&self, count: usize) -> Vec<ProviderCallRecord> {
        let start = self.buffer.len().saturating_sub(count);
        self.buffer.iter().skip(start).cloned().collect()
    }

    pub fn get_all(&self) -> Vec<ProviderCallRecord> {
        self.buffer.iter().cloned().collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProviderCallRecord> {
        self.buffer.iter().filter(|record| record.is_failure())
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::CallOutcome;
    use chrono::Utc;
    use oasis_types::ProviderType;

    fn record(operation: &str, outcome: CallOutcome) -> ProviderCallRecord {
        ProviderCallRecord {
            timestamp: Utc::now(),
            provider: ProviderType::MongoDb,
            operation: operation.to_string(),
            outcome,
            elapsed_ms: 1,
            attempt: 0,
            message: None,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut buffer = LogRingBuffer::new(2);
        buffer.push(record("load_holon", CallOutcome::Success));
        buffer.push(record("save_holon", CallOutcome::Failure));
        buffer.push(record("search", CallOutcome::Success));

        let operations: Vec<String> = buffer.get_all().into_iter().map(|record| record.operation).collect();
        assert_eq!(operations, ["save_holon", "search"]);
        assert_eq!(buffer.failures().count(), 1);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut buffer = LogRingBuffer::new(10);
        for operation in ["a", "b", "c"] {
            buffer.push(record(operation, CallOutcome::Success));
        }
        let recent: Vec<String> = buffer.get_recent(2).into_iter().map(|record| record.operation).collect();
        assert_eq!(recent, ["b", "c"]);
        assert_eq!(buffer.get_recent(99).len(), 3);
    }
}
