//! Per-provider call history plus the optional audit trail.

use super::{AuditEntry, AuditLogger, LogRingBuffer, ProviderCallRecord};
use oasis_types::ProviderType;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

pub const DEFAULT_MAX_ENTRIES_PER_PROVIDER: usize = 1000;

/// Stores recent call records for every provider and forwards lifecycle
/// events to the audit logger when one is configured.
#[derive(Debug)]
pub struct LogManager {
    buffers: Arc<Mutex<HashMap<ProviderType, LogRingBuffer>>>,
    audit_logger: Option<AuditLogger>,
    max_entries_per_provider: usize,
}

impl LogManager {
    pub fn new(max_entries_per_provider: usize) -> Self {
        Self {
            buffers: Arc::new(Mutex::new(HashMap::new())),
            audit_logger: None,
            max_entries_per_provider,
        }
    }

    pub fn with_audit_logger(mut self, audit_logger: AuditLogger) -> Self {
        self.audit_logger = Some(audit_logger);
        self
    }

    pub async fn record_call(&self, record: ProviderCallRecord) {
        let mut buffers = self.buffers.lock().await;
        buffers
            .entry(record.provider)
            .or_insert_with(|| LogRingBuffer::new(self.max_entries_per_provider))
            .push(record);
    }

    /// Up to `count` most recent calls routed to `provider`, oldest first.
    pub async fn recent_calls(&self, provider: ProviderType, count: usize) -> Vec<ProviderCallRecord> {
        let buffers = self.buffers.lock().await;
        buffers.get(&provider).map_or_else(Vec::new, |buffer| buffer.get_recent(count))
    }

    pub async fn all_calls(&self, provider: ProviderType) -> Vec<ProviderCallRecord> {
        let buffers = self.buffers.lock().await;
        buffers.get(&provider).map_or_else(Vec::new, LogRingBuffer::get_all)
    }

    pub async fn clear(&self, provider: ProviderType) {
        if let Some(buffer) = self.buffers.lock().await.get_mut(&provider) {
            buffer.clear();
        }
    }

    /// Write an audit entry. Write failures are logged, not returned.
    pub async fn audit(&self, entry: AuditEntry) {
        let Some(audit_logger) = &self.audit_logger else {
            return;
        };
        let provider = entry.provider;
        if let Err(error) = audit_logger.log(entry).await {
            warn!(provider = %provider, error = %error, "failed to write audit entry");
        }
    }

    pub fn audit_logger(&self) -> Option<&AuditLogger> {
        self.audit_logger.as_ref()
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES_PER_PROVIDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{AuditAction, AuditResult, CallOutcome};
    use chrono::Utc;

    fn call(provider: ProviderType, operation: &str) -> ProviderCallRecord {
        ProviderCallRecord {
            timestamp: Utc::now(),
            provider,
            operation: operation.into(),
            outcome: CallOutcome::Success,
            elapsed_ms: 0,
            attempt: 0,
            message: None,
        }
    }

    #[tokio::test]
    async fn keeps_separate_history_per_provider() {
        let logs = LogManager::new(2);
        logs.record_call(call(ProviderType::MongoDb, "load_holon")).await;
        logs.record_call(call(ProviderType::Neo4j, "save_holon")).await;
        logs.record_call(call(ProviderType::MongoDb, "search")).await;
        logs.record_call(call(ProviderType::MongoDb, "export_all")).await;

        let mongo = logs.all_calls(ProviderType::MongoDb).await;
        assert_eq!(mongo.len(), 2);
        assert_eq!(mongo[1].operation, "export_all");
        assert_eq!(logs.recent_calls(ProviderType::Neo4j, 5).await.len(), 1);

        logs.clear(ProviderType::MongoDb).await;
        assert!(logs.all_calls(ProviderType::MongoDb).await.is_empty());
    }

    #[tokio::test]
    async fn audit_without_logger_is_a_no_op() {
        let logs = LogManager::default();
        logs.audit(AuditEntry::new(ProviderType::Ipfs, AuditAction::Register, AuditResult::Success))
            .await;
        assert!(logs.audit_logger().is_none());
    }
}
