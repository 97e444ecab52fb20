//! Call history and lifecycle audit trail for providers.

mod audit;
mod manager;
mod ring_buffer;

pub use audit::{AuditAction, AuditEntry, AuditError, AuditLogger, AuditResult};
pub use manager::LogManager;
pub use ring_buffer::LogRingBuffer;

use chrono::{DateTime, Utc};
use oasis_types::ProviderType;
use serde::{Deserialize, Serialize};

/// Outcome of one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    Success,
    Failure,
}

/// One call routed to a provider, as seen at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCallRecord {
    pub timestamp: DateTime<Utc>,
    pub provider: ProviderType,
    pub operation: String,
    pub outcome: CallOutcome,
    pub elapsed_ms: u64,
    /// Zero for the first attempt, incremented per retry.
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProviderCallRecord {
    pub fn is_failure(&self) -> bool {
        self.outcome == CallOutcome::Failure
    }
}
