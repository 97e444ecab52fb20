//! Audit logging for provider registry and lifecycle events.

use chrono::{DateTime, Utc};
use oasis_types::ProviderType;
use oasis_util::redact_json;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_AGE_DAYS: u64 = 7;

/// Appends lifecycle events as JSON lines, rotating the file by size and age.
#[derive(Debug)]
pub struct AuditLogger {
    log_path: PathBuf,
    max_size: u64,
    max_age_days: u64,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub provider: ProviderType,
    pub action: AuditAction,
    /// Additional details; redacted before writing.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub result: AuditResult,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditAction {
    Register,
    Replace,
    Deregister,
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditResult {
    Success,
    Failure,
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit entry could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditEntry {
    pub fn new(provider: ProviderType, action: AuditAction, result: AuditResult) -> Self {
        Self {
            timestamp: Utc::now(),
            provider,
            action,
            metadata: serde_json::Map::new(),
            result,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl AuditLogger {
    /// Audit logger writing to `log_path` with default rotation limits.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self::with_settings(log_path.into(), DEFAULT_MAX_SIZE, DEFAULT_MAX_AGE_DAYS)
    }

    pub fn with_settings(log_path: PathBuf, max_size: u64, max_age_days: u64) -> Self {
        Self {
            log_path,
            max_size,
            max_age_days,
        }
    }

    /// Append an entry, rotating first when the current file is too big or old.
    pub async fn log(&self, entry: AuditEntry) -> Result<(), AuditError> {
        if let Some(parent) = self.log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        if self.should_rotate().await? {
            self.rotate_log().await?;
        }

        let redacted = redact_entry(entry);
        let mut line = serde_json::to_string(&redacted)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.log_path).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.log_path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(provider = %redacted.provider, action = ?redacted.action, result = ?redacted.result, "audit entry written");
        Ok(())
    }

    async fn should_rotate(&self) -> Result<bool, AuditError> {
        let metadata = match tokio::fs::metadata(&self.log_path).await {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(error) => return Err(error.into()),
        };
        if metadata.len() > self.max_size {
            return Ok(true);
        }
        let age = metadata.modified()?.elapsed().unwrap_or_default();
        Ok(age.as_secs() > self.max_age_days * 24 * 60 * 60)
    }

    async fn rotate_log(&self) -> Result<(), AuditError> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let rotated_path = self.log_path.with_extension(format!("{timestamp}.jsonl"));
        tokio::fs::rename(&self.log_path, &rotated_path).await?;
        debug!(from = %self.log_path.display(), to = %rotated_path.display(), "rotated audit log");
        Ok(())
    }

    /// Read up to `count` most recent entries in chronological order. Lines
    /// that fail to parse are skipped.
    pub async fn read_recent(&self, count: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let content = match tokio::fs::read_to_string(&self.log_path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };
        let mut entries: Vec<AuditEntry> = content
            .lines()
            .rev()
            .filter_map(|line| serde_json::from_str(line).ok())
            .take(count)
            .collect();
        entries.reverse();
        Ok(entries)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

fn redact_entry(mut entry: AuditEntry) -> AuditEntry {
    let metadata = serde_json::Value::Object(std::mem::take(&mut entry.metadata));
    if let serde_json::Value::Object(redacted) = redact_json(&metadata) {
        entry.metadata = redacted;
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_redacted_jsonl_entries() {
        let dir = tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().join("audit").join("providers.jsonl"));

        let entry = AuditEntry::new(ProviderType::Ethereum, AuditAction::Activate, AuditResult::Success)
            .with_detail("privateKey", "0xabc")
            .with_detail("network", "sepolia");
        logger.log(entry).await.unwrap();
        logger
            .log(AuditEntry::new(ProviderType::Ethereum, AuditAction::Deactivate, AuditResult::Failure))
            .await
            .unwrap();

        let entries = logger.read_recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::Activate);
        assert_eq!(entries[0].metadata["privateKey"], "[REDACTED]");
        assert_eq!(entries[0].metadata["network"], "sepolia");
        assert_eq!(entries[1].result, AuditResult::Failure);
    }

    #[tokio::test]
    async fn rotates_when_size_limit_is_exceeded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = AuditLogger::with_settings(path.clone(), 10, DEFAULT_MAX_AGE_DAYS);

        logger
            .log(AuditEntry::new(ProviderType::MongoDb, AuditAction::Register, AuditResult::Success))
            .await
            .unwrap();
        logger
            .log(AuditEntry::new(ProviderType::MongoDb, AuditAction::Activate, AuditResult::Success))
            .await
            .unwrap();

        let entries = logger.read_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Activate);
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().join("none.jsonl"));
        assert!(logger.read_recent(5).await.unwrap().is_empty());
    }
}
