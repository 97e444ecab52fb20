//! Serde model for `oasis.json`.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_MAX_ENTRIES_PER_PROVIDER: usize = 1000;

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct OasisConfig {
    pub storage_providers: StorageProvidersConfig,
    pub logging: LoggingConfig,
}

/// Provider timeouts and failover/replication lists.
///
/// Provider lists hold names as written in the file; they are checked by
/// [`validate_config`](super::validate_config) and turned into provider types
/// by [`FailoverPolicy::from_config`](crate::failover::FailoverPolicy::from_config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StorageProvidersConfig {
    pub provider_method_call_timeout_seconds: u64,
    pub activate_provider_timeout_seconds: u64,
    pub deactivate_provider_timeout_seconds: u64,

    #[serde(rename = "autoFailOverEnabled")]
    pub auto_failover_enabled: bool,
    pub auto_replication_enabled: bool,

    #[serde(rename = "autoFailOverProviders", deserialize_with = "deserialize_provider_list")]
    pub auto_failover_providers: Vec<String>,

    #[serde(deserialize_with = "deserialize_provider_list")]
    pub auto_replication_providers: Vec<String>,

    #[serde(rename = "autoFailOverProvidersForAvatarLogin", deserialize_with = "deserialize_provider_list")]
    pub auto_failover_providers_for_avatar_login: Vec<String>,

    #[serde(
        rename = "autoFailOverProvidersForCheckIfEmailAlreadyInUse",
        deserialize_with = "deserialize_provider_list"
    )]
    pub auto_failover_providers_for_email_check: Vec<String>,

    #[serde(
        rename = "autoFailOverProvidersForCheckIfUsernameAlreadyInUse",
        deserialize_with = "deserialize_provider_list"
    )]
    pub auto_failover_providers_for_username_check: Vec<String>,
}

impl Default for StorageProvidersConfig {
    fn default() -> Self {
        Self {
            provider_method_call_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            activate_provider_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            deactivate_provider_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            auto_failover_enabled: true,
            auto_replication_enabled: false,
            auto_failover_providers: Vec::new(),
            auto_replication_providers: Vec::new(),
            auto_failover_providers_for_avatar_login: Vec::new(),
            auto_failover_providers_for_email_check: Vec::new(),
            auto_failover_providers_for_username_check: Vec::new(),
        }
    }
}

impl StorageProvidersConfig {
    /// Every provider list paired with its key in the file.
    pub fn provider_lists(&self) -> [(&'static str, &[String]); 5] {
        [
            ("autoFailOverProviders", &self.auto_failover_providers),
            ("autoReplicationProviders", &self.auto_replication_providers),
            ("autoFailOverProvidersForAvatarLogin", &self.auto_failover_providers_for_avatar_login),
            (
                "autoFailOverProvidersForCheckIfEmailAlreadyInUse",
                &self.auto_failover_providers_for_email_check,
            ),
            (
                "autoFailOverProvidersForCheckIfUsernameAlreadyInUse",
                &self.auto_failover_providers_for_username_check,
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// JSONL audit trail location; auditing is off when unset.
    pub audit_log_path: Option<PathBuf>,
    pub max_entries_per_provider: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            audit_log_path: None,
            max_entries_per_provider: DEFAULT_MAX_ENTRIES_PER_PROVIDER,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProviderList {
    Joined(String),
    Sequence(Vec<String>),
}

/// Accepts `"MongoDBOASIS, Neo4jOASIS"` as well as `["MongoDBOASIS", "Neo4jOASIS"]`.
fn deserialize_provider_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match Option::<ProviderList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ProviderList::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
        Some(ProviderList::Sequence(items)) => items,
    };
    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}
