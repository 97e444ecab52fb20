//! Configuration management.
//!
//! Handles parsing and validation of the `~/.config/oasis/oasis.json`
//! configuration file and its conversion into runtime settings.

mod io;
mod model;
mod validation;

pub use io::{CONFIG_PATH_ENV, default_config_path, load_config, load_config_from_path, save_config_to_path};
pub use model::{LoggingConfig, OasisConfig, StorageProvidersConfig};
pub use validation::{ConfigError, parse_provider_list, parse_provider_names, validate_config};

use crate::failover::{FailoverPolicy, OperationClass};
use crate::logging::{AuditLogger, LogManager};
use crate::registry::LifecycleSettings;
use std::time::Duration;

impl OperationClass {
    /// Configuration key holding this class's failover list.
    pub fn config_field(self) -> &'static str {
        match self {
            OperationClass::General => "autoFailOverProviders",
            OperationClass::AvatarLogin => "autoFailOverProvidersForAvatarLogin",
            OperationClass::CheckEmailInUse => "autoFailOverProvidersForCheckIfEmailAlreadyInUse",
            OperationClass::CheckUsernameInUse => "autoFailOverProvidersForCheckIfUsernameAlreadyInUse",
        }
    }
}

impl FailoverPolicy {
    /// Runtime policy described by the storage-provider section.
    pub fn from_config(config: &StorageProvidersConfig) -> Result<Self, ConfigError> {
        let mut policy = FailoverPolicy {
            auto_failover: config.auto_failover_enabled,
            auto_replication: config.auto_replication_enabled,
            failover_order: parse_provider_list(OperationClass::General.config_field(), &config.auto_failover_providers)?,
            replication_providers: parse_provider_list("autoReplicationProviders", &config.auto_replication_providers)?,
            ..FailoverPolicy::default()
        };
        for (class, names) in [
            (OperationClass::AvatarLogin, &config.auto_failover_providers_for_avatar_login),
            (OperationClass::CheckEmailInUse, &config.auto_failover_providers_for_email_check),
            (OperationClass::CheckUsernameInUse, &config.auto_failover_providers_for_username_check),
        ] {
            let field = class.config_field();
            let order = parse_provider_list(field, names)?;
            if !order.is_empty() {
                policy.class_orders.insert(class, order);
            }
        }
        Ok(policy)
    }
}

impl LifecycleSettings {
    pub fn from_config(config: &StorageProvidersConfig) -> Self {
        Self {
            activate_timeout: Duration::from_secs(config.activate_provider_timeout_seconds),
            deactivate_timeout: Duration::from_secs(config.deactivate_provider_timeout_seconds),
            call_timeout: Duration::from_secs(config.provider_method_call_timeout_seconds),
        }
    }
}

impl LogManager {
    /// Call-record retention and, when a path is configured, the audit trail.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let logs = LogManager::new(config.max_entries_per_provider);
        match &config.audit_log_path {
            Some(path) => logs.with_audit_logger(AuditLogger::new(path.clone())),
            None => logs,
        }
    }
}
