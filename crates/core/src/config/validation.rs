//! Configuration validation.

use super::OasisConfig;
use oasis_types::ProviderType;
use oasis_util::join_with_ampersand;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate the whole configuration.
pub fn validate_config(config: &OasisConfig) -> Result<(), ConfigError> {
    let storage = &config.storage_providers;
    for (field, seconds) in [
        ("providerMethodCallTimeoutSeconds", storage.provider_method_call_timeout_seconds),
        ("activateProviderTimeoutSeconds", storage.activate_provider_timeout_seconds),
        ("deactivateProviderTimeoutSeconds", storage.deactivate_provider_timeout_seconds),
    ] {
        if seconds == 0 {
            return Err(ConfigError::validation(field, "timeout must be at least one second"));
        }
    }

    for (field, names) in storage.provider_lists() {
        parse_provider_list(field, names)?;
        debug!(field, count = names.len(), "validated provider list");
    }

    if config.logging.max_entries_per_provider == 0 {
        return Err(ConfigError::validation("maxEntriesPerProvider", "must be greater than zero"));
    }
    Ok(())
}

/// Parse a provider list from the file into provider types.
///
/// Every unknown name is reported at once, together with the valid names.
pub fn parse_provider_list(field: &str, names: &[String]) -> Result<Vec<ProviderType>, ConfigError> {
    let mut providers = Vec::with_capacity(names.len());
    let mut invalid = Vec::new();
    for name in names {
        match name.parse::<ProviderType>() {
            Ok(provider) if providers.contains(&provider) => {
                return Err(ConfigError::validation(field, format!("{provider} is listed more than once")));
            }
            Ok(provider) => providers.push(provider),
            Err(_) => invalid.push(name.as_str()),
        }
    }

    match invalid.len() {
        0 => Ok(providers),
        1 => Err(ConfigError::validation(
            field,
            format!("{} is not a valid provider type. Valid values are: {}", invalid[0], ProviderType::valid_names()),
        )),
        _ => Err(ConfigError::validation(
            field,
            format!(
                "{} are not valid provider types. Valid values are: {}",
                join_with_ampersand(invalid),
                ProviderType::valid_names()
            ),
        )),
    }
}

/// Parse a comma-separated list such as `"MongoDBOASIS, Neo4jOASIS"`.
pub fn parse_provider_names(field: &str, joined: &str) -> Result<Vec<ProviderType>, ConfigError> {
    let names: Vec<String> = joined
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    parse_provider_list(field, &names)
}
