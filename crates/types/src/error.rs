//! Error taxonomy shared by every provider operation.

use crate::provider::{Capability, ProviderType};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Underlying cause attached to an error, shareable across cloned envelopes.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Flat error category used for matching on an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotActivated,
    NotSupported,
    NotFound,
    UpstreamFailure,
    DeserializationFailure,
    ValidationFailure,
    Timeout,
    Fault,
    NotRegistered,
    AlreadyRegistered,
    DependencyMissing,
    ActivationFailed,
    NoActiveProvider,
}

/// Errors reported through the result envelope.
#[derive(Debug, Clone, Error)]
pub enum OasisError {
    #[error("{provider} Provider is not activated")]
    NotActivated { provider: ProviderType },

    #[error("{operation} is not supported by {provider}")]
    NotSupported { provider: ProviderType, operation: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("upstream failure: {message}")]
    UpstreamFailure {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("could not map backend response: {message}")]
    DeserializationFailure {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("validation failed: {message}")]
    ValidationFailure { message: String },

    #[error("Timeout Occured! {provider} did not complete {operation} within {timeout_ms}ms")]
    Timeout {
        provider: ProviderType,
        operation: String,
        timeout_ms: u64,
    },

    #[error("{provider} faulted during {operation}")]
    Fault {
        provider: ProviderType,
        operation: String,
        #[source]
        cause: Cause,
    },

    #[error("{provider} is not registered")]
    NotRegistered { provider: ProviderType },

    #[error("a different {provider} instance is already registered")]
    AlreadyRegistered { provider: ProviderType },

    #[error("{provider} depends on {dependency}, which is not registered")]
    DependencyMissing {
        provider: ProviderType,
        dependency: ProviderType,
    },

    #[error("error occurred activating {provider}: {reason}")]
    ActivationFailed {
        provider: ProviderType,
        reason: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("no active provider could satisfy {operation} (requires {capability})")]
    NoActiveProvider { capability: Capability, operation: String },
}

/// A caught panic, carried as the cause of [`OasisError::Fault`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicFault {
    pub message: String,
}

impl fmt::Display for PanicFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panicked: {}", self.message)
    }
}

impl StdError for PanicFault {}

impl OasisError {
    pub fn not_activated(provider: ProviderType) -> Self {
        Self::NotActivated { provider }
    }

    pub fn not_supported(provider: ProviderType, operation: impl Into<String>) -> Self {
        Self::NotSupported {
            provider,
            operation: operation.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            message: message.into(),
            cause: None,
        }
    }

    /// Create an upstream failure carrying the backend's own error.
    pub fn upstream_with_cause<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::UpstreamFailure {
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    pub fn deserialization<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::DeserializationFailure {
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure { message: message.into() }
    }

    pub fn timeout(provider: ProviderType, operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            provider,
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn fault(provider: ProviderType, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fault {
            provider,
            operation: operation.into(),
            cause: Arc::new(PanicFault { message: message.into() }),
        }
    }

    pub fn activation_failed(provider: ProviderType, reason: impl Into<String>) -> Self {
        Self::ActivationFailed {
            provider,
            reason: reason.into(),
            cause: None,
        }
    }

    pub fn no_active_provider(capability: Capability, operation: impl Into<String>) -> Self {
        Self::NoActiveProvider {
            capability,
            operation: operation.into(),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OasisError::NotActivated { .. } => ErrorKind::NotActivated,
            OasisError::NotSupported { .. } => ErrorKind::NotSupported,
            OasisError::NotFound { .. } => ErrorKind::NotFound,
            OasisError::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
            OasisError::DeserializationFailure { .. } => ErrorKind::DeserializationFailure,
            OasisError::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            OasisError::Timeout { .. } => ErrorKind::Timeout,
            OasisError::Fault { .. } => ErrorKind::Fault,
            OasisError::NotRegistered { .. } => ErrorKind::NotRegistered,
            OasisError::AlreadyRegistered { .. } => ErrorKind::AlreadyRegistered,
            OasisError::DependencyMissing { .. } => ErrorKind::DependencyMissing,
            OasisError::ActivationFailed { .. } => ErrorKind::ActivationFailed,
            OasisError::NoActiveProvider { .. } => ErrorKind::NoActiveProvider,
        }
    }

    /// Whether a retry against the same provider may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, OasisError::UpstreamFailure { .. } | OasisError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn upstream_failure_exposes_cause_as_source() {
        let error = OasisError::upstream_with_cause("write rejected", io::Error::other("503 from backend"));
        assert_eq!(error.kind(), ErrorKind::UpstreamFailure);
        assert!(error.is_transient());
        let source = error.source().expect("cause");
        assert_eq!(source.to_string(), "503 from backend");
    }

    #[test]
    fn fault_carries_panic_text() {
        let error = OasisError::fault(ProviderType::Neo4j, "save_holon", "index out of bounds");
        assert_eq!(error.to_string(), "Neo4jOASIS faulted during save_holon");
        assert_eq!(error.source().unwrap().to_string(), "panicked: index out of bounds");
        assert!(!error.is_transient());
    }

    #[test]
    fn not_activated_message_names_provider() {
        let error = OasisError::not_activated(ProviderType::MongoDb);
        assert_eq!(error.to_string(), "MongoDBOASIS Provider is not activated");
    }
}
