//! The provider contract every backend implements.
//!
//! A backend implements [`OasisProvider`] plus any of the capability traits
//! ([`StorageProvider`], [`NetworkProvider`], [`LedgerProvider`],
//! [`AssetProvider`]). Capability methods default to a `NotSupported` result,
//! so an adapter only overrides what its backend can do and callers always get
//! an envelope back.

mod capability;
mod context;
mod handle;
mod resource;

pub use capability::{AssetProvider, LedgerProvider, NetworkProvider, StorageProvider};
pub use context::ActivationContext;
pub use handle::{AssetSlot, CapabilitySlot, LedgerSlot, NetworkSlot, ProviderHandle, StorageSlot};
pub use resource::OwnedResource;

use async_trait::async_trait;
use oasis_types::{OasisResult, ProviderType};
use std::time::Duration;

/// Base contract: identity and lifecycle.
#[async_trait]
pub trait OasisProvider: Send + Sync + 'static {
    fn provider_type(&self) -> ProviderType;

    fn name(&self) -> &str {
        self.provider_type().as_str()
    }

    fn description(&self) -> &str {
        ""
    }

    /// Providers that must be Active before this one can activate.
    fn dependencies(&self) -> Vec<ProviderType> {
        Vec::new()
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::none()
    }

    /// Per-call budget overriding the configured provider method timeout.
    fn call_timeout(&self) -> Option<Duration> {
        None
    }

    /// Whether the adapter has finished activating. The registry only routes
    /// calls to Active providers; this guards direct calls, including the
    /// default capability bodies. Adapters that track activation override it.
    fn is_activated(&self) -> bool {
        true
    }

    async fn activate(&self, context: &ActivationContext) -> OasisResult<bool>;

    /// Release connections and any lazily constructed helpers.
    async fn deactivate(&self) -> OasisResult<bool>;
}

/// How a provider wants transient failures retried at its own call boundary.
///
/// Only `UpstreamFailure` and `Timeout` errors are retried. The failover layer
/// never retries; it moves on to the next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub const fn retryable(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Whether a failed attempt (zero based) may be retried.
    pub fn allows(&self, attempt: u32, error: &oasis_types::OasisError) -> bool {
        attempt < self.max_retries && error.is_transient()
    }

    /// Exponential delay before retry number `retry` (one based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(1 << retry.saturating_sub(1).min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasis_types::OasisError;

    #[test]
    fn retry_policy_only_retries_transient_errors() {
        let policy = RetryPolicy::retryable(2, Duration::from_millis(10));
        let upstream = OasisError::upstream("connection reset");
        let validation = OasisError::validation("bad id");
        assert!(policy.allows(0, &upstream));
        assert!(policy.allows(1, &upstream));
        assert!(!policy.allows(2, &upstream));
        assert!(!policy.allows(0, &validation));
        assert!(!RetryPolicy::none().allows(0, &upstream));
    }

    #[test]
    fn retry_delay_doubles() {
        let policy = RetryPolicy::retryable(3, Duration::from_millis(10));
        assert_eq!(policy.delay(1), Duration::from_millis(10));
        assert_eq!(policy.delay(2), Duration::from_millis(20));
        assert_eq!(policy.delay(3), Duration::from_millis(40));
    }
}
