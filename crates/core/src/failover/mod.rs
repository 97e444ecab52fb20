//! Failover and replication across providers.
//!
//! Reads try candidates one at a time in priority order and return the first
//! success. Writes pick a primary the same way, then fan the write out to the
//! configured mirrors concurrently; a mirror failure becomes a warning on a
//! successful result. Value-moving ledger and asset operations go to exactly
//! one provider and are never retried, failed over or replicated.

mod dispatch;
mod policy;

pub(crate) use dispatch::Retry;
pub use policy::{CallOptions, FailoverPolicy, OperationClass};

use crate::contract::CapabilitySlot;
use crate::registry::ProviderRegistry;
use dispatch::dispatch;
use futures_util::future::{BoxFuture, join_all};
use oasis_types::{Capability, ErrorKind, OasisError, OasisResult, ProviderType};
use oasis_util::join_with_ampersand;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    "unknown panic payload".to_string()
}

/// Applies a [`FailoverPolicy`] to calls routed through a [`ProviderRegistry`].
///
/// The policy can be changed while calls are in flight; each call works from
/// the snapshot taken when it started.
#[derive(Debug)]
pub struct FailoverEngine {
    registry: Arc<ProviderRegistry>,
    policy: RwLock<FailoverPolicy>,
}

/// Outcome of a priority-order pass and the providers it called.
struct Attempt<T> {
    result: OasisResult<T>,
    tried: Vec<ProviderType>,
}

/// Providers to attempt, plus notes about configured ones left out.
struct Candidates {
    attempt: Vec<ProviderType>,
    skipped: Vec<String>,
}

impl FailoverEngine {
    pub fn new(registry: Arc<ProviderRegistry>, policy: FailoverPolicy) -> Self {
        Self {
            registry,
            policy: RwLock::new(policy),
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Snapshot of the current policy.
    pub async fn policy(&self) -> FailoverPolicy {
        self.policy.read().await.clone()
    }

    /// Change the policy in place; calls already running keep their snapshot.
    pub async fn update_policy<R>(&self, update: impl FnOnce(&mut FailoverPolicy) -> R) -> R {
        let mut policy = self.policy.write().await;
        update(&mut policy)
    }

    /// Sequential read with failover.
    pub(crate) async fn read<'a, S, T, F>(
        &self,
        class: OperationClass,
        operation: &str,
        options: &CallOptions,
        call: F,
    ) -> OasisResult<T>
    where
        S: CapabilitySlot,
        F: Fn(Arc<S::Provider>) -> BoxFuture<'a, OasisResult<T>> + Sync,
    {
        let policy = self.policy().await;
        let failover = policy.failover_enabled(options);
        self.first_success::<S, T, F>(&policy, class, operation, options, failover, Retry::ProviderPolicy, &call)
            .await
            .result
    }

    /// Write to a primary (with failover), then replicate to mirrors.
    pub(crate) async fn write<'a, S, T, F>(
        &self,
        class: OperationClass,
        operation: &str,
        options: &CallOptions,
        call: F,
    ) -> OasisResult<T>
    where
        S: CapabilitySlot,
        F: Fn(Arc<S::Provider>) -> BoxFuture<'a, OasisResult<T>> + Sync,
    {
        let policy = self.policy().await;
        let failover = policy.failover_enabled(options);
        let Attempt { result: primary, tried } = self
            .first_success::<S, T, F>(&policy, class, operation, options, failover, Retry::ProviderPolicy, &call)
            .await;
        if primary.is_error() || !policy.replication_enabled(options) {
            return primary;
        }
        let Some(winner) = primary.provider() else {
            return primary;
        };
        let mirrors = policy.mirrors_for(winner, options);
        if mirrors.is_empty() {
            return primary;
        }

        let mut warnings = Vec::new();
        let mut unreplicated = Vec::new();
        let mut targets = Vec::new();
        for mirror in mirrors {
            // Already given this write as a candidate primary; not retried here.
            if tried.contains(&mirror) {
                warnings.push(format!("replication to {mirror} skipped: failed as primary"));
                unreplicated.push(mirror);
                continue;
            }
            match self.mirror_skip_reason(mirror, S::CAPABILITY).await {
                Some(reason) => {
                    warnings.push(format!("replication to {mirror} skipped: {reason}"));
                    unreplicated.push(mirror);
                }
                None => targets.push(mirror),
            }
        }

        let results = join_all(
            targets
                .iter()
                .map(|mirror| dispatch::<S, T, F>(&self.registry, *mirror, operation, options.timeout, Retry::ProviderPolicy, &call)),
        )
        .await;

        for (mirror, result) in targets.iter().zip(results) {
            if result.is_error() {
                warn!(primary = %winner, mirror = %mirror, operation, error = %result.message(), "replication failed");
                warnings.push(format!("replication to {mirror} failed: {}", result.message()));
                unreplicated.push(*mirror);
            } else {
                debug!(primary = %winner, mirror = %mirror, operation, "replicated");
            }
        }

        if unreplicated.is_empty() {
            return primary;
        }
        let message = format!(
            "successfully saved for the provider {winner} but failed to replicate to {}",
            join_with_ampersand(unreplicated.iter().map(|provider| provider.as_str()))
        );
        primary.with_warnings(warnings).with_message(message)
    }

    /// Value-moving call against exactly one provider: the first candidate in
    /// priority order, with no retry, failover or replication.
    pub(crate) async fn single<'a, S, T, F>(
        &self,
        class: OperationClass,
        operation: &str,
        options: &CallOptions,
        call: F,
    ) -> OasisResult<T>
    where
        S: CapabilitySlot,
        F: Fn(Arc<S::Provider>) -> BoxFuture<'a, OasisResult<T>> + Sync,
    {
        let policy = self.policy().await;
        self.first_success::<S, T, F>(&policy, class, operation, options, false, Retry::Never, &call)
            .await
            .result
    }

    #[allow(clippy::too_many_arguments)]
    async fn first_success<'a, S, T, F>(
        &self,
        policy: &FailoverPolicy,
        class: OperationClass,
        operation: &str,
        options: &CallOptions,
        failover: bool,
        retry: Retry,
        call: &F,
    ) -> Attempt<T>
    where
        S: CapabilitySlot,
        F: Fn(Arc<S::Provider>) -> BoxFuture<'a, OasisResult<T>> + Sync,
    {
        let candidates = self.candidates(policy, S::CAPABILITY, class, options).await;
        let mut failures: Vec<String> = Vec::new();
        let mut last_error: Option<OasisResult<T>> = None;
        let mut tried = Vec::new();

        for provider in candidates.attempt {
            tried.push(provider);
            let result = dispatch::<S, T, F>(&self.registry, provider, operation, options.timeout, retry, call).await;
            if result.is_ok() {
                if !failures.is_empty() {
                    info!(provider = %provider, operation, failed = failures.len(), "failed over to provider");
                }
                return Attempt {
                    result: result.with_warnings(failures),
                    tried,
                };
            }

            // Another backend would reject the same input.
            let rejected = result.kind() == Some(ErrorKind::ValidationFailure);
            failures.push(describe_failure(&result));
            last_error = Some(result);
            if !failover || rejected {
                break;
            }
        }

        let result = match last_error {
            Some(error) => {
                // The returned error is not repeated as a warning.
                failures.pop();
                error.with_warnings(failures)
            }
            None => {
                debug!(operation, capability = %S::CAPABILITY, "no active provider available");
                OasisResult::err(OasisError::no_active_provider(S::CAPABILITY, operation)).with_warnings(candidates.skipped)
            }
        };
        Attempt { result, tried }
    }

    async fn candidates(
        &self,
        policy: &FailoverPolicy,
        capability: Capability,
        class: OperationClass,
        options: &CallOptions,
    ) -> Candidates {
        let Some(order) = policy.configured_order(class, options) else {
            return Candidates {
                attempt: self.registry.active_providers(capability).await,
                skipped: Vec::new(),
            };
        };

        let mut attempt = Vec::new();
        let mut skipped = Vec::new();
        for provider in order {
            if attempt.contains(&provider) {
                continue;
            }
            if options.providers.is_some() {
                attempt.push(provider);
                continue;
            }
            match self.mirror_skip_reason(provider, capability).await {
                Some(reason) => skipped.push(format!("{provider} skipped: {reason}")),
                None => attempt.push(provider),
            }
        }
        Candidates { attempt, skipped }
    }

    /// Why `provider` cannot take a call right now, if it cannot.
    async fn mirror_skip_reason(&self, provider: ProviderType, capability: Capability) -> Option<String> {
        let Some(entry) = self.registry.entry(provider).await else {
            return Some("not registered".to_string());
        };
        if !entry.handle().supports(capability) {
            return Some(format!("{capability} is not supported"));
        }
        let state = entry.state().await;
        if !state.is_active() {
            return Some(format!("provider is {state}"));
        }
        None
    }
}

fn describe_failure<T>(result: &OasisResult<T>) -> String {
    match result.provider() {
        Some(provider) => format!("{provider} failed: {}", result.message()),
        None => result.message().to_string(),
    }
}
