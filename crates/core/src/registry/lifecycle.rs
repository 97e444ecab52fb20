//! Activation state machine: Inactive -> Activating -> Active -> Deactivating -> Inactive.

use super::{ProviderEntry, ProviderRegistry, RegistryEvent};
use crate::contract::ActivationContext;
use crate::failover::panic_message;
use crate::logging::{AuditAction, AuditEntry, AuditResult};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use oasis_types::{ActivationState, OasisError, OasisResult, ProviderType};
use oasis_util::join_with_ampersand;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const DEFAULT_ACTIVATE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DEACTIVATE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Time budgets for provider lifecycle transitions and method calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub activate_timeout: Duration,
    pub deactivate_timeout: Duration,
    /// Used when neither the caller nor the provider sets a budget.
    pub call_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            activate_timeout: DEFAULT_ACTIVATE_TIMEOUT,
            deactivate_timeout: DEFAULT_DEACTIVATE_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ProviderRegistry {
    /// Activate a provider and, first, any provider it depends on.
    ///
    /// Idempotent for an Active provider. Fails with `DependencyMissing` when a
    /// dependency is not registered, and leaves the provider Inactive on any
    /// failure.
    pub async fn activate(&self, provider: ProviderType) -> OasisResult<bool> {
        if let Err(error) = self.check_dependency_graph(provider).await {
            return OasisResult::err(error).with_provider(provider);
        }
        self.activate_entry(provider).await.with_provider(provider)
    }

    /// Deactivate a provider. Always ends Inactive; an error result reports a
    /// provider that failed, faulted or timed out while releasing resources.
    /// Dependents are not deactivated.
    pub async fn deactivate(&self, provider: ProviderType) -> OasisResult<bool> {
        loop {
            let Some(entry) = self.entry(provider).await else {
                return OasisResult::err(OasisError::NotRegistered { provider });
            };
            let _transition = entry.lock_transition().await;
            if entry.is_retired() {
                continue;
            }
            return self.deactivate_locked(&entry).await;
        }
    }

    /// Deactivate `entry`. The caller holds its transition lock.
    pub(super) async fn deactivate_locked(&self, entry: &ProviderEntry) -> OasisResult<bool> {
        let provider = entry.handle().provider_type();
        if entry.state().await == ActivationState::Inactive {
            debug!(provider = %provider, "provider already inactive");
            return OasisResult::ok(true).with_provider(provider);
        }

        // Waits for in-flight calls to release their guards.
        self.set_state(entry, ActivationState::Deactivating).await;

        let instance = Arc::clone(entry.handle().provider());
        let budget = self.settings.deactivate_timeout;
        let outcome = match timeout(budget, AssertUnwindSafe(instance.deactivate()).catch_unwind()).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => OasisResult::err(OasisError::fault(provider, "deactivate", panic_message(panic))),
            Err(_) => OasisResult::err(OasisError::timeout(provider, "deactivate", budget.as_millis() as u64)),
        };

        self.set_state(entry, ActivationState::Inactive).await;

        let audit_result = if outcome.is_error() {
            warn!(provider = %provider, error = %outcome.message(), "provider deactivated with errors");
            AuditResult::Failure
        } else {
            info!(provider = %provider, "provider deactivated");
            AuditResult::Success
        };
        self.logs
            .audit(AuditEntry::new(provider, AuditAction::Deactivate, audit_result).with_detail("message", outcome.message()))
            .await;
        outcome.map(|_| true).with_provider(provider)
    }

    /// Activate every registered provider in priority order. The count of
    /// active providers is returned; failures are reported as warnings.
    pub async fn activate_all(&self) -> OasisResult<usize> {
        let mut failures = Vec::new();
        let mut active = 0;
        for provider in self.registered_types().await {
            let result = self.activate(provider).await;
            if result.is_error() {
                failures.push((provider, result.message().to_string()));
            } else {
                active += 1;
            }
        }
        summarize("activate", active, failures)
    }

    /// Deactivate every provider in reverse priority order.
    pub async fn shutdown(&self) -> OasisResult<usize> {
        let mut failures = Vec::new();
        let mut stopped = 0;
        for provider in self.registered_types().await.into_iter().rev() {
            let result = self.deactivate(provider).await;
            if result.is_error() {
                failures.push((provider, result.message().to_string()));
            } else {
                stopped += 1;
            }
        }
        summarize("deactivate", stopped, failures)
    }

    fn activate_entry(&self, provider: ProviderType) -> BoxFuture<'_, OasisResult<bool>> {
        async move {
            loop {
                let Some(entry) = self.entry(provider).await else {
                    return OasisResult::err(OasisError::NotRegistered { provider });
                };
                let _transition = entry.lock_transition().await;
                // Deregistered or replaced while we waited.
                if entry.is_retired() {
                    continue;
                }
                return self.activate_locked(&entry).await;
            }
        }
        .boxed()
    }

    async fn activate_locked(&self, entry: &ProviderEntry) -> OasisResult<bool> {
        let provider = entry.handle().provider_type();
        if entry.state().await.is_active() {
            debug!(provider = %provider, "provider already active");
            return OasisResult::ok(true);
        }

        self.set_state(entry, ActivationState::Activating).await;

        let mut context = ActivationContext::new();
        for dependency in entry.handle().provider().dependencies() {
            if !self.is_registered(dependency).await {
                return self
                    .fail_activation(entry, OasisError::DependencyMissing { provider, dependency })
                    .await;
            }
            let activated = self.activate_entry(dependency).await;
            if let Some(error) = activated.error() {
                let error = OasisError::ActivationFailed {
                    provider,
                    reason: format!("dependency {dependency} could not be activated: {}", activated.message()),
                    cause: Some(Arc::new(error.clone())),
                };
                return self.fail_activation(entry, error).await;
            }
            // Resolved after activation so a replaced dependency hands over its new instance.
            let Some(dependency_entry) = self.entry(dependency).await else {
                return self
                    .fail_activation(entry, OasisError::DependencyMissing { provider, dependency })
                    .await;
            };
            context = context.with_dependency(dependency_entry.handle().clone());
        }

        let instance = Arc::clone(entry.handle().provider());
        let budget = self.settings.activate_timeout;
        let started = Instant::now();
        let outcome = match timeout(budget, AssertUnwindSafe(instance.activate(&context)).catch_unwind()).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => OasisResult::err(OasisError::fault(provider, "activate", panic_message(panic))),
            Err(_) => OasisResult::err(OasisError::timeout(provider, "activate", budget.as_millis() as u64)),
        };

        let Some(error) = outcome.error() else {
            self.set_state(entry, ActivationState::Active).await;
            entry.record_success(started.elapsed()).await;
            info!(provider = %provider, elapsed_ms = started.elapsed().as_millis() as u64, "provider activated");
            self.logs
                .audit(AuditEntry::new(provider, AuditAction::Activate, AuditResult::Success))
                .await;
            return OasisResult::ok(true);
        };

        let error = match error {
            OasisError::Timeout { .. } | OasisError::Fault { .. } | OasisError::ActivationFailed { .. } => {
                error.clone()
            }
            other => OasisError::ActivationFailed {
                provider,
                reason: outcome.message().to_string(),
                cause: Some(Arc::new(other.clone())),
            },
        };
        self.fail_activation(entry, error).await
    }

    async fn fail_activation(&self, entry: &ProviderEntry, error: OasisError) -> OasisResult<bool> {
        let provider = entry.handle().provider_type();
        self.set_state(entry, ActivationState::Inactive).await;
        entry.record_failure(error.to_string()).await;
        warn!(provider = %provider, error = %error, "provider activation failed");
        self.logs
            .audit(AuditEntry::new(provider, AuditAction::Activate, AuditResult::Failure).with_detail("error", error.to_string()))
            .await;
        OasisResult::err(error)
    }

    async fn set_state(&self, entry: &ProviderEntry, next: ActivationState) {
        let provider = entry.handle().provider_type();
        let previous = entry.replace_state(next).await;
        if previous != next {
            debug!(provider = %provider, from = %previous, to = %next, "activation state changed");
            self.emit(RegistryEvent::StateChanged {
                provider,
                from: previous,
                to: next,
            });
        }
    }

    /// Reject dependency cycles before any lock is taken, so activation never
    /// waits on a transition lock further up its own chain.
    async fn check_dependency_graph(&self, root: ProviderType) -> Result<(), OasisError> {
        let mut path = Vec::new();
        self.visit_dependencies(root, &mut path).await
    }

    fn visit_dependencies<'a>(
        &'a self,
        provider: ProviderType,
        path: &'a mut Vec<ProviderType>,
    ) -> BoxFuture<'a, Result<(), OasisError>> {
        async move {
            if path.contains(&provider) {
                path.push(provider);
                let chain: Vec<String> = path.iter().map(ToString::to_string).collect();
                return Err(OasisError::validation(format!("dependency cycle: {}", chain.join(" -> "))));
            }
            // Missing dependencies are reported by activation itself.
            let Some(entry) = self.entry(provider).await else {
                return Ok(());
            };
            path.push(provider);
            for dependency in entry.handle().provider().dependencies() {
                self.visit_dependencies(dependency, path).await?;
            }
            path.pop();
            Ok(())
        }
        .boxed()
    }
}

fn summarize(action: &str, succeeded: usize, failures: Vec<(ProviderType, String)>) -> OasisResult<usize> {
    if failures.is_empty() {
        return OasisResult::ok(succeeded);
    }
    let names = join_with_ampersand(failures.iter().map(|(provider, _)| provider.as_str()));
    let warnings: Vec<String> = failures
        .iter()
        .map(|(provider, message)| format!("{provider}: {message}"))
        .collect();
    OasisResult::ok_with_message(succeeded, format!("failed to {action} {names}")).with_warnings(warnings)
}
