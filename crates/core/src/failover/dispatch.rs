//! The single-provider call boundary.

use super::panic_message;
use crate::contract::CapabilitySlot;
use crate::logging::{CallOutcome, ProviderCallRecord};
use crate::registry::ProviderRegistry;
use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use oasis_types::{OasisError, OasisResult, ProviderType};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Whether the provider's own retry policy may be applied to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retry {
    ProviderPolicy,
    Never,
}

/// Run one operation against one provider.
///
/// Nothing is sent to the backend unless the provider is Active and exposes
/// the capability. The call is bounded by `budget` (or the provider's own
/// budget), panics become `Fault` errors, and transient failures are retried
/// only as the provider's retry policy allows. The read guard held here makes
/// deactivation wait for the call to finish; the call never changes the
/// activation state.
pub(crate) async fn dispatch<'a, S, T, F>(
    registry: &ProviderRegistry,
    provider: ProviderType,
    operation: &str,
    budget: Option<Duration>,
    retry: Retry,
    call: &F,
) -> OasisResult<T>
where
    S: CapabilitySlot,
    F: Fn(Arc<S::Provider>) -> BoxFuture<'a, OasisResult<T>> + Sync,
{
    let Some(entry) = registry.entry(provider).await else {
        return OasisResult::err(OasisError::NotRegistered { provider }).with_provider(provider);
    };
    let guard = entry.call_guard().await;
    if !guard.is_active() {
        debug!(provider = %provider, operation, state = %*guard, "call refused, provider not active");
        return OasisResult::err(OasisError::not_activated(provider)).with_provider(provider);
    }
    let Some(target) = entry.handle().select::<S>() else {
        return OasisResult::err(OasisError::not_supported(provider, operation)).with_provider(provider);
    };

    let instance = entry.handle().provider();
    let budget = budget
        .or_else(|| instance.call_timeout())
        .unwrap_or(registry.settings().call_timeout);
    let policy = match retry {
        Retry::ProviderPolicy => instance.retry_policy(),
        Retry::Never => crate::contract::RetryPolicy::none(),
    };

    let mut attempt = 0;
    loop {
        let started = Instant::now();
        let outcome = match timeout(budget, AssertUnwindSafe(call(Arc::clone(&target))).catch_unwind()).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => OasisResult::err(OasisError::fault(provider, operation, panic_message(panic))),
            Err(_) => OasisResult::err(OasisError::timeout(provider, operation, budget.as_millis() as u64)),
        };
        let elapsed = started.elapsed();

        match outcome.error() {
            None => entry.record_success(elapsed).await,
            Some(error) => {
                warn!(provider = %provider, operation, attempt, elapsed_ms = elapsed.as_millis() as u64, error = %error, "provider call failed");
                entry.record_failure(outcome.message().to_string()).await;
            }
        }
        registry
            .logs()
            .record_call(ProviderCallRecord {
                timestamp: Utc::now(),
                provider,
                operation: operation.to_string(),
                outcome: if outcome.is_error() {
                    CallOutcome::Failure
                } else {
                    CallOutcome::Success
                },
                elapsed_ms: elapsed.as_millis() as u64,
                attempt,
                message: outcome.error().map(|_| outcome.message().to_string()),
            })
            .await;

        if let Some(error) = outcome.error()
            && policy.allows(attempt, error)
        {
            attempt += 1;
            let delay = policy.delay(attempt);
            debug!(provider = %provider, operation, attempt, delay_ms = delay.as_millis() as u64, "retrying provider call");
            sleep(delay).await;
            continue;
        }

        drop(guard);
        return outcome.with_provider(provider);
    }
}
