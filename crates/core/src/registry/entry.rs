use crate::contract::ProviderHandle;
use oasis_types::{ActivationState, HealthStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

/// Registry slot for one provider.
///
/// Calls hold a read guard on `state` for their whole duration, so a
/// deactivation (which needs the write guard) waits for in-flight calls and
/// new calls observe `Deactivating`. `transition` serialises activate and
/// deactivate for this provider. An entry is retired, under the transition
/// lock, when it leaves the table; transitions waiting on that lock must then
/// look the provider up again.
pub(crate) struct ProviderEntry {
    handle: ProviderHandle,
    state: RwLock<ActivationState>,
    transition: Mutex<()>,
    retired: AtomicBool,
    health: Mutex<HealthStatus>,
}

impl ProviderEntry {
    pub(crate) fn new(handle: ProviderHandle) -> Self {
        Self {
            handle,
            state: RwLock::new(ActivationState::Inactive),
            transition: Mutex::new(()),
            retired: AtomicBool::new(false),
            health: Mutex::new(HealthStatus::new()),
        }
    }

    pub(crate) fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    pub(crate) async fn state(&self) -> ActivationState {
        *self.state.read().await
    }

    /// Shared guard held by a call for its duration.
    pub(crate) async fn call_guard(&self) -> RwLockReadGuard<'_, ActivationState> {
        self.state.read().await
    }

    /// Swap the state, returning the previous one.
    pub(crate) async fn replace_state(&self, next: ActivationState) -> ActivationState {
        let mut state = self.state.write().await;
        std::mem::replace(&mut *state, next)
    }

    pub(crate) async fn lock_transition(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.transition.lock().await
    }

    /// Mark the entry as removed from the table. Call with the transition lock held.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub(crate) async fn health(&self) -> HealthStatus {
        self.health.lock().await.clone()
    }

    pub(crate) async fn record_success(&self, latency: Duration) {
        self.health.lock().await.mark_healthy(latency);
    }

    pub(crate) async fn record_failure(&self, error: String) {
        self.health.lock().await.mark_unhealthy(error);
    }
}
