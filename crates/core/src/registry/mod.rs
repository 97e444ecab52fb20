//! Process-scoped catalogue of provider instances.
//!
//! The registry is an explicit object, shared behind an `Arc`, that keeps
//! providers in registration order (which is also the default priority order)
//! along with each provider's activation state and health. It performs no
//! backend I/O itself apart from driving `activate`/`deactivate`.

mod entry;
mod events;
mod lifecycle;

pub(crate) use entry::ProviderEntry;
pub use events::RegistryEvent;
pub use lifecycle::LifecycleSettings;

use crate::contract::{CapabilitySlot, ProviderHandle};
use crate::logging::{AuditAction, AuditEntry, AuditResult, LogManager};
use indexmap::IndexMap;
use oasis_types::{ActivationState, Capability, CapabilitySet, HealthStatus, OasisError, ProviderType};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

/// Point-in-time view of one registered provider.
#[derive(Debug, Clone)]
pub struct ProviderSnapshot {
    pub provider_type: ProviderType,
    pub name: String,
    pub description: String,
    pub capabilities: CapabilitySet,
    pub state: ActivationState,
    pub health: HealthStatus,
}

pub struct ProviderRegistry {
    entries: RwLock<IndexMap<ProviderType, Arc<ProviderEntry>>>,
    settings: LifecycleSettings,
    logs: Arc<LogManager>,
    events: broadcast::Sender<RegistryEvent>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::with_settings(LifecycleSettings::default())
    }

    pub fn with_settings(settings: LifecycleSettings) -> Self {
        let (events, _rx) = broadcast::channel(64);
        Self {
            entries: RwLock::new(IndexMap::new()),
            settings,
            logs: Arc::new(LogManager::default()),
            events,
        }
    }

    pub fn with_log_manager(mut self, logs: Arc<LogManager>) -> Self {
        self.logs = logs;
        self
    }

    pub fn settings(&self) -> LifecycleSettings {
        self.settings
    }

    pub fn logs(&self) -> &Arc<LogManager> {
        &self.logs
    }

    /// Subscribe to registration and activation state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: RegistryEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Add a provider at the end of the priority order.
    ///
    /// Re-registering the same instance is a no-op. A different instance under
    /// an occupied type fails with `AlreadyRegistered`; use [`replace`](Self::replace).
    pub async fn register(&self, handle: ProviderHandle) -> Result<(), OasisError> {
        handle.validate()?;
        let provider = handle.provider_type();
        {
            let mut entries = self.entries.write().await;
            if let Some(existing) = entries.get(&provider) {
                if existing.handle().same_instance(&handle) {
                    debug!(provider = %provider, "provider already registered");
                    return Ok(());
                }
                return Err(OasisError::AlreadyRegistered { provider });
            }
            entries.insert(provider, Arc::new(ProviderEntry::new(handle.clone())));
        }

        info!(provider = %provider, capabilities = %handle.capabilities(), "registered provider");
        self.emit(RegistryEvent::Registered { provider });
        self.logs
            .audit(
                AuditEntry::new(provider, AuditAction::Register, AuditResult::Success)
                    .with_detail("capabilities", handle.capabilities().to_string()),
            )
            .await;
        Ok(())
    }

    /// Register `handle`, replacing any instance under the same type while
    /// keeping its priority position. The previous instance is deactivated
    /// first if it was active, and returned.
    pub async fn replace(&self, handle: ProviderHandle) -> Result<Option<ProviderHandle>, OasisError> {
        handle.validate()?;
        let provider = handle.provider_type();
        loop {
            let Some(previous) = self.entry(provider).await else {
                self.register(handle).await?;
                return Ok(None);
            };
            if previous.handle().same_instance(&handle) {
                return Ok(None);
            }

            // Held until the new entry is in the table, so a waiting activation
            // cannot bring the old instance back up.
            let _transition = previous.lock_transition().await;
            if previous.is_retired() {
                continue;
            }
            let deactivation = self.deactivate_locked(&previous).await;
            if deactivation.is_error() {
                warn!(provider = %provider, error = %deactivation.message(), "previous instance did not deactivate cleanly");
            }
            previous.retire();
            self.entries
                .write()
                .await
                .insert(provider, Arc::new(ProviderEntry::new(handle.clone())));

            info!(provider = %provider, "replaced provider");
            self.emit(RegistryEvent::Replaced { provider });
            self.logs
                .audit(
                    AuditEntry::new(provider, AuditAction::Replace, AuditResult::Success)
                        .with_detail("capabilities", handle.capabilities().to_string()),
                )
                .await;
            return Ok(Some(previous.handle().clone()));
        }
    }

    /// Deactivate (if needed) and remove a provider.
    pub async fn deregister(&self, provider: ProviderType) -> Result<ProviderHandle, OasisError> {
        loop {
            let Some(entry) = self.entry(provider).await else {
                return Err(OasisError::NotRegistered { provider });
            };
            let _transition = entry.lock_transition().await;
            if entry.is_retired() {
                continue;
            }
            let deactivation = self.deactivate_locked(&entry).await;
            if deactivation.is_error() {
                warn!(provider = %provider, error = %deactivation.message(), "deregistering provider that failed to deactivate");
            }
            entry.retire();
            self.entries.write().await.shift_remove(&provider);

            info!(provider = %provider, "deregistered provider");
            self.emit(RegistryEvent::Deregistered { provider });
            self.logs
                .audit(AuditEntry::new(provider, AuditAction::Deregister, AuditResult::Success))
                .await;
            return Ok(entry.handle().clone());
        }
    }

    pub async fn resolve(&self, provider: ProviderType) -> Result<ProviderHandle, OasisError> {
        self.entry(provider)
            .await
            .map(|entry| entry.handle().clone())
            .ok_or(OasisError::NotRegistered { provider })
    }

    /// Capability-typed lookup.
    pub async fn resolve_as<S: CapabilitySlot>(&self, provider: ProviderType) -> Result<Arc<S::Provider>, OasisError> {
        let handle = self.resolve(provider).await?;
        handle
            .select::<S>()
            .ok_or_else(|| OasisError::not_supported(provider, format!("{} capability", S::CAPABILITY)))
    }

    pub async fn is_registered(&self, provider: ProviderType) -> bool {
        self.entries.read().await.contains_key(&provider)
    }

    /// Registered types in priority order.
    pub async fn registered_types(&self) -> Vec<ProviderType> {
        self.entries.read().await.keys().copied().collect()
    }

    /// Registered providers declaring `capability`, in priority order.
    pub async fn providers_with(&self, capability: Capability) -> Vec<ProviderType> {
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.handle().supports(capability))
            .map(|entry| entry.handle().provider_type())
            .collect()
    }

    /// Active providers declaring `capability`, in priority order.
    pub async fn active_providers(&self, capability: Capability) -> Vec<ProviderType> {
        let mut active = Vec::new();
        for entry in self.entries_snapshot().await {
            if entry.handle().supports(capability) && entry.state().await.is_active() {
                active.push(entry.handle().provider_type());
            }
        }
        active
    }

    pub async fn state(&self, provider: ProviderType) -> Option<ActivationState> {
        match self.entry(provider).await {
            Some(entry) => Some(entry.state().await),
            None => None,
        }
    }

    pub async fn health(&self, provider: ProviderType) -> Option<HealthStatus> {
        match self.entry(provider).await {
            Some(entry) => Some(entry.health().await),
            None => None,
        }
    }

    pub async fn snapshot(&self) -> Vec<ProviderSnapshot> {
        let mut snapshots = Vec::new();
        for entry in self.entries_snapshot().await {
            let provider = entry.handle().provider();
            snapshots.push(ProviderSnapshot {
                provider_type: provider.provider_type(),
                name: provider.name().to_string(),
                description: provider.description().to_string(),
                capabilities: entry.handle().capabilities(),
                state: entry.state().await,
                health: entry.health().await,
            });
        }
        snapshots
    }

    pub(crate) async fn entry(&self, provider: ProviderType) -> Option<Arc<ProviderEntry>> {
        self.entries.read().await.get(&provider).cloned()
    }

    /// Clone the entry list so callers never hold the table lock across
    /// provider I/O.
    pub(crate) async fn entries_snapshot(&self) -> Vec<Arc<ProviderEntry>> {
        self.entries.read().await.values().cloned().collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("settings", &self.settings).finish_non_exhaustive()
    }
}
