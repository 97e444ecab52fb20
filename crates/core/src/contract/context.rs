use super::{CapabilitySlot, ProviderHandle};
use indexmap::IndexMap;
use oasis_types::ProviderType;
use std::sync::Arc;

/// What an activating provider can see: its declared dependencies, each
/// already Active.
#[derive(Debug, Clone, Default)]
pub struct ActivationContext {
    dependencies: IndexMap<ProviderType, ProviderHandle>,
}

impl ActivationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_dependency(mut self, handle: ProviderHandle) -> Self {
        self.dependencies.insert(handle.provider_type(), handle);
        self
    }

    pub fn dependency(&self, provider_type: ProviderType) -> Option<&ProviderHandle> {
        self.dependencies.get(&provider_type)
    }

    /// Typed capability view of a dependency.
    pub fn dependency_as<S: CapabilitySlot>(&self, provider_type: ProviderType) -> Option<Arc<S::Provider>> {
        self.dependency(provider_type).and_then(ProviderHandle::select::<S>)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &ProviderHandle> {
        self.dependencies.values()
    }
}
