use super::{AssetProvider, LedgerProvider, NetworkProvider, OasisProvider, StorageProvider};
use oasis_types::{Capability, CapabilitySet, OasisError, ProviderType};
use std::fmt;
use std::sync::Arc;

/// A provider instance together with the capability views it exposes.
///
/// The capability set is derived from the attached views, so the registry can
/// answer capability queries without downcasting.
#[derive(Clone)]
pub struct ProviderHandle {
    base: Arc<dyn OasisProvider>,
    storage: Option<Arc<dyn StorageProvider>>,
    network: Option<Arc<dyn NetworkProvider>>,
    ledger: Option<Arc<dyn LedgerProvider>>,
    asset: Option<Arc<dyn AssetProvider>>,
}

impl ProviderHandle {
    pub fn new<P: OasisProvider>(provider: Arc<P>) -> Self {
        Self {
            base: provider,
            storage: None,
            network: None,
            ledger: None,
            asset: None,
        }
    }

    pub fn with_storage<P: StorageProvider>(mut self, provider: Arc<P>) -> Self {
        self.storage = Some(provider);
        self
    }

    pub fn with_network<P: NetworkProvider>(mut self, provider: Arc<P>) -> Self {
        self.network = Some(provider);
        self
    }

    pub fn with_ledger<P: LedgerProvider>(mut self, provider: Arc<P>) -> Self {
        self.ledger = Some(provider);
        self
    }

    pub fn with_asset<P: AssetProvider>(mut self, provider: Arc<P>) -> Self {
        self.asset = Some(provider);
        self
    }

    pub fn provider_type(&self) -> ProviderType {
        self.base.provider_type()
    }

    pub fn provider(&self) -> &Arc<dyn OasisProvider> {
        &self.base
    }

    pub fn capabilities(&self) -> CapabilitySet {
        let mut set = CapabilitySet::new();
        if self.storage.is_some() {
            set.insert(Capability::Storage);
        }
        if self.network.is_some() {
            set.insert(Capability::Network);
        }
        if self.ledger.is_some() {
            set.insert(Capability::Ledger);
        }
        if self.asset.is_some() {
            set.insert(Capability::Asset);
        }
        set
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// Typed capability view, if attached.
    pub fn select<S: CapabilitySlot>(&self) -> Option<Arc<S::Provider>> {
        S::select(self)
    }

    /// Whether both handles wrap the same provider instance.
    pub fn same_instance(&self, other: &ProviderHandle) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.base), Arc::as_ptr(&other.base))
    }

    /// Every attached view must report the same provider type as the base.
    pub(crate) fn validate(&self) -> Result<(), OasisError> {
        let expected = self.provider_type();
        let views = [
            (Capability::Storage, self.storage.as_ref().map(|view| view.provider_type())),
            (Capability::Network, self.network.as_ref().map(|view| view.provider_type())),
            (Capability::Ledger, self.ledger.as_ref().map(|view| view.provider_type())),
            (Capability::Asset, self.asset.as_ref().map(|view| view.provider_type())),
        ];
        for (capability, reported) in views {
            if let Some(reported) = reported
                && reported != expected
            {
                return Err(OasisError::validation(format!(
                    "{capability} view reports {reported} but the provider is {expected}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("provider_type", &self.provider_type())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Marker selecting one capability view from a [`ProviderHandle`].
pub trait CapabilitySlot: Send + Sync + 'static {
    type Provider: ?Sized + Send + Sync + 'static;
    const CAPABILITY: Capability;

    fn select(handle: &ProviderHandle) -> Option<Arc<Self::Provider>>;
}

pub struct StorageSlot;
pub struct NetworkSlot;
pub struct LedgerSlot;
pub struct AssetSlot;

impl CapabilitySlot for StorageSlot {
    type Provider = dyn StorageProvider;
    const CAPABILITY: Capability = Capability::Storage;

    fn select(handle: &ProviderHandle) -> Option<Arc<Self::Provider>> {
        handle.storage.clone()
    }
}

impl CapabilitySlot for NetworkSlot {
    type Provider = dyn NetworkProvider;
    const CAPABILITY: Capability = Capability::Network;

    fn select(handle: &ProviderHandle) -> Option<Arc<Self::Provider>> {
        handle.network.clone()
    }
}

impl CapabilitySlot for LedgerSlot {
    type Provider = dyn LedgerProvider;
    const CAPABILITY: Capability = Capability::Ledger;

    fn select(handle: &ProviderHandle) -> Option<Arc<Self::Provider>> {
        handle.ledger.clone()
    }
}

impl CapabilitySlot for AssetSlot {
    type Provider = dyn AssetProvider;
    const CAPABILITY: Capability = Capability::Asset;

    fn select(handle: &ProviderHandle) -> Option<Arc<Self::Provider>> {
        handle.asset.clone()
    }
}
