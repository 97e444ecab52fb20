//! Provider abstraction and failover core.
//!
//! Backends implement the traits in [`contract`] and are registered with a
//! [`ProviderRegistry`], which drives their activation lifecycle. An
//! [`OasisRouter`] sends each operation to the active providers that can
//! serve it, failing over on reads and replicating writes as the
//! [`FailoverPolicy`] describes.

pub mod blocking;
pub mod config;
pub mod contract;
pub mod failover;
pub mod logging;
pub mod memory;
pub mod registry;
pub mod router;

pub use blocking::BlockingRouter;
pub use config::{ConfigError, OasisConfig, load_config, load_config_from_path};
pub use contract::{
    ActivationContext, AssetProvider, AssetSlot, CapabilitySlot, LedgerProvider, LedgerSlot, NetworkProvider, NetworkSlot,
    OasisProvider, OwnedResource, ProviderHandle, RetryPolicy, StorageProvider, StorageSlot,
};
pub use failover::{CallOptions, FailoverEngine, FailoverPolicy, OperationClass};
pub use logging::{AuditLogger, LogManager, ProviderCallRecord};
pub use memory::InMemoryProvider;
pub use registry::{LifecycleSettings, ProviderRegistry, ProviderSnapshot, RegistryEvent};
pub use router::OasisRouter;
