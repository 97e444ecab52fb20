use oasis_types::{ActivationState, ProviderType};

/// Observable registry change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered { provider: ProviderType },
    Replaced { provider: ProviderType },
    Deregistered { provider: ProviderType },
    StateChanged {
        provider: ProviderType,
        from: ActivationState,
        to: ActivationState,
    },
}

impl RegistryEvent {
    pub fn provider(&self) -> ProviderType {
        match self {
            RegistryEvent::Registered { provider }
            | RegistryEvent::Replaced { provider }
            | RegistryEvent::Deregistered { provider }
            | RegistryEvent::StateChanged { provider, .. } => *provider,
        }
    }
}
