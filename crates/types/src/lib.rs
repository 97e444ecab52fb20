//! Shared types for the OASIS provider core: the entity model, the result
//! envelope, the error taxonomy and provider identity.

pub mod entity;
pub mod error;
pub mod provider;
pub mod result;

pub use entity::*;
pub use error::{Cause, ErrorKind, OasisError, PanicFault};
pub use provider::{
    ActivationState, Capability, CapabilitySet, HealthStatus, ProviderCategory, ProviderType, UnknownProviderType,
};
pub use result::OasisResult;
