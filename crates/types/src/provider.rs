//! Provider identity, capability and activation state types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

macro_rules! provider_types {
    ($($variant:ident => $name:literal, $category:ident;)+) => {
        /// Backend kind identifying a provider.
        ///
        /// Used as the registry key and as the routing hint in failover and
        /// replication lists. The serialized and displayed form is the canonical
        /// provider name (for example `MongoDBOASIS`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ProviderType {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl ProviderType {
            /// Every known provider type, in catalogue order.
            pub const ALL: &'static [ProviderType] = &[$(ProviderType::$variant,)+];

            /// Canonical provider name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ProviderType::$variant => $name,)+
                }
            }

            /// Broad family the backend belongs to.
            pub fn category(self) -> ProviderCategory {
                match self {
                    $(ProviderType::$variant => ProviderCategory::$category,)+
                }
            }
        }
    };
}

provider_types! {
    MongoDb => "MongoDBOASIS", Database;
    Neo4j => "Neo4jOASIS", Database;
    SqliteDb => "SQLLiteDBOASIS", Database;
    AzureCosmosDb => "AzureCosmosDBOASIS", Cloud;
    GoogleCloud => "GoogleCloudOASIS", Cloud;
    LocalFile => "LocalFileOASIS", FileSystem;
    Ipfs => "IPFSOASIS", FileSystem;
    Pinata => "PinataOASIS", FileSystem;
    Holochain => "HoloOASIS", Network;
    ActivityPub => "ActivityPubOASIS", Network;
    Solid => "SOLIDOASIS", Network;
    ThreeFold => "ThreeFoldOASIS", Network;
    Ethereum => "EthereumOASIS", Ledger;
    Arbitrum => "ArbitrumOASIS", Ledger;
    Polygon => "PolygonOASIS", Ledger;
    Solana => "SolanaOASIS", Ledger;
    Eosio => "EOSIOOASIS", Ledger;
    Telos => "TelosOASIS", Ledger;
    Seeds => "SEEDSOASIS", Ledger;
    Cardano => "CardanoOASIS", Ledger;
    Bitcoin => "BitcoinOASIS", Ledger;
    Hashgraph => "HashgraphOASIS", Ledger;
    Tron => "TRONOASIS", Ledger;
    BlockStack => "BlockStackOASIS", Ledger;
    InMemory => "InMemoryOASIS", Memory;
}

impl ProviderType {
    /// Comma separated list of every valid provider name.
    pub fn valid_names() -> String {
        Self::ALL.iter().map(|provider| provider.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name} is not a valid provider type. Valid values are: {valid}", valid = ProviderType::valid_names())]
pub struct UnknownProviderType {
    pub name: String,
}

impl FromStr for ProviderType {
    type Err = UnknownProviderType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim();
        ProviderType::ALL
            .iter()
            .copied()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownProviderType { name: name.to_string() })
    }
}

/// Broad family a provider type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderCategory {
    Database,
    Cloud,
    FileSystem,
    Network,
    Ledger,
    Memory,
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProviderCategory::Database => "database",
            ProviderCategory::Cloud => "cloud",
            ProviderCategory::FileSystem => "file system",
            ProviderCategory::Network => "network",
            ProviderCategory::Ledger => "ledger",
            ProviderCategory::Memory => "memory",
        };
        f.write_str(text)
    }
}

/// A named subset of the provider contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Avatar and holon persistence, search, import and export.
    Storage,
    /// Geo queries such as avatars or holons near a point.
    Network,
    /// Value transfer transactions.
    Ledger,
    /// NFT minting, transfer and on-chain lookups.
    Asset,
}

impl Capability {
    pub const ALL: [Capability; 4] = [Capability::Storage, Capability::Network, Capability::Ledger, Capability::Asset];

    const fn bit(self) -> u8 {
        match self {
            Capability::Storage => 1,
            Capability::Network => 1 << 1,
            Capability::Ledger => 1 << 2,
            Capability::Asset => 1 << 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Storage => "Storage",
            Capability::Network => "Network",
            Capability::Ledger => "Ledger",
            Capability::Asset => "Asset",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of capabilities a provider declares.
///
/// Stored as a bitset so the registry can answer "does provider X support
/// capability Y" without downcasting the provider instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const EMPTY: CapabilitySet = CapabilitySet(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Returns a copy of this set with `capability` added.
    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(CapabilitySet::EMPTY, CapabilitySet::with)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(Capability::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

/// Activation state of a registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActivationState {
    #[default]
    Inactive,
    Activating,
    Active,
    Deactivating,
}

impl ActivationState {
    /// Whether calls may be routed to the provider.
    pub fn is_active(&self) -> bool {
        matches!(self, ActivationState::Active)
    }

    /// Check if the provider is between stable states.
    pub fn is_transitional(&self) -> bool {
        matches!(self, ActivationState::Activating | ActivationState::Deactivating)
    }

    pub fn display(&self) -> &'static str {
        match self {
            ActivationState::Inactive => "Inactive",
            ActivationState::Activating => "Activating",
            ActivationState::Active => "Active",
            ActivationState::Deactivating => "Deactivating",
        }
    }
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// Health status of a provider as observed by calls routed through the core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthStatus {
    /// Whether the last call succeeded.
    pub healthy: bool,

    /// Last time a call outcome was recorded.
    pub last_check: Option<SystemTime>,

    /// Latency of the last call in milliseconds.
    pub last_latency_ms: Option<u64>,

    /// Number of consecutive failures.
    pub failure_count: u32,

    /// Last error message.
    pub last_error: Option<String>,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the provider as healthy after a successful call.
    pub fn mark_healthy(&mut self, latency: Duration) {
        self.healthy = true;
        self.failure_count = 0;
        self.last_error = None;
        self.last_latency_ms = Some(latency.as_millis() as u64);
        self.last_check = Some(SystemTime::now());
    }

    /// Mark the provider as unhealthy with an error.
    pub fn mark_unhealthy(&mut self, error: String) {
        self.healthy = false;
        self.failure_count += 1;
        self.last_error = Some(error);
        self.last_check = Some(SystemTime::now());
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Get the time since the last recorded call.
    pub fn time_since_last_check(&self) -> Option<Duration> {
        self.last_check.map(|check| check.elapsed().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_type_parses_case_insensitively() {
        assert_eq!("mongodboasis".parse::<ProviderType>().unwrap(), ProviderType::MongoDb);
        assert_eq!(" Neo4jOASIS ".parse::<ProviderType>().unwrap(), ProviderType::Neo4j);
    }

    #[test]
    fn unknown_provider_type_lists_valid_names() {
        let error = "CouchOASIS".parse::<ProviderType>().unwrap_err();
        let message = error.to_string();
        assert!(message.starts_with("CouchOASIS is not a valid provider type"));
        assert!(message.contains("EthereumOASIS"));
    }

    #[test]
    fn provider_type_serializes_to_canonical_name() {
        let json = serde_json::to_string(&ProviderType::Ipfs).unwrap();
        assert_eq!(json, "\"IPFSOASIS\"");
        let parsed: ProviderType = serde_json::from_str("\"TRONOASIS\"").unwrap();
        assert_eq!(parsed, ProviderType::Tron);
    }

    #[test]
    fn capability_set_tracks_membership() {
        let set: CapabilitySet = [Capability::Storage, Capability::Asset].into_iter().collect();
        assert!(set.contains(Capability::Storage));
        assert!(!set.contains(Capability::Ledger));
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "Storage, Asset");
        assert_eq!(CapabilitySet::EMPTY.to_string(), "none");
    }

    #[test]
    fn health_status_counts_consecutive_failures() {
        let mut health = HealthStatus::new();
        health.mark_unhealthy("boom".into());
        health.mark_unhealthy("boom again".into());
        assert_eq!(health.failure_count, 2);
        health.mark_healthy(Duration::from_millis(5));
        assert_eq!(health.failure_count, 0);
        assert!(health.is_healthy());
        assert_eq!(health.last_latency_ms, Some(5));
    }
}
