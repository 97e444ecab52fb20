//! Entity model: avatars, holons and the value objects that travel with them.

use crate::error::OasisError;
use crate::provider::ProviderType;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Free-form metadata attached to avatars and holons.
pub type MetaData = IndexMap<String, serde_json::Value>;

/// Provider specific keys for an entity, keyed by the backend that issued them.
pub type ProviderKeys = IndexMap<ProviderType, String>;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A point on the earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, OasisError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(OasisError::validation(format!("latitude {latitude} is outside -90..=90")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(OasisError::validation(format!("longitude {longitude} is outside -180..=180")));
        }
        Ok(Self { latitude, longitude })
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();
        let a = (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AvatarType {
    #[default]
    User,
    Wizard,
    Agent,
    System,
}

/// Identity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub avatar_type: AvatarType,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub provider_keys: ProviderKeys,
    #[serde(default)]
    pub metadata: MetaData,
}

impl Avatar {
    /// New active avatar with a fresh id.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            avatar_type: AvatarType::default(),
            is_verified: false,
            is_active: true,
            created_date: now,
            modified_date: now,
            deleted_date: None,
            version: 0,
            location: None,
            provider_keys: ProviderKeys::new(),
            metadata: MetaData::new(),
        }
    }

    /// Check the fields every backend relies on before a save.
    pub fn validate(&self) -> Result<(), OasisError> {
        if self.id.is_nil() {
            return Err(OasisError::validation("avatar id must not be nil"));
        }
        if self.username.trim().is_empty() {
            return Err(OasisError::validation("avatar username must not be empty"));
        }
        if self.email.trim().is_empty() {
            return Err(OasisError::validation("avatar email must not be empty"));
        }
        Ok(())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }
}

/// Tag identifying what a holon represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HolonType {
    /// Wildcard used by filters; never stored on a holon.
    All,
    #[default]
    Holon,
    Avatar,
    AvatarDetail,
    Quest,
    Mission,
    Park,
    Building,
    Zome,
    CelestialBody,
    Planet,
    Moon,
    Star,
    InventoryItem,
    GeoNft,
    Nft,
}

impl HolonType {
    /// Whether a holon of type `other` passes this filter.
    pub fn matches(&self, other: HolonType) -> bool {
        *self == HolonType::All || *self == other
    }
}

/// Generic typed data node. Holons form parent/child trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holon {
    pub id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub holon_type: HolonType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_by_avatar_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub provider_keys: ProviderKeys,
    #[serde(default)]
    pub metadata: MetaData,
    /// Populated only when children are requested on load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Holon>,
}

impl Holon {
    pub fn new(name: impl Into<String>, holon_type: HolonType) -> Self {
        Self::with_id(Uuid::new_v4(), name, holon_type)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>, holon_type: HolonType) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: None,
            holon_type,
            name: name.into(),
            description: String::new(),
            created_by_avatar_id: None,
            is_active: true,
            created_date: now,
            modified_date: now,
            deleted_date: None,
            version: 0,
            location: None,
            provider_keys: ProviderKeys::new(),
            metadata: MetaData::new(),
            children: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Check the holon and every child it carries. Each id may appear only
    /// once in the tree, since children are stored under their own id.
    pub fn validate(&self) -> Result<(), OasisError> {
        self.validate_node()?;
        let mut seen = vec![self.id];
        self.validate_children(&mut seen)
    }

    fn validate_node(&self) -> Result<(), OasisError> {
        if self.id.is_nil() {
            return Err(OasisError::validation("holon id must not be nil"));
        }
        if self.holon_type == HolonType::All {
            return Err(OasisError::validation("holon type All is a filter and cannot be stored"));
        }
        if self.parent_id == Some(self.id) {
            return Err(OasisError::validation("holon cannot be its own parent"));
        }
        Ok(())
    }

    fn validate_children(&self, seen: &mut Vec<Uuid>) -> Result<(), OasisError> {
        for child in &self.children {
            child.validate_node()?;
            if seen.contains(&child.id) {
                return Err(OasisError::validation(format!("holon {} appears more than once in its own tree", child.id)));
            }
            seen.push(child.id);
            child.validate_children(seen)?;
        }
        Ok(())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }
}

fn default_true() -> bool {
    true
}

fn require_text(label: &str, value: &str) -> Result<(), OasisError> {
    if value.trim().is_empty() {
        return Err(OasisError::validation(format!("{label} must not be empty")));
    }
    Ok(())
}

/// How an avatar is addressed on load and delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvatarKey {
    Id(Uuid),
    ProviderKey(String),
    Email(String),
    Username(String),
}

impl AvatarKey {
    pub fn validate(&self) -> Result<(), OasisError> {
        match self {
            AvatarKey::Id(id) if id.is_nil() => Err(OasisError::validation("avatar id must not be nil")),
            AvatarKey::Id(_) => Ok(()),
            AvatarKey::ProviderKey(key) => require_text("avatar provider key", key),
            AvatarKey::Email(email) => require_text("avatar email", email),
            AvatarKey::Username(username) => require_text("avatar username", username),
        }
    }

    /// Whether `avatar` is the one addressed by this key on `provider`.
    pub fn matches(&self, avatar: &Avatar, provider: ProviderType) -> bool {
        match self {
            AvatarKey::Id(id) => avatar.id == *id,
            AvatarKey::ProviderKey(key) => avatar.provider_keys.get(&provider) == Some(key),
            AvatarKey::Email(email) => avatar.email.eq_ignore_ascii_case(email),
            AvatarKey::Username(username) => avatar.username == *username,
        }
    }
}

impl fmt::Display for AvatarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvatarKey::Id(id) => write!(f, "avatar with id {id}"),
            AvatarKey::ProviderKey(key) => write!(f, "avatar with provider key {key}"),
            AvatarKey::Email(email) => write!(f, "avatar with email {email}"),
            AvatarKey::Username(username) => write!(f, "avatar with username {username}"),
        }
    }
}

/// How a holon is addressed on load and delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HolonKey {
    Id(Uuid),
    ProviderKey(String),
}

impl HolonKey {
    pub fn validate(&self) -> Result<(), OasisError> {
        match self {
            HolonKey::Id(id) if id.is_nil() => Err(OasisError::validation("holon id must not be nil")),
            HolonKey::Id(_) => Ok(()),
            HolonKey::ProviderKey(key) => require_text("holon provider key", key),
        }
    }

    pub fn matches(&self, holon: &Holon, provider: ProviderType) -> bool {
        match self {
            HolonKey::Id(id) => holon.id == *id,
            HolonKey::ProviderKey(key) => holon.provider_keys.get(&provider) == Some(key),
        }
    }
}

impl fmt::Display for HolonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolonKey::Id(id) => write!(f, "holon with id {id}"),
            HolonKey::ProviderKey(key) => write!(f, "holon with provider key {key}"),
        }
    }
}

/// Options shared by holon loads, searches and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    pub load_children: bool,
    pub recursive: bool,
    /// Zero means unlimited depth.
    pub max_depth: u32,
    pub continue_on_error: bool,
    /// Requested data version. Backends without versioning ignore it.
    pub version: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            load_children: true,
            recursive: true,
            max_depth: 0,
            continue_on_error: true,
            version: 0,
        }
    }
}

impl LoadOptions {
    /// Options that load only the addressed holons.
    pub fn shallow() -> Self {
        Self {
            load_children: false,
            ..Self::default()
        }
    }

    /// Whether children one level below `depth` should be loaded. The root is
    /// depth zero and `max_depth` counts levels including the root.
    pub fn descend_below(&self, depth: u32) -> bool {
        if !self.load_children {
            return false;
        }
        if depth > 0 && !self.recursive {
            return false;
        }
        self.max_depth == 0 || depth + 1 < self.max_depth
    }
}

/// ALL requires every pair to match, ANY requires at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MetaDataMatchMode {
    #[default]
    All,
    Any,
}

/// Key/value pairs a holon's metadata must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataQuery {
    pub pairs: IndexMap<String, String>,
    #[serde(default)]
    pub match_mode: MetaDataMatchMode,
}

impl MetaDataQuery {
    /// Query for a single key/value pair.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut pairs = IndexMap::new();
        pairs.insert(key.into(), value.into());
        Self {
            pairs,
            match_mode: MetaDataMatchMode::All,
        }
    }

    pub fn with_mode(mut self, match_mode: MetaDataMatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn validate(&self) -> Result<(), OasisError> {
        if self.pairs.is_empty() {
            return Err(OasisError::validation("metadata query needs at least one key/value pair"));
        }
        self.pairs.keys().try_for_each(|key| require_text("metadata key", key))
    }

    /// Evaluate the query against a metadata map. String values compare as-is,
    /// other JSON values compare by their JSON text.
    pub fn matches(&self, metadata: &MetaData) -> bool {
        let pair_matches = |(key, expected): (&String, &String)| {
            metadata.get(key).is_some_and(|value| match value {
                serde_json::Value::String(text) => text == expected,
                other => other.to_string() == *expected,
            })
        };
        match self.match_mode {
            MetaDataMatchMode::All => self.pairs.iter().all(pair_matches),
            MetaDataMatchMode::Any => self.pairs.iter().any(pair_matches),
        }
    }
}

/// Query description for a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Free-text term matched against name and description.
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default = "default_holon_filter")]
    pub holon_type: HolonType,
    #[serde(default)]
    pub metadata: Option<MetaDataQuery>,
    /// Restrict results to holons created by this avatar.
    #[serde(default)]
    pub avatar_id: Option<Uuid>,
}

fn default_holon_filter() -> HolonType {
    HolonType::All
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            term: None,
            holon_type: HolonType::All,
            metadata: None,
            avatar_id: None,
        }
    }
}

impl SearchParams {
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), OasisError> {
        let has_term = self.term.as_deref().is_some_and(|term| !term.trim().is_empty());
        if !has_term && self.metadata.is_none() && self.avatar_id.is_none() && self.holon_type == HolonType::All {
            return Err(OasisError::validation("search needs a term, metadata, avatar or holon type filter"));
        }
        if let Some(metadata) = &self.metadata {
            metadata.validate()?;
        }
        Ok(())
    }

    pub fn matches(&self, holon: &Holon) -> bool {
        if !self.holon_type.matches(holon.holon_type) {
            return false;
        }
        if let Some(avatar_id) = self.avatar_id
            && holon.created_by_avatar_id != Some(avatar_id)
        {
            return false;
        }
        if let Some(metadata) = &self.metadata
            && !metadata.matches(&holon.metadata)
        {
            return false;
        }
        match self.term.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                holon.name.to_lowercase().contains(&term) || holon.description.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

/// Ordered and counted search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub holons: Vec<Holon>,
    pub total_count: usize,
}

impl SearchResults {
    pub fn new(holons: Vec<Holon>) -> Self {
        let total_count = holons.len();
        Self { holons, total_count }
    }
}

/// Who sends or receives value in a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletRef {
    Address(String),
    AvatarId(Uuid),
    Username(String),
    Email(String),
}

impl WalletRef {
    pub fn validate(&self) -> Result<(), OasisError> {
        match self {
            WalletRef::Address(address) => require_text("wallet address", address),
            WalletRef::AvatarId(id) if id.is_nil() => Err(OasisError::validation("wallet avatar id must not be nil")),
            WalletRef::AvatarId(_) => Ok(()),
            WalletRef::Username(username) => require_text("wallet username", username),
            WalletRef::Email(email) => require_text("wallet email", email),
        }
    }
}

impl fmt::Display for WalletRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletRef::Address(address) => write!(f, "address {address}"),
            WalletRef::AvatarId(id) => write!(f, "avatar {id}"),
            WalletRef::Username(username) => write!(f, "username {username}"),
            WalletRef::Email(email) => write!(f, "email {email}"),
        }
    }
}

/// Value transfer request. `amount` is in the ledger's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: WalletRef,
    pub to: WalletRef,
    pub amount: u64,
    /// Token contract or symbol; `None` means the ledger's native coin.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub memo: String,
}

impl TransactionRequest {
    pub fn new(from: WalletRef, to: WalletRef, amount: u64) -> Self {
        Self {
            from,
            to,
            amount,
            token: None,
            memo: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), OasisError> {
        self.from.validate()?;
        self.to.validate()?;
        if self.amount == 0 {
            return Err(OasisError::validation("transaction amount must be greater than zero"));
        }
        if self.from == self.to {
            return Err(OasisError::validation("transaction sender and recipient are the same"));
        }
        if let Some(token) = &self.token {
            require_text("transaction token", token)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub provider: ProviderType,
    pub amount: u64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintAssetRequest {
    pub minted_by_avatar_id: Uuid,
    pub to: WalletRef,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub metadata: MetaData,
}

impl MintAssetRequest {
    pub fn validate(&self) -> Result<(), OasisError> {
        if self.minted_by_avatar_id.is_nil() {
            return Err(OasisError::validation("minting avatar id must not be nil"));
        }
        self.to.validate()?;
        require_text("asset title", &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAssetRequest {
    pub from: WalletRef,
    pub to: WalletRef,
    pub token_address: String,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub memo: String,
}

impl SendAssetRequest {
    pub fn validate(&self) -> Result<(), OasisError> {
        self.from.validate()?;
        self.to.validate()?;
        require_text("asset token address", &self.token_address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetReceipt {
    pub transaction_hash: String,
    pub provider: ProviderType,
    pub token_address: String,
    #[serde(default)]
    pub token_id: Option<String>,
}

/// Asset data as recorded on chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainAsset {
    pub token_address: String,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metadata: MetaData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn geo_point_rejects_out_of_range_latitude() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(51.5, -0.12).is_ok());
    }

    #[test]
    fn distance_between_london_and_paris_is_about_344_km() {
        let london = GeoPoint::new(51.5074, -0.1278).unwrap();
        let paris = GeoPoint::new(48.8566, 2.3522).unwrap();
        let km = london.distance_meters(&paris) / 1000.0;
        assert!((340.0..350.0).contains(&km), "{km}");
    }

    #[test]
    fn metadata_query_modes() {
        let mut metadata = MetaData::new();
        metadata.insert("colour".into(), json!("red"));
        metadata.insert("level".into(), json!(3));

        let mut query = MetaDataQuery::single("colour", "red");
        query.pairs.insert("level".into(), "4".into());
        assert!(!query.matches(&metadata));
        assert!(query.clone().with_mode(MetaDataMatchMode::Any).matches(&metadata));

        let numeric = MetaDataQuery::single("level", "3");
        assert!(numeric.matches(&metadata));
    }

    #[test]
    fn keys_reject_blank_and_nil_values() {
        assert!(AvatarKey::Id(Uuid::nil()).validate().is_err());
        assert!(AvatarKey::Email("   ".into()).validate().is_err());
        assert!(HolonKey::ProviderKey(String::new()).validate().is_err());
        assert!(HolonKey::Id(Uuid::new_v4()).validate().is_ok());
    }

    #[test]
    fn holon_validation_rejects_wildcard_type_and_self_parent() {
        let holon = Holon::new("Quest A", HolonType::All);
        assert!(holon.validate().is_err());

        let quest = Holon::new("Quest A", HolonType::Quest);
        let looped = quest.clone().with_parent(quest.id);
        assert!(looped.validate().is_err());
        assert!(quest.validate().is_ok());
    }

    #[test]
    fn holon_ids_must_be_unique_within_a_tree() {
        let mut quest = Holon::new("Quest A", HolonType::Quest);
        let mut clone_of_parent = Holon::new("Step 1", HolonType::Holon);
        clone_of_parent.id = quest.id;
        quest.children.push(clone_of_parent);
        let error = quest.validate().expect_err("repeated id");
        assert!(error.to_string().contains("more than once"));

        let mut chain = Holon::new("Quest B", HolonType::Quest);
        let mut step = Holon::new("Step 1", HolonType::Holon);
        step.children.push(Holon::new("Step 1a", HolonType::Holon));
        chain.children.push(step);
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn load_options_depth_limits() {
        let options = LoadOptions {
            max_depth: 2,
            ..LoadOptions::default()
        };
        assert!(options.descend_below(0));
        assert!(!options.descend_below(1));

        let flat = LoadOptions {
            recursive: false,
            ..LoadOptions::default()
        };
        assert!(flat.descend_below(0));
        assert!(!flat.descend_below(1));
        assert!(!LoadOptions::shallow().descend_below(0));
    }

    #[test]
    fn transaction_request_requires_positive_amount() {
        let request = TransactionRequest::new(WalletRef::Username("alice".into()), WalletRef::Username("bob".into()), 0);
        assert!(request.validate().is_err());
        let request = TransactionRequest { amount: 5, ..request };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn search_params_match_term_and_type() {
        let mut holon = Holon::new("Dragon Quest", HolonType::Quest);
        holon.description = "slay it".into();
        assert!(SearchParams::term("dragon").matches(&holon));
        let params = SearchParams {
            holon_type: HolonType::Park,
            ..SearchParams::term("dragon")
        };
        assert!(!params.matches(&holon));
        assert!(SearchParams::default().validate().is_err());
    }
}
