//! Caller-facing facade over the registry and the failover engine.
//!
//! Every operation validates its arguments before any backend is touched and
//! always answers with an [`OasisResult`].

use crate::config::{ConfigError, OasisConfig, parse_provider_names};
use crate::contract::{AssetSlot, LedgerSlot, NetworkSlot, StorageSlot};
use crate::failover::{CallOptions, FailoverEngine, FailoverPolicy, OperationClass};
use crate::logging::LogManager;
use crate::registry::{LifecycleSettings, ProviderRegistry};
use futures_util::FutureExt;
use oasis_types::{
    AssetReceipt, Avatar, AvatarKey, ErrorKind, GeoPoint, Holon, HolonKey, HolonType, LoadOptions, MetaDataQuery,
    MintAssetRequest, OasisError, OasisResult, OnChainAsset, ProviderType, SearchParams, SearchResults,
    SendAssetRequest, TransactionReceipt, TransactionRequest,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Return a validation failure before any provider is called.
macro_rules! ensure_valid {
    ($check:expr) => {
        if let Err(error) = $check {
            return OasisResult::err(error);
        }
    };
}

fn validate_radius(radius_meters: f64) -> Result<(), OasisError> {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(OasisError::validation(format!("radius {radius_meters} must be a positive distance in meters")));
    }
    Ok(())
}

fn validate_holons(holons: &[Holon], action: &str) -> Result<(), OasisError> {
    if holons.is_empty() {
        return Err(OasisError::validation(format!("no holons to {action}")));
    }
    holons.iter().try_for_each(Holon::validate)
}

#[derive(Debug)]
pub struct OasisRouter {
    engine: FailoverEngine,
}

impl OasisRouter {
    pub fn new(registry: Arc<ProviderRegistry>, policy: FailoverPolicy) -> Self {
        Self {
            engine: FailoverEngine::new(registry, policy),
        }
    }

    /// Empty registry with timeouts, logging and policy taken from `config`.
    pub fn from_config(config: &OasisConfig) -> Result<Self, ConfigError> {
        let policy = FailoverPolicy::from_config(&config.storage_providers)?;
        let registry = ProviderRegistry::with_settings(LifecycleSettings::from_config(&config.storage_providers))
            .with_log_manager(Arc::new(LogManager::from_config(&config.logging)));
        Ok(Self::new(Arc::new(registry), policy))
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        self.engine.registry()
    }

    /// Snapshot of the failover and replication policy.
    pub async fn policy(&self) -> FailoverPolicy {
        self.engine.policy().await
    }

    pub fn logs(&self) -> &Arc<LogManager> {
        self.engine.registry().logs()
    }

    // Lifecycle

    pub async fn activate(&self, provider: ProviderType) -> OasisResult<bool> {
        self.registry().activate(provider).await
    }

    pub async fn deactivate(&self, provider: ProviderType) -> OasisResult<bool> {
        self.registry().deactivate(provider).await
    }

    /// Activate every registered provider.
    pub async fn init(&self) -> OasisResult<usize> {
        self.registry().activate_all().await
    }

    pub async fn shutdown(&self) -> OasisResult<usize> {
        self.registry().shutdown().await
    }

    // Failover and replication lists

    pub async fn set_auto_failover(&self, enabled: bool) -> OasisResult<bool> {
        self.engine.update_policy(|policy| policy.auto_failover = enabled).await;
        info!(enabled, "auto failover switched");
        OasisResult::ok(true)
    }

    pub async fn set_auto_replication(&self, enabled: bool) -> OasisResult<bool> {
        self.engine.update_policy(|policy| policy.auto_replication = enabled).await;
        info!(enabled, "auto replication switched");
        OasisResult::ok(true)
    }

    /// Replace the failover list for `class` with a comma-separated list of
    /// provider names. Nothing changes if any name is invalid.
    pub async fn set_failover_list(&self, class: OperationClass, providers: &str) -> OasisResult<bool> {
        let order = match parse_provider_names(class.config_field(), providers) {
            Ok(order) => order,
            Err(error) => return OasisResult::err(OasisError::validation(error.to_string())),
        };
        info!(class = ?class, providers = order.len(), "failover list replaced");
        self.engine.update_policy(|policy| policy.set_order(class, order)).await;
        OasisResult::ok(true)
    }

    /// Replace the replication list with a comma-separated list of provider names.
    pub async fn set_replication_list(&self, providers: &str) -> OasisResult<bool> {
        let mirrors = match parse_provider_names("autoReplicationProviders", providers) {
            Ok(mirrors) => mirrors,
            Err(error) => return OasisResult::err(OasisError::validation(error.to_string())),
        };
        info!(providers = mirrors.len(), "replication list replaced");
        self.engine
            .update_policy(|policy| policy.replication_providers = mirrors)
            .await;
        OasisResult::ok(true)
    }

    /// Add `providers` to the failover list for `class`, or take them off it.
    pub async fn set_failover_for_providers(
        &self,
        class: OperationClass,
        include: bool,
        providers: &[ProviderType],
    ) -> OasisResult<bool> {
        self.engine
            .update_policy(|policy| policy.include_in_order(class, providers, include))
            .await;
        OasisResult::ok(true)
    }

    /// Add `providers` to the replication list, or take them off it.
    pub async fn set_replication_for_providers(&self, include: bool, providers: &[ProviderType]) -> OasisResult<bool> {
        self.engine
            .update_policy(|policy| policy.include_in_replication(providers, include))
            .await;
        OasisResult::ok(true)
    }

    // Avatars

    pub async fn load_avatar(&self, key: &AvatarKey, version: u32, options: &CallOptions) -> OasisResult<Avatar> {
        ensure_valid!(key.validate());
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "load_avatar", options, move |provider| {
                async move { provider.load_avatar(key, version).await }.boxed()
            })
            .await
    }

    /// Same as [`load_avatar`](Self::load_avatar) but ordered by the login
    /// failover list.
    pub async fn load_avatar_for_login(&self, key: &AvatarKey, version: u32, options: &CallOptions) -> OasisResult<Avatar> {
        ensure_valid!(key.validate());
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::AvatarLogin, "load_avatar", options, move |provider| {
                async move { provider.load_avatar(key, version).await }.boxed()
            })
            .await
    }

    pub async fn load_all_avatars(&self, version: u32, options: &CallOptions) -> OasisResult<Vec<Avatar>> {
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "load_all_avatars", options, move |provider| {
                async move { provider.load_all_avatars(version).await }.boxed()
            })
            .await
    }

    pub async fn save_avatar(&self, avatar: &Avatar, options: &CallOptions) -> OasisResult<Avatar> {
        ensure_valid!(avatar.validate());
        self.engine
            .write::<StorageSlot, _, _>(OperationClass::General, "save_avatar", options, move |provider| {
                async move { provider.save_avatar(avatar).await }.boxed()
            })
            .await
    }

    pub async fn delete_avatar(&self, key: &AvatarKey, soft_delete: bool, options: &CallOptions) -> OasisResult<bool> {
        ensure_valid!(key.validate());
        self.engine
            .write::<StorageSlot, _, _>(OperationClass::General, "delete_avatar", options, move |provider| {
                async move { provider.delete_avatar(key, soft_delete).await }.boxed()
            })
            .await
    }

    pub async fn is_username_in_use(&self, username: &str, options: &CallOptions) -> OasisResult<bool> {
        let key = AvatarKey::Username(username.trim().to_string());
        ensure_valid!(key.validate());
        let result = self
            .engine
            .read::<StorageSlot, _, _>(OperationClass::CheckUsernameInUse, "is_username_in_use", options, |provider| {
                let key = &key;
                async move { provider.load_avatar(key, 0).await }.boxed()
            })
            .await;
        in_use(result)
    }

    pub async fn is_email_in_use(&self, email: &str, options: &CallOptions) -> OasisResult<bool> {
        let key = AvatarKey::Email(email.trim().to_string());
        ensure_valid!(key.validate());
        let result = self
            .engine
            .read::<StorageSlot, _, _>(OperationClass::CheckEmailInUse, "is_email_in_use", options, |provider| {
                let key = &key;
                async move { provider.load_avatar(key, 0).await }.boxed()
            })
            .await;
        in_use(result)
    }

    // Holons

    pub async fn load_holon(&self, key: &HolonKey, load: &LoadOptions, options: &CallOptions) -> OasisResult<Holon> {
        ensure_valid!(key.validate());
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "load_holon", options, move |provider| {
                async move { provider.load_holon(key, load).await }.boxed()
            })
            .await
    }

    pub async fn load_holons_for_parent(
        &self,
        parent: &HolonKey,
        holon_type: HolonType,
        load: &LoadOptions,
        options: &CallOptions,
    ) -> OasisResult<Vec<Holon>> {
        ensure_valid!(parent.validate());
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "load_holons_for_parent", options, move |provider| {
                async move { provider.load_holons_for_parent(parent, holon_type, load).await }.boxed()
            })
            .await
    }

    pub async fn load_holons_by_metadata(
        &self,
        query: &MetaDataQuery,
        holon_type: HolonType,
        load: &LoadOptions,
        options: &CallOptions,
    ) -> OasisResult<Vec<Holon>> {
        ensure_valid!(query.validate());
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "load_holons_by_metadata", options, move |provider| {
                async move { provider.load_holons_by_metadata(query, holon_type, load).await }.boxed()
            })
            .await
    }

    pub async fn load_all_holons(&self, holon_type: HolonType, load: &LoadOptions, options: &CallOptions) -> OasisResult<Vec<Holon>> {
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "load_all_holons", options, move |provider| {
                async move { provider.load_all_holons(holon_type, load).await }.boxed()
            })
            .await
    }

    pub async fn save_holon(&self, holon: &Holon, options: &CallOptions) -> OasisResult<Holon> {
        ensure_valid!(holon.validate());
        self.engine
            .write::<StorageSlot, _, _>(OperationClass::General, "save_holon", options, move |provider| {
                async move { provider.save_holon(holon).await }.boxed()
            })
            .await
    }

    pub async fn save_holons(&self, holons: &[Holon], options: &CallOptions) -> OasisResult<Vec<Holon>> {
        ensure_valid!(validate_holons(holons, "save"));
        self.engine
            .write::<StorageSlot, _, _>(OperationClass::General, "save_holons", options, move |provider| {
                async move { provider.save_holons(holons).await }.boxed()
            })
            .await
    }

    pub async fn delete_holon(&self, key: &HolonKey, soft_delete: bool, options: &CallOptions) -> OasisResult<bool> {
        ensure_valid!(key.validate());
        self.engine
            .write::<StorageSlot, _, _>(OperationClass::General, "delete_holon", options, move |provider| {
                async move { provider.delete_holon(key, soft_delete).await }.boxed()
            })
            .await
    }

    // Search, import and export

    pub async fn search(&self, params: &SearchParams, load: &LoadOptions, options: &CallOptions) -> OasisResult<SearchResults> {
        ensure_valid!(params.validate());
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "search", options, move |provider| {
                async move { provider.search(params, load).await }.boxed()
            })
            .await
    }

    pub async fn import(&self, holons: &[Holon], options: &CallOptions) -> OasisResult<bool> {
        ensure_valid!(validate_holons(holons, "import"));
        self.engine
            .write::<StorageSlot, _, _>(OperationClass::General, "import", options, move |provider| {
                async move { provider.import(holons).await }.boxed()
            })
            .await
    }

    pub async fn export_all_data_for_avatar(&self, avatar: &AvatarKey, version: u32, options: &CallOptions) -> OasisResult<Vec<Holon>> {
        ensure_valid!(avatar.validate());
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "export_all_data_for_avatar", options, move |provider| {
                async move { provider.export_all_data_for_avatar(avatar, version).await }.boxed()
            })
            .await
    }

    pub async fn export_all(&self, version: u32, options: &CallOptions) -> OasisResult<Vec<Holon>> {
        self.engine
            .read::<StorageSlot, _, _>(OperationClass::General, "export_all", options, move |provider| {
                async move { provider.export_all(version).await }.boxed()
            })
            .await
    }

    // Geo

    pub async fn avatars_near_me(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
        options: &CallOptions,
    ) -> OasisResult<Vec<Avatar>> {
        let center = match GeoPoint::new(latitude, longitude) {
            Ok(center) => center,
            Err(error) => return OasisResult::err(error),
        };
        ensure_valid!(validate_radius(radius_meters));
        self.engine
            .read::<NetworkSlot, _, _>(OperationClass::General, "avatars_near_me", options, move |provider| {
                async move { provider.avatars_near_me(center, radius_meters).await }.boxed()
            })
            .await
    }

    pub async fn holons_near_me(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
        holon_type: HolonType,
        options: &CallOptions,
    ) -> OasisResult<Vec<Holon>> {
        let center = match GeoPoint::new(latitude, longitude) {
            Ok(center) => center,
            Err(error) => return OasisResult::err(error),
        };
        ensure_valid!(validate_radius(radius_meters));
        self.engine
            .read::<NetworkSlot, _, _>(OperationClass::General, "holons_near_me", options, move |provider| {
                async move { provider.holons_near_me(center, radius_meters, holon_type).await }.boxed()
            })
            .await
    }

    // Ledger and assets. Value-moving calls go to one provider only.

    pub async fn send_transaction(&self, request: &TransactionRequest, options: &CallOptions) -> OasisResult<TransactionReceipt> {
        ensure_valid!(request.validate());
        self.engine
            .single::<LedgerSlot, _, _>(OperationClass::General, "send_transaction", options, move |provider| {
                async move { provider.send_transaction(request).await }.boxed()
            })
            .await
    }

    pub async fn send_transaction_by_default_wallet(
        &self,
        from_avatar: Uuid,
        to_avatar: Uuid,
        amount: u64,
        options: &CallOptions,
    ) -> OasisResult<TransactionReceipt> {
        if from_avatar.is_nil() || to_avatar.is_nil() {
            return OasisResult::err(OasisError::validation("avatar ids must not be nil"));
        }
        if from_avatar == to_avatar {
            return OasisResult::err(OasisError::validation("transaction sender and recipient are the same"));
        }
        if amount == 0 {
            return OasisResult::err(OasisError::validation("transaction amount must be greater than zero"));
        }
        self.engine
            .single::<LedgerSlot, _, _>(
                OperationClass::General,
                "send_transaction_by_default_wallet",
                options,
                move |provider| async move { provider.send_transaction_by_default_wallet(from_avatar, to_avatar, amount).await }.boxed(),
            )
            .await
    }

    pub async fn mint_asset(&self, request: &MintAssetRequest, options: &CallOptions) -> OasisResult<AssetReceipt> {
        ensure_valid!(request.validate());
        self.engine
            .single::<AssetSlot, _, _>(OperationClass::General, "mint_asset", options, move |provider| {
                async move { provider.mint_asset(request).await }.boxed()
            })
            .await
    }

    pub async fn send_asset(&self, request: &SendAssetRequest, options: &CallOptions) -> OasisResult<AssetReceipt> {
        ensure_valid!(request.validate());
        self.engine
            .single::<AssetSlot, _, _>(OperationClass::General, "send_asset", options, move |provider| {
                async move { provider.send_asset(request).await }.boxed()
            })
            .await
    }

    pub async fn load_on_chain_asset_data(&self, token_address: &str, options: &CallOptions) -> OasisResult<OnChainAsset> {
        if token_address.trim().is_empty() {
            return OasisResult::err(OasisError::validation("asset token address must not be empty"));
        }
        self.engine
            .read::<AssetSlot, _, _>(OperationClass::General, "load_on_chain_asset_data", options, move |provider| {
                async move { provider.load_on_chain_asset_data(token_address).await }.boxed()
            })
            .await
    }
}

/// A found avatar means "in use"; not found everywhere means "free".
fn in_use(result: OasisResult<Avatar>) -> OasisResult<bool> {
    if result.kind() != Some(ErrorKind::NotFound) {
        return result.map(|_| true);
    }
    let free = OasisResult::ok(false).with_warnings(result.warnings().to_vec());
    match result.provider() {
        Some(provider) => free.with_provider(provider),
        None => free,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProvider;

    async fn router_with_memory() -> OasisRouter {
        let registry = Arc::new(ProviderRegistry::new());
        let provider = Arc::new(InMemoryProvider::default());
        registry.register(provider.handle()).await.expect("register");
        let router = OasisRouter::new(registry, FailoverPolicy::default());
        assert!(router.init().await.is_ok());
        router
    }

    #[tokio::test]
    async fn invalid_arguments_are_rejected_before_dispatch() {
        let router = router_with_memory().await;
        let options = CallOptions::new();

        let nil = router.load_holon(&HolonKey::Id(Uuid::nil()), &LoadOptions::default(), &options).await;
        assert_eq!(nil.kind(), Some(ErrorKind::ValidationFailure));
        assert_eq!(nil.provider(), None);

        let far = router.avatars_near_me(95.0, 0.0, 10.0, &options).await;
        assert_eq!(far.kind(), Some(ErrorKind::ValidationFailure));

        let empty = router.import(&[], &options).await;
        assert_eq!(empty.kind(), Some(ErrorKind::ValidationFailure));

        assert!(router.logs().all_calls(ProviderType::InMemory).await.is_empty());
    }

    #[tokio::test]
    async fn username_and_email_checks_map_not_found_to_free() {
        let router = router_with_memory().await;
        let options = CallOptions::new();
        assert_eq!(router.is_username_in_use("zoe", &options).await.value(), Some(&false));

        let saved = router.save_avatar(&Avatar::new("zoe", "zoe@example.com"), &options).await;
        assert!(saved.is_ok());
        assert_eq!(router.is_username_in_use("zoe", &options).await.value(), Some(&true));
        assert_eq!(router.is_email_in_use("ZOE@example.com", &options).await.value(), Some(&true));
    }

    #[tokio::test]
    async fn ledger_calls_without_a_ledger_provider_report_no_active_provider() {
        let router = router_with_memory().await;
        let request = TransactionRequest::new(
            oasis_types::WalletRef::Address("a".into()),
            oasis_types::WalletRef::Address("b".into()),
            5,
        );
        let result = router.send_transaction(&request, &CallOptions::new()).await;
        assert_eq!(result.kind(), Some(ErrorKind::NoActiveProvider));
    }

    #[tokio::test]
    async fn failover_lists_change_at_runtime() {
        let router = router_with_memory().await;

        let rejected = router
            .set_failover_list(OperationClass::AvatarLogin, "MongoDBOASIS, NotAProvider")
            .await;
        assert_eq!(rejected.kind(), Some(ErrorKind::ValidationFailure));
        assert!(rejected.message().contains("NotAProvider is not a valid provider type"));
        assert!(router.policy().await.order(OperationClass::AvatarLogin).is_empty());

        assert!(router.set_failover_list(OperationClass::AvatarLogin, "Neo4jOASIS, MongoDBOASIS").await.is_ok());
        assert_eq!(
            router.policy().await.order(OperationClass::AvatarLogin),
            [ProviderType::Neo4j, ProviderType::MongoDb]
        );

        assert!(router
            .set_failover_for_providers(OperationClass::AvatarLogin, false, &[ProviderType::Neo4j])
            .await
            .is_ok());
        assert_eq!(router.policy().await.order(OperationClass::AvatarLogin), [ProviderType::MongoDb]);

        assert!(router.set_replication_list("SQLLiteDBOASIS").await.is_ok());
        assert!(router.set_replication_for_providers(true, &[ProviderType::Ipfs]).await.is_ok());
        assert!(router.set_auto_replication(true).await.is_ok());
        assert!(router.set_auto_failover(false).await.is_ok());
        let policy = router.policy().await;
        assert!(policy.auto_replication);
        assert!(!policy.auto_failover);
        assert_eq!(policy.replication_providers, vec![ProviderType::SqliteDb, ProviderType::Ipfs]);
    }

    #[tokio::test]
    async fn new_failover_list_applies_to_the_next_call() {
        let registry = Arc::new(ProviderRegistry::new());
        for provider in [ProviderType::MongoDb, ProviderType::Neo4j] {
            registry
                .register(Arc::new(InMemoryProvider::new(provider)).handle())
                .await
                .expect("register");
        }
        let router = OasisRouter::new(registry, FailoverPolicy::default());
        assert!(router.init().await.is_ok());
        let holon = Holon::new("Quest A", HolonType::Quest);

        let first = router.save_holon(&holon, &CallOptions::new()).await;
        assert_eq!(first.provider(), Some(ProviderType::MongoDb));

        assert!(router.set_failover_list(OperationClass::General, "Neo4jOASIS").await.is_ok());
        let second = router.save_holon(&holon, &CallOptions::new()).await;
        assert_eq!(second.provider(), Some(ProviderType::Neo4j));
    }
}
