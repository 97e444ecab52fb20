mod support;

use oasis_core::{
    ActivationContext, AssetProvider, CallOptions, FailoverPolicy, InMemoryProvider, LedgerProvider, NetworkProvider,
    OasisProvider, OasisRouter, ProviderRegistry, StorageProvider, StorageSlot,
};
use oasis_types::{
    Avatar, AvatarKey, Capability, ErrorKind, GeoPoint, HolonKey, HolonType, LoadOptions, MetaDataQuery,
    ProviderType, SearchParams,
};
use std::sync::Arc;
use support::{CallLog, ScriptedProvider, fast_settings, register_active};
use uuid::Uuid;

#[tokio::test]
async fn unimplemented_operations_report_not_supported() {
    let log = CallLog::new();
    let provider = ScriptedProvider::new(ProviderType::MongoDb, &log);
    assert!(provider.activate(&ActivationContext::new()).await.is_ok());
    let load = LoadOptions::default();

    let results = [
        provider.load_avatar(&AvatarKey::Username("ann".into()), 0).await.map(|_| ()),
        provider.save_avatar(&Avatar::new("ann", "ann@example.com")).await.map(|_| ()),
        provider.delete_holon(&HolonKey::Id(Uuid::new_v4()), true).await.map(|_| ()),
        provider
            .load_holons_by_metadata(&MetaDataQuery::single("k", "v"), HolonType::All, &load)
            .await
            .map(|_| ()),
        provider.search(&SearchParams::term("quest"), &load).await.map(|_| ()),
        provider.export_all(0).await.map(|_| ()),
        provider
            .send_transaction_by_default_wallet(Uuid::new_v4(), Uuid::new_v4(), 1)
            .await
            .map(|_| ()),
    ];
    for result in results {
        assert!(result.is_error());
        assert_eq!(result.kind(), Some(ErrorKind::NotSupported));
        assert!(result.message().contains("is not supported by MongoDBOASIS"), "{}", result.message());
    }
}

#[tokio::test]
async fn unimplemented_operations_on_an_inactive_adapter_report_not_activated() {
    let log = CallLog::new();
    let registry = ProviderRegistry::with_settings(fast_settings());
    let provider = Arc::new(ScriptedProvider::new(ProviderType::MongoDb, &log));
    registry.register(Arc::clone(&provider).handle()).await.expect("register");

    let storage = registry.resolve_as::<StorageSlot>(ProviderType::MongoDb).await.expect("storage");
    let result = storage.save_avatar(&Avatar::new("ann", "ann@example.com")).await;
    assert_eq!(result.kind(), Some(ErrorKind::NotActivated));
    assert_eq!(result.message(), "MongoDBOASIS Provider is not activated");

    assert!(registry.activate(ProviderType::MongoDb).await.is_ok());
    let result = storage.save_avatar(&Avatar::new("ann", "ann@example.com")).await;
    assert_eq!(result.kind(), Some(ErrorKind::NotSupported));
}

#[tokio::test]
async fn default_capability_bodies_cover_every_trait() {
    struct Bare;

    #[async_trait::async_trait]
    impl OasisProvider for Bare {
        fn provider_type(&self) -> ProviderType {
            ProviderType::Tron
        }

        async fn activate(&self, _context: &ActivationContext) -> oasis_types::OasisResult<bool> {
            oasis_types::OasisResult::ok(true)
        }

        async fn deactivate(&self) -> oasis_types::OasisResult<bool> {
            oasis_types::OasisResult::ok(true)
        }
    }

    impl StorageProvider for Bare {}
    impl NetworkProvider for Bare {}
    impl LedgerProvider for Bare {}
    impl AssetProvider for Bare {}

    let bare = Bare;
    let center = GeoPoint::new(0.0, 0.0).expect("point");
    assert_eq!(bare.load_all_avatars(0).await.kind(), Some(ErrorKind::NotSupported));
    assert_eq!(bare.avatars_near_me(center, 10.0).await.kind(), Some(ErrorKind::NotSupported));
    assert_eq!(bare.load_on_chain_asset_data("0xabc").await.kind(), Some(ErrorKind::NotSupported));
    assert_eq!(
        bare.holons_near_me(center, 10.0, HolonType::Park).await.message(),
        "holons_near_me is not supported by TRONOASIS"
    );
}

#[tokio::test]
async fn capability_missing_from_handle_is_not_supported_at_dispatch() {
    let log = CallLog::new();
    let registry = Arc::new(ProviderRegistry::with_settings(fast_settings()));
    let provider = Arc::new(ScriptedProvider::new(ProviderType::MongoDb, &log));
    register_active(&registry, &[Arc::clone(&provider)]).await;

    assert!(registry.resolve(ProviderType::MongoDb).await.expect("resolve").supports(Capability::Ledger));
    assert!(!registry.resolve(ProviderType::MongoDb).await.expect("resolve").supports(Capability::Network));

    let router = OasisRouter::new(registry, FailoverPolicy::default());
    let explicit = router
        .holons_near_me(10.0, 10.0, 500.0, HolonType::All, &CallOptions::on(ProviderType::MongoDb))
        .await;
    assert_eq!(explicit.kind(), Some(ErrorKind::NotSupported));

    let implicit = router.holons_near_me(10.0, 10.0, 500.0, HolonType::All, &CallOptions::new()).await;
    assert_eq!(implicit.kind(), Some(ErrorKind::NoActiveProvider));
    assert_eq!(provider.backend_calls(), 0);
}

#[tokio::test]
async fn reference_provider_answers_geo_queries_through_the_router() {
    let registry = Arc::new(ProviderRegistry::new());
    registry
        .register(Arc::new(InMemoryProvider::default()).handle())
        .await
        .expect("register");
    let router = OasisRouter::new(registry, FailoverPolicy::default());
    assert!(router.init().await.is_ok());
    let options = CallOptions::new();

    let mut nearby = Avatar::new("walker", "walker@example.com");
    nearby.location = Some(GeoPoint::new(40.7128, -74.0060).expect("point"));
    let mut distant = Avatar::new("flyer", "flyer@example.com");
    distant.location = Some(GeoPoint::new(34.0522, -118.2437).expect("point"));
    assert!(router.save_avatar(&nearby, &options).await.is_ok());
    assert!(router.save_avatar(&distant, &options).await.is_ok());

    let found = router.avatars_near_me(40.7130, -74.0055, 2_000.0, &options).await;
    let found = found.into_value().expect("avatars");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "walker");
    assert_eq!(found[0].provider_keys.get(&ProviderType::InMemory), Some(&nearby.id.to_string()));
}
