use super::OasisProvider;
use async_trait::async_trait;
use oasis_types::{
    AssetReceipt, Avatar, AvatarKey, GeoPoint, Holon, HolonKey, HolonType, LoadOptions, MetaDataQuery, MintAssetRequest,
    OasisError, OasisResult, OnChainAsset, SearchParams, SearchResults, SendAssetRequest, TransactionReceipt,
    TransactionRequest,
};
use uuid::Uuid;

/// Default body for an operation the adapter does not implement. An inactive
/// adapter reports that first.
fn not_supported<T, P: OasisProvider + ?Sized>(provider: &P, operation: &str) -> OasisResult<T> {
    if !provider.is_activated() {
        return OasisResult::err(OasisError::not_activated(provider.provider_type()));
    }
    OasisResult::err(OasisError::not_supported(provider.provider_type(), operation))
}

/// Avatar and holon persistence.
///
/// Saves are upserts keyed by id; avatars are additionally unique per username
/// and email within one provider.
#[async_trait]
pub trait StorageProvider: OasisProvider {
    async fn load_avatar(&self, _key: &AvatarKey, _version: u32) -> OasisResult<Avatar> {
        not_supported(self, "load_avatar")
    }

    async fn load_all_avatars(&self, _version: u32) -> OasisResult<Vec<Avatar>> {
        not_supported(self, "load_all_avatars")
    }

    async fn save_avatar(&self, _avatar: &Avatar) -> OasisResult<Avatar> {
        not_supported(self, "save_avatar")
    }

    async fn delete_avatar(&self, _key: &AvatarKey, _soft_delete: bool) -> OasisResult<bool> {
        not_supported(self, "delete_avatar")
    }

    async fn load_holon(&self, _key: &HolonKey, _options: &LoadOptions) -> OasisResult<Holon> {
        not_supported(self, "load_holon")
    }

    async fn load_holons_for_parent(
        &self,
        _parent: &HolonKey,
        _holon_type: HolonType,
        _options: &LoadOptions,
    ) -> OasisResult<Vec<Holon>> {
        not_supported(self, "load_holons_for_parent")
    }

    async fn load_holons_by_metadata(
        &self,
        _query: &MetaDataQuery,
        _holon_type: HolonType,
        _options: &LoadOptions,
    ) -> OasisResult<Vec<Holon>> {
        not_supported(self, "load_holons_by_metadata")
    }

    async fn load_all_holons(&self, _holon_type: HolonType, _options: &LoadOptions) -> OasisResult<Vec<Holon>> {
        not_supported(self, "load_all_holons")
    }

    async fn save_holon(&self, _holon: &Holon) -> OasisResult<Holon> {
        not_supported(self, "save_holon")
    }

    async fn save_holons(&self, _holons: &[Holon]) -> OasisResult<Vec<Holon>> {
        not_supported(self, "save_holons")
    }

    async fn delete_holon(&self, _key: &HolonKey, _soft_delete: bool) -> OasisResult<bool> {
        not_supported(self, "delete_holon")
    }

    async fn search(&self, _params: &SearchParams, _options: &LoadOptions) -> OasisResult<SearchResults> {
        not_supported(self, "search")
    }

    async fn import(&self, _holons: &[Holon]) -> OasisResult<bool> {
        not_supported(self, "import")
    }

    async fn export_all_data_for_avatar(&self, _avatar: &AvatarKey, _version: u32) -> OasisResult<Vec<Holon>> {
        not_supported(self, "export_all_data_for_avatar")
    }

    async fn export_all(&self, _version: u32) -> OasisResult<Vec<Holon>> {
        not_supported(self, "export_all")
    }
}

/// Geo queries.
#[async_trait]
pub trait NetworkProvider: OasisProvider {
    async fn avatars_near_me(&self, _center: GeoPoint, _radius_meters: f64) -> OasisResult<Vec<Avatar>> {
        not_supported(self, "avatars_near_me")
    }

    async fn holons_near_me(
        &self,
        _center: GeoPoint,
        _radius_meters: f64,
        _holon_type: HolonType,
    ) -> OasisResult<Vec<Holon>> {
        not_supported(self, "holons_near_me")
    }
}

/// Value transfer.
#[async_trait]
pub trait LedgerProvider: OasisProvider {
    async fn send_transaction(&self, _request: &TransactionRequest) -> OasisResult<TransactionReceipt> {
        not_supported(self, "send_transaction")
    }

    /// Transfer between the default wallets of two avatars.
    async fn send_transaction_by_default_wallet(
        &self,
        _from_avatar: Uuid,
        _to_avatar: Uuid,
        _amount: u64,
    ) -> OasisResult<TransactionReceipt> {
        not_supported(self, "send_transaction_by_default_wallet")
    }
}

/// NFT operations.
#[async_trait]
pub trait AssetProvider: OasisProvider {
    async fn mint_asset(&self, _request: &MintAssetRequest) -> OasisResult<AssetReceipt> {
        not_supported(self, "mint_asset")
    }

    async fn send_asset(&self, _request: &SendAssetRequest) -> OasisResult<AssetReceipt> {
        not_supported(self, "send_asset")
    }

    async fn load_on_chain_asset_data(&self, _token_address: &str) -> OasisResult<OnChainAsset> {
        not_supported(self, "load_on_chain_asset_data")
    }
}
