//! In-process reference provider.
//!
//! Keeps avatars and holons in insertion-ordered maps and answers geo queries
//! from a latitude-sorted index that is built on first use and dropped
//! whenever the data changes or the provider deactivates.

use crate::contract::{ActivationContext, NetworkProvider, OasisProvider, OwnedResource, ProviderHandle, StorageProvider};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use oasis_types::{
    Avatar, AvatarKey, GeoPoint, Holon, HolonKey, HolonType, LoadOptions, MetaDataQuery, OasisError, OasisResult,
    ProviderType, SearchParams, SearchResults,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug, Default)]
struct Store {
    avatars: IndexMap<Uuid, Avatar>,
    holons: IndexMap<Uuid, Holon>,
}

/// Entity ids sorted by latitude, for radius queries.
#[derive(Debug, Default)]
struct GeoIndex {
    avatars: Vec<(GeoPoint, Uuid)>,
    holons: Vec<(GeoPoint, Uuid)>,
}

impl GeoIndex {
    fn build(store: &Store) -> Self {
        let mut avatars: Vec<(GeoPoint, Uuid)> = store
            .avatars
            .values()
            .filter(|avatar| !avatar.is_deleted())
            .filter_map(|avatar| avatar.location.map(|point| (point, avatar.id)))
            .collect();
        let mut holons: Vec<(GeoPoint, Uuid)> = store
            .holons
            .values()
            .filter(|holon| !holon.is_deleted())
            .filter_map(|holon| holon.location.map(|point| (point, holon.id)))
            .collect();
        avatars.sort_by(|a, b| a.0.latitude.total_cmp(&b.0.latitude));
        holons.sort_by(|a, b| a.0.latitude.total_cmp(&b.0.latitude));
        Self { avatars, holons }
    }

    /// Ids within `radius_meters` of `center`, nearest first.
    fn within(points: &[(GeoPoint, Uuid)], center: GeoPoint, radius_meters: f64) -> Vec<Uuid> {
        let band = radius_meters / METERS_PER_DEGREE;
        let start = points.partition_point(|(point, _)| point.latitude < center.latitude - band);
        let mut hits: Vec<(f64, Uuid)> = points[start..]
            .iter()
            .take_while(|(point, _)| point.latitude <= center.latitude + band)
            .map(|(point, id)| (center.distance_meters(point), *id))
            .filter(|(distance, _)| *distance <= radius_meters)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, id)| id).collect()
    }
}

/// Storage and geo provider backed by process memory.
#[derive(Debug)]
pub struct InMemoryProvider {
    provider_type: ProviderType,
    active: AtomicBool,
    store: RwLock<Store>,
    geo_index: OwnedResource<GeoIndex>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new(ProviderType::InMemory)
    }
}

impl InMemoryProvider {
    /// A provider registered under `provider_type`, which lets several
    /// in-memory stores stand in for different backends.
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            active: AtomicBool::new(false),
            store: RwLock::new(Store::default()),
            geo_index: OwnedResource::new(),
        }
    }

    /// Handle exposing the storage and network capabilities.
    pub fn handle(self: Arc<Self>) -> ProviderHandle {
        ProviderHandle::new(Arc::clone(&self))
            .with_storage(Arc::clone(&self))
            .with_network(self)
    }

    pub async fn avatar_count(&self) -> usize {
        self.store.read().await.avatars.len()
    }

    pub async fn holon_count(&self) -> usize {
        self.store.read().await.holons.len()
    }

    fn ensure_active(&self) -> Result<(), OasisError> {
        if self.is_activated() {
            Ok(())
        } else {
            Err(OasisError::not_activated(self.provider_type))
        }
    }

    async fn geo_index(&self) -> Result<Arc<GeoIndex>, OasisError> {
        self.geo_index
            .get_or_try_init(|| async {
                let store = self.store.read().await;
                debug!(provider = %self.provider_type, avatars = store.avatars.len(), holons = store.holons.len(), "building geo index");
                Ok::<_, OasisError>(GeoIndex::build(&store))
            })
            .await
    }

    /// Called after the store lock is released, never while holding it.
    async fn data_changed(&self) {
        self.geo_index.invalidate().await;
    }

    fn find_avatar<'a>(&self, store: &'a Store, key: &AvatarKey) -> Result<&'a Avatar, OasisError> {
        store
            .avatars
            .values()
            .find(|avatar| !avatar.is_deleted() && key.matches(avatar, self.provider_type))
            .ok_or_else(|| OasisError::not_found(key.to_string()))
    }

    fn find_holon<'a>(&self, store: &'a Store, key: &HolonKey) -> Result<&'a Holon, OasisError> {
        store
            .holons
            .values()
            .find(|holon| !holon.is_deleted() && key.matches(holon, self.provider_type))
            .ok_or_else(|| OasisError::not_found(key.to_string()))
    }

    fn upsert_avatar(&self, store: &mut Store, avatar: &Avatar) -> Result<Avatar, OasisError> {
        avatar.validate()?;
        let taken = store.avatars.values().find(|other| {
            other.id != avatar.id
                && !other.is_deleted()
                && (other.username == avatar.username || other.email.eq_ignore_ascii_case(&avatar.email))
        });
        if let Some(other) = taken {
            let field = if other.username == avatar.username {
                format!("username {}", avatar.username)
            } else {
                format!("email {}", avatar.email)
            };
            return Err(OasisError::validation(format!("{field} is already in use")));
        }

        let mut saved = avatar.clone();
        saved.modified_date = Utc::now();
        match store.avatars.get(&avatar.id) {
            Some(existing) => {
                saved.created_date = existing.created_date;
                saved.version = existing.version + 1;
            }
            None => saved.version = saved.version.max(1),
        }
        saved
            .provider_keys
            .entry(self.provider_type)
            .or_insert_with(|| avatar.id.to_string());
        store.avatars.insert(saved.id, saved.clone());
        Ok(saved)
    }

    /// Store `holon` and any children it carries, which are re-parented onto it.
    /// The tree must already have passed [`Holon::validate`], so nothing is
    /// half written.
    fn upsert_holon(&self, store: &mut Store, holon: &Holon) -> Holon {
        let mut saved = holon.clone();
        let children = std::mem::take(&mut saved.children);
        saved.modified_date = Utc::now();
        match store.holons.get(&holon.id) {
            Some(existing) => {
                saved.created_date = existing.created_date;
                saved.version = existing.version + 1;
            }
            None => saved.version = saved.version.max(1),
        }
        saved
            .provider_keys
            .entry(self.provider_type)
            .or_insert_with(|| holon.id.to_string());
        store.holons.insert(saved.id, saved.clone());

        for child in children {
            let child = child.with_parent(saved.id);
            let stored_child = self.upsert_holon(store, &child);
            saved.children.push(stored_child);
        }
        saved
    }

    fn with_children(store: &Store, holon: &Holon, options: &LoadOptions) -> Holon {
        let mut root = holon.clone();
        let mut ancestors = vec![root.id];
        attach_children(store, &mut root, options, 0, &mut ancestors);
        root
    }

    async fn delete_where(&self, soft_delete: bool, target: Uuid, avatars: bool) -> bool {
        let changed = {
            let mut store = self.store.write().await;
            if soft_delete {
                let now = Utc::now();
                let marked = if avatars {
                    store.avatars.get_mut(&target).map(|avatar| {
                        avatar.deleted_date = Some(now);
                        avatar.is_active = false;
                    })
                } else {
                    store.holons.get_mut(&target).map(|holon| {
                        holon.deleted_date = Some(now);
                        holon.is_active = false;
                    })
                };
                marked.is_some()
            } else if avatars {
                store.avatars.shift_remove(&target).is_some()
            } else {
                store.holons.shift_remove(&target).is_some()
            }
        };
        if changed {
            self.data_changed().await;
        }
        changed
    }
}

fn attach_children(store: &Store, holon: &mut Holon, options: &LoadOptions, depth: u32, ancestors: &mut Vec<Uuid>) {
    if !options.descend_below(depth) {
        return;
    }
    holon.children = store
        .holons
        .values()
        .filter(|child| child.parent_id == Some(holon.id) && !child.is_deleted() && !ancestors.contains(&child.id))
        .cloned()
        .collect();
    for child in &mut holon.children {
        ancestors.push(child.id);
        attach_children(store, child, options, depth + 1, ancestors);
        ancestors.pop();
    }
}

#[async_trait]
impl OasisProvider for InMemoryProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    fn description(&self) -> &str {
        "In-process storage for tests and local runs"
    }

    fn is_activated(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    async fn activate(&self, _context: &ActivationContext) -> OasisResult<bool> {
        self.active.store(true, Ordering::Release);
        OasisResult::ok(true)
    }

    async fn deactivate(&self) -> OasisResult<bool> {
        self.active.store(false, Ordering::Release);
        self.geo_index.invalidate().await;
        OasisResult::ok(true)
    }
}

#[async_trait]
impl StorageProvider for InMemoryProvider {
    async fn load_avatar(&self, key: &AvatarKey, _version: u32) -> OasisResult<Avatar> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        self.find_avatar(&store, key).cloned().into()
    }

    async fn load_all_avatars(&self, _version: u32) -> OasisResult<Vec<Avatar>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        OasisResult::ok(store.avatars.values().filter(|avatar| !avatar.is_deleted()).cloned().collect())
    }

    async fn save_avatar(&self, avatar: &Avatar) -> OasisResult<Avatar> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let saved = {
            let mut store = self.store.write().await;
            self.upsert_avatar(&mut store, avatar)
        };
        self.data_changed().await;
        saved.into()
    }

    async fn delete_avatar(&self, key: &AvatarKey, soft_delete: bool) -> OasisResult<bool> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let target = {
            let store = self.store.read().await;
            match self.find_avatar(&store, key) {
                Ok(avatar) => avatar.id,
                Err(error) => return error.into(),
            }
        };
        OasisResult::ok(self.delete_where(soft_delete, target, true).await)
    }

    async fn load_holon(&self, key: &HolonKey, options: &LoadOptions) -> OasisResult<Holon> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        self.find_holon(&store, key)
            .map(|holon| Self::with_children(&store, holon, options))
            .into()
    }

    async fn load_holons_for_parent(
        &self,
        parent: &HolonKey,
        holon_type: HolonType,
        options: &LoadOptions,
    ) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        let parent_id = match self.find_holon(&store, parent) {
            Ok(holon) => holon.id,
            Err(error) => return error.into(),
        };
        OasisResult::ok(
            store
                .holons
                .values()
                .filter(|holon| holon.parent_id == Some(parent_id) && !holon.is_deleted())
                .filter(|holon| holon_type.matches(holon.holon_type))
                .map(|holon| Self::with_children(&store, holon, options))
                .collect(),
        )
    }

    async fn load_holons_by_metadata(
        &self,
        query: &MetaDataQuery,
        holon_type: HolonType,
        options: &LoadOptions,
    ) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        OasisResult::ok(
            store
                .holons
                .values()
                .filter(|holon| !holon.is_deleted() && holon_type.matches(holon.holon_type))
                .filter(|holon| query.matches(&holon.metadata))
                .map(|holon| Self::with_children(&store, holon, options))
                .collect(),
        )
    }

    async fn load_all_holons(&self, holon_type: HolonType, options: &LoadOptions) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        OasisResult::ok(
            store
                .holons
                .values()
                .filter(|holon| !holon.is_deleted() && holon_type.matches(holon.holon_type))
                .map(|holon| Self::with_children(&store, holon, options))
                .collect(),
        )
    }

    async fn save_holon(&self, holon: &Holon) -> OasisResult<Holon> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        if let Err(error) = holon.validate() {
            return error.into();
        }
        let saved = {
            let mut store = self.store.write().await;
            self.upsert_holon(&mut store, holon)
        };
        self.data_changed().await;
        OasisResult::ok(saved)
    }

    async fn save_holons(&self, holons: &[Holon]) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        if let Err(error) = holons.iter().try_for_each(Holon::validate) {
            return error.into();
        }
        let saved: Vec<Holon> = {
            let mut store = self.store.write().await;
            holons.iter().map(|holon| self.upsert_holon(&mut store, holon)).collect()
        };
        self.data_changed().await;
        OasisResult::ok(saved)
    }

    async fn delete_holon(&self, key: &HolonKey, soft_delete: bool) -> OasisResult<bool> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let target = {
            let store = self.store.read().await;
            match self.find_holon(&store, key) {
                Ok(holon) => holon.id,
                Err(error) => return error.into(),
            }
        };
        OasisResult::ok(self.delete_where(soft_delete, target, false).await)
    }

    async fn search(&self, params: &SearchParams, options: &LoadOptions) -> OasisResult<SearchResults> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        let holons = store
            .holons
            .values()
            .filter(|holon| !holon.is_deleted() && params.matches(holon))
            .map(|holon| Self::with_children(&store, holon, options))
            .collect();
        OasisResult::ok(SearchResults::new(holons))
    }

    async fn import(&self, holons: &[Holon]) -> OasisResult<bool> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        if let Err(error) = holons.iter().try_for_each(Holon::validate) {
            return error.into();
        }
        {
            let mut store = self.store.write().await;
            for holon in holons {
                self.upsert_holon(&mut store, holon);
            }
        }
        self.data_changed().await;
        OasisResult::ok(true)
    }

    async fn export_all_data_for_avatar(&self, avatar: &AvatarKey, _version: u32) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        let avatar_id = match self.find_avatar(&store, avatar) {
            Ok(found) => found.id,
            Err(error) => return error.into(),
        };
        OasisResult::ok(
            store
                .holons
                .values()
                .filter(|holon| holon.created_by_avatar_id == Some(avatar_id))
                .cloned()
                .collect(),
        )
    }

    async fn export_all(&self, _version: u32) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let store = self.store.read().await;
        OasisResult::ok(store.holons.values().cloned().collect())
    }
}

#[async_trait]
impl NetworkProvider for InMemoryProvider {
    async fn avatars_near_me(&self, center: GeoPoint, radius_meters: f64) -> OasisResult<Vec<Avatar>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let index = match self.geo_index().await {
            Ok(index) => index,
            Err(error) => return error.into(),
        };
        let ids = GeoIndex::within(&index.avatars, center, radius_meters);
        let store = self.store.read().await;
        OasisResult::ok(ids.iter().filter_map(|id| store.avatars.get(id)).cloned().collect())
    }

    async fn holons_near_me(&self, center: GeoPoint, radius_meters: f64, holon_type: HolonType) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.ensure_active() {
            return error.into();
        }
        let index = match self.geo_index().await {
            Ok(index) => index,
            Err(error) => return error.into(),
        };
        let ids = GeoIndex::within(&index.holons, center, radius_meters);
        let store = self.store.read().await;
        OasisResult::ok(
            ids.iter()
                .filter_map(|id| store.holons.get(id))
                .filter(|holon| holon_type.matches(holon.holon_type))
                .cloned()
                .collect(),
        )
    }
}
