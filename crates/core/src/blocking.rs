//! Synchronous entry points for callers without an async runtime.
//!
//! Each method blocks once, at this boundary, on the async implementation.
//! The outer `anyhow::Result` only reports that no runtime could be used; the
//! operation outcome is always in the inner envelope.

use crate::failover::CallOptions;
use crate::router::OasisRouter;
use oasis_types::{
    Avatar, AvatarKey, Holon, HolonKey, HolonType, LoadOptions, OasisResult, ProviderType, SearchParams, SearchResults,
};
use oasis_util::block_on_future;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BlockingRouter {
    inner: Arc<OasisRouter>,
    options: CallOptions,
}

impl BlockingRouter {
    pub fn new(inner: Arc<OasisRouter>) -> Self {
        Self {
            inner,
            options: CallOptions::default(),
        }
    }

    /// Apply `options` to every call made through this handle.
    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn router(&self) -> &Arc<OasisRouter> {
        &self.inner
    }

    pub fn activate(&self, provider: ProviderType) -> anyhow::Result<OasisResult<bool>> {
        block_on_future(self.inner.activate(provider))
    }

    pub fn deactivate(&self, provider: ProviderType) -> anyhow::Result<OasisResult<bool>> {
        block_on_future(self.inner.deactivate(provider))
    }

    pub fn init(&self) -> anyhow::Result<OasisResult<usize>> {
        block_on_future(self.inner.init())
    }

    pub fn shutdown(&self) -> anyhow::Result<OasisResult<usize>> {
        block_on_future(self.inner.shutdown())
    }

    pub fn load_avatar(&self, key: &AvatarKey, version: u32) -> anyhow::Result<OasisResult<Avatar>> {
        block_on_future(self.inner.load_avatar(key, version, &self.options))
    }

    pub fn save_avatar(&self, avatar: &Avatar) -> anyhow::Result<OasisResult<Avatar>> {
        block_on_future(self.inner.save_avatar(avatar, &self.options))
    }

    pub fn delete_avatar(&self, key: &AvatarKey, soft_delete: bool) -> anyhow::Result<OasisResult<bool>> {
        block_on_future(self.inner.delete_avatar(key, soft_delete, &self.options))
    }

    pub fn load_holon(&self, key: &HolonKey, load: &LoadOptions) -> anyhow::Result<OasisResult<Holon>> {
        block_on_future(self.inner.load_holon(key, load, &self.options))
    }

    pub fn load_all_holons(&self, holon_type: HolonType, load: &LoadOptions) -> anyhow::Result<OasisResult<Vec<Holon>>> {
        block_on_future(self.inner.load_all_holons(holon_type, load, &self.options))
    }

    pub fn save_holon(&self, holon: &Holon) -> anyhow::Result<OasisResult<Holon>> {
        block_on_future(self.inner.save_holon(holon, &self.options))
    }

    pub fn delete_holon(&self, key: &HolonKey, soft_delete: bool) -> anyhow::Result<OasisResult<bool>> {
        block_on_future(self.inner.delete_holon(key, soft_delete, &self.options))
    }

    pub fn search(&self, params: &SearchParams, load: &LoadOptions) -> anyhow::Result<OasisResult<SearchResults>> {
        block_on_future(self.inner.search(params, load, &self.options))
    }
}
