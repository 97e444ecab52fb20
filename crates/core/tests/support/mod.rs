//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use oasis_core::{ActivationContext, LedgerProvider, OasisProvider, ProviderHandle, RetryPolicy, StorageProvider};
use oasis_types::{
    Holon, HolonKey, HolonType, LoadOptions, OasisError, OasisResult, ProviderType, TransactionReceipt,
    TransactionRequest,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

/// What a scripted operation does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(OasisError),
    /// Fail the first `n` calls, then succeed.
    FailTimes(usize, OasisError),
    Delay(Duration),
    Hang,
    Panic(&'static str),
}

/// Order in which providers were called, shared between doubles.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(ProviderType, String)>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, provider: ProviderType, operation: &str) {
        self.0.lock().expect("call log lock").push((provider, operation.to_string()));
    }

    /// Providers that received `operation`, in call order.
    pub fn providers_for(&self, operation: &str) -> Vec<ProviderType> {
        self.0
            .lock()
            .expect("call log lock")
            .iter()
            .filter(|(_, called)| called == operation)
            .map(|(provider, _)| *provider)
            .collect()
    }
}

/// Provider whose every operation follows a script and is counted.
#[derive(Debug)]
pub struct ScriptedProvider {
    provider_type: ProviderType,
    dependencies: Vec<ProviderType>,
    retry: RetryPolicy,
    log: CallLog,
    behaviors: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<HashMap<String, usize>>,
    holons: Mutex<HashMap<Uuid, Holon>>,
    active: AtomicBool,
}

impl ScriptedProvider {
    pub fn new(provider_type: ProviderType, log: &CallLog) -> Self {
        Self {
            provider_type,
            dependencies: Vec::new(),
            retry: RetryPolicy::none(),
            log: log.clone(),
            behaviors: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            holons: Mutex::new(HashMap::new()),
            active: AtomicBool::new(false),
        }
    }

    pub fn depends_on(mut self, dependencies: impl IntoIterator<Item = ProviderType>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    pub fn retrying(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Script `operation` ("activate", "deactivate", "load_holon", ...).
    pub fn on(self, operation: &str, behavior: Behavior) -> Self {
        self.set(operation, behavior);
        self
    }

    pub fn set(&self, operation: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .expect("behaviors lock")
            .insert(operation.to_string(), behavior);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().expect("calls lock").get(operation).copied().unwrap_or(0)
    }

    /// Calls that reached the backend, lifecycle excluded.
    pub fn backend_calls(&self) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(operation, _)| operation.as_str() != "activate" && operation.as_str() != "deactivate")
            .map(|(_, count)| count)
            .sum()
    }

    /// Put a holon straight into the backing map.
    pub fn seed(&self, holon: Holon) {
        self.holons.lock().expect("holons lock").insert(holon.id, holon);
    }

    pub fn stored(&self, id: Uuid) -> Option<Holon> {
        self.holons.lock().expect("holons lock").get(&id).cloned()
    }

    pub fn is_backend_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Storage and ledger capabilities; no network or asset support.
    pub fn handle(self: Arc<Self>) -> ProviderHandle {
        ProviderHandle::new(Arc::clone(&self))
            .with_storage(Arc::clone(&self))
            .with_ledger(self)
    }

    pub fn storage_only(self: Arc<Self>) -> ProviderHandle {
        ProviderHandle::new(Arc::clone(&self)).with_storage(self)
    }

    async fn perform(&self, operation: &str) -> Result<(), OasisError> {
        let count = {
            let mut calls = self.calls.lock().expect("calls lock");
            let count = calls.entry(operation.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        self.log.push(self.provider_type, operation);

        let behavior = self
            .behaviors
            .lock()
            .expect("behaviors lock")
            .get(operation)
            .cloned()
            .unwrap_or(Behavior::Succeed);
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(error) => Err(error),
            Behavior::FailTimes(times, error) if count <= times => Err(error),
            Behavior::FailTimes(..) => Ok(()),
            Behavior::Delay(delay) => {
                sleep(delay).await;
                Ok(())
            }
            Behavior::Hang => {
                sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            Behavior::Panic(message) => panic!("{message}"),
        }
    }
}

#[async_trait]
impl OasisProvider for ScriptedProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    fn dependencies(&self) -> Vec<ProviderType> {
        self.dependencies.clone()
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn is_activated(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn activate(&self, context: &ActivationContext) -> OasisResult<bool> {
        if let Err(error) = self.perform("activate").await {
            return OasisResult::err(error);
        }
        for dependency in &self.dependencies {
            if context.dependency(*dependency).is_none() {
                return OasisResult::err(OasisError::activation_failed(self.provider_type, format!("{dependency} missing from context")));
            }
        }
        self.active.store(true, Ordering::SeqCst);
        OasisResult::ok(true)
    }

    async fn deactivate(&self) -> OasisResult<bool> {
        self.active.store(false, Ordering::SeqCst);
        self.perform("deactivate").await.map(|_| true).into()
    }
}

#[async_trait]
impl StorageProvider for ScriptedProvider {
    async fn load_holon(&self, key: &HolonKey, _options: &LoadOptions) -> OasisResult<Holon> {
        if let Err(error) = self.perform("load_holon").await {
            return OasisResult::err(error);
        }
        let holons = self.holons.lock().expect("holons lock");
        holons
            .values()
            .find(|holon| key.matches(holon, self.provider_type))
            .cloned()
            .ok_or_else(|| OasisError::not_found(key.to_string()))
            .into()
    }

    async fn load_all_holons(&self, holon_type: HolonType, _options: &LoadOptions) -> OasisResult<Vec<Holon>> {
        if let Err(error) = self.perform("load_all_holons").await {
            return OasisResult::err(error);
        }
        let holons = self.holons.lock().expect("holons lock");
        OasisResult::ok(holons.values().filter(|holon| holon_type.matches(holon.holon_type)).cloned().collect())
    }

    async fn save_holon(&self, holon: &Holon) -> OasisResult<Holon> {
        if let Err(error) = self.perform("save_holon").await {
            return OasisResult::err(error);
        }
        self.holons.lock().expect("holons lock").insert(holon.id, holon.clone());
        OasisResult::ok(holon.clone())
    }
}

#[async_trait]
impl LedgerProvider for ScriptedProvider {
    async fn send_transaction(&self, request: &TransactionRequest) -> OasisResult<TransactionReceipt> {
        if let Err(error) = self.perform("send_transaction").await {
            return OasisResult::err(error);
        }
        OasisResult::ok(TransactionReceipt {
            transaction_hash: format!("0x{}", Uuid::new_v4().simple()),
            provider: self.provider_type,
            amount: request.amount,
            submitted_at: Utc::now(),
        })
    }
}

/// Upstream failure with a recognisable message.
pub fn upstream(message: &str) -> OasisError {
    OasisError::upstream(message)
}

/// Short budgets so hung doubles fail fast.
pub fn fast_settings() -> oasis_core::LifecycleSettings {
    oasis_core::LifecycleSettings {
        activate_timeout: Duration::from_millis(100),
        deactivate_timeout: Duration::from_millis(100),
        call_timeout: Duration::from_millis(100),
    }
}

/// Register and activate each provider, in order.
pub async fn register_active(registry: &oasis_core::ProviderRegistry, providers: &[Arc<ScriptedProvider>]) {
    for provider in providers {
        registry.register(Arc::clone(provider).handle()).await.expect("register");
        let activated = registry.activate(provider.provider_type()).await;
        assert!(activated.is_ok(), "activation failed: {}", activated.message());
    }
}
