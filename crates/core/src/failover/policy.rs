use oasis_types::ProviderType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Operation families that may carry their own failover order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationClass {
    General,
    AvatarLogin,
    CheckEmailInUse,
    CheckUsernameInUse,
}

/// Process-wide failover and replication rules.
///
/// Candidate order for a call is, first match wins: the per-call override in
/// [`CallOptions`], the order configured for the operation class, the general
/// failover order, and finally registration order. An empty list means "not
/// configured".
#[derive(Debug, Clone, PartialEq)]
pub struct FailoverPolicy {
    pub auto_failover: bool,
    pub auto_replication: bool,
    pub failover_order: Vec<ProviderType>,
    pub replication_providers: Vec<ProviderType>,
    pub class_orders: HashMap<OperationClass, Vec<ProviderType>>,
}

impl Default for FailoverPolicy {
    fn default() -> Self {
        Self {
            auto_failover: true,
            auto_replication: false,
            failover_order: Vec::new(),
            replication_providers: Vec::new(),
            class_orders: HashMap::new(),
        }
    }
}

impl FailoverPolicy {
    pub fn with_failover_order(mut self, order: impl IntoIterator<Item = ProviderType>) -> Self {
        self.failover_order = order.into_iter().collect();
        self
    }

    /// Enable replication to `mirrors`.
    pub fn with_replication(mut self, mirrors: impl IntoIterator<Item = ProviderType>) -> Self {
        self.auto_replication = true;
        self.replication_providers = mirrors.into_iter().collect();
        self
    }

    pub fn with_class_order(mut self, class: OperationClass, order: impl IntoIterator<Item = ProviderType>) -> Self {
        self.class_orders.insert(class, order.into_iter().collect());
        self
    }

    pub fn without_failover(mut self) -> Self {
        self.auto_failover = false;
        self
    }

    /// Failover order configured for `class`; `General` is the default order.
    pub fn order(&self, class: OperationClass) -> &[ProviderType] {
        match class {
            OperationClass::General => &self.failover_order,
            other => self.class_orders.get(&other).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    /// Replace the failover order for `class`. An empty order clears a class
    /// override so the general order applies again.
    pub fn set_order(&mut self, class: OperationClass, order: Vec<ProviderType>) {
        match class {
            OperationClass::General => self.failover_order = order,
            other if order.is_empty() => {
                self.class_orders.remove(&other);
            }
            other => {
                self.class_orders.insert(other, order);
            }
        }
    }

    /// Append `providers` to the order for `class`, or remove them from it.
    pub fn include_in_order(&mut self, class: OperationClass, providers: &[ProviderType], include: bool) {
        let mut order = self.order(class).to_vec();
        merge_membership(&mut order, providers, include);
        self.set_order(class, order);
    }

    /// Append `providers` to the replication list, or remove them from it.
    pub fn include_in_replication(&mut self, providers: &[ProviderType], include: bool) {
        merge_membership(&mut self.replication_providers, providers, include);
    }

    /// Configured order for `class`, if any, before registration order applies.
    pub fn configured_order(&self, class: OperationClass, options: &CallOptions) -> Option<Vec<ProviderType>> {
        if let Some(order) = &options.providers {
            return Some(order.clone());
        }
        if let Some(order) = self.class_orders.get(&class)
            && !order.is_empty()
        {
            return Some(order.clone());
        }
        if !self.failover_order.is_empty() {
            return Some(self.failover_order.clone());
        }
        None
    }

    pub fn failover_enabled(&self, options: &CallOptions) -> bool {
        options.auto_failover.unwrap_or(self.auto_failover)
    }

    pub fn replication_enabled(&self, options: &CallOptions) -> bool {
        options.auto_replication.unwrap_or(self.auto_replication)
    }

    /// Mirror targets for a write whose primary was `primary`.
    pub fn mirrors_for(&self, primary: ProviderType, options: &CallOptions) -> Vec<ProviderType> {
        let configured = options.mirrors.as_ref().unwrap_or(&self.replication_providers);
        let mut mirrors = Vec::new();
        for provider in configured.iter().copied() {
            if provider != primary && !mirrors.contains(&provider) {
                mirrors.push(provider);
            }
        }
        mirrors
    }
}

fn merge_membership(list: &mut Vec<ProviderType>, providers: &[ProviderType], include: bool) {
    if include {
        for provider in providers {
            if !list.contains(provider) {
                list.push(*provider);
            }
        }
    } else {
        list.retain(|provider| !providers.contains(provider));
    }
}

/// Per-call overrides of the process-wide policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    /// Explicit candidate order. Providers named here are attempted even when
    /// inactive, so the caller sees their "not activated" result.
    pub providers: Option<Vec<ProviderType>>,
    pub mirrors: Option<Vec<ProviderType>>,
    pub auto_failover: Option<bool>,
    pub auto_replication: Option<bool>,
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a single provider with no failover.
    pub fn on(provider: ProviderType) -> Self {
        Self {
            providers: Some(vec![provider]),
            auto_failover: Some(false),
            ..Self::default()
        }
    }

    pub fn prefer(mut self, providers: impl IntoIterator<Item = ProviderType>) -> Self {
        self.providers = Some(providers.into_iter().collect());
        self
    }

    pub fn mirror_to(mut self, mirrors: impl IntoIterator<Item = ProviderType>) -> Self {
        self.mirrors = Some(mirrors.into_iter().collect());
        self.auto_replication = Some(true);
        self
    }

    pub fn auto_failover(mut self, enabled: bool) -> Self {
        self.auto_failover = Some(enabled);
        self
    }

    pub fn auto_replication(mut self, enabled: bool) -> Self {
        self.auto_replication = Some(enabled);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_call_order_beats_class_and_general_order() {
        let policy = FailoverPolicy::default()
            .with_failover_order([ProviderType::MongoDb, ProviderType::Neo4j])
            .with_class_order(OperationClass::AvatarLogin, [ProviderType::SqliteDb]);

        let general = policy.configured_order(OperationClass::General, &CallOptions::new());
        assert_eq!(general, Some(vec![ProviderType::MongoDb, ProviderType::Neo4j]));

        let login = policy.configured_order(OperationClass::AvatarLogin, &CallOptions::new());
        assert_eq!(login, Some(vec![ProviderType::SqliteDb]));

        let explicit = policy.configured_order(OperationClass::AvatarLogin, &CallOptions::new().prefer([ProviderType::Ipfs]));
        assert_eq!(explicit, Some(vec![ProviderType::Ipfs]));

        assert_eq!(FailoverPolicy::default().configured_order(OperationClass::General, &CallOptions::new()), None);
    }

    #[test]
    fn mirrors_exclude_primary_and_duplicates() {
        let policy = FailoverPolicy::default().with_replication([
            ProviderType::MongoDb,
            ProviderType::Ipfs,
            ProviderType::Ipfs,
            ProviderType::Neo4j,
        ]);
        assert_eq!(
            policy.mirrors_for(ProviderType::MongoDb, &CallOptions::new()),
            vec![ProviderType::Ipfs, ProviderType::Neo4j]
        );
        let options = CallOptions::new().mirror_to([ProviderType::Pinata]);
        assert_eq!(policy.mirrors_for(ProviderType::MongoDb, &options), vec![ProviderType::Pinata]);
    }

    #[test]
    fn call_options_override_switches() {
        let policy = FailoverPolicy::default();
        assert!(policy.failover_enabled(&CallOptions::new()));
        assert!(!policy.failover_enabled(&CallOptions::on(ProviderType::MongoDb)));
        assert!(!policy.replication_enabled(&CallOptions::new()));
        assert!(policy.replication_enabled(&CallOptions::new().auto_replication(true)));
    }

    #[test]
    fn orders_are_edited_per_class() {
        let mut policy = FailoverPolicy::default().with_failover_order([ProviderType::MongoDb]);

        policy.include_in_order(OperationClass::General, &[ProviderType::Neo4j, ProviderType::MongoDb], true);
        assert_eq!(policy.order(OperationClass::General), [ProviderType::MongoDb, ProviderType::Neo4j]);

        policy.include_in_order(OperationClass::AvatarLogin, &[ProviderType::SqliteDb], true);
        assert_eq!(policy.order(OperationClass::AvatarLogin), [ProviderType::SqliteDb]);

        policy.include_in_order(OperationClass::AvatarLogin, &[ProviderType::SqliteDb], false);
        assert!(policy.order(OperationClass::AvatarLogin).is_empty());
        assert!(!policy.class_orders.contains_key(&OperationClass::AvatarLogin));

        policy.include_in_replication(&[ProviderType::Ipfs, ProviderType::Ipfs], true);
        assert_eq!(policy.replication_providers, vec![ProviderType::Ipfs]);
    }
}
