//! In-memory policy store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::error::DomainError;
use crate::domain::guardrail::{GuardrailPolicy, PolicyStore};

/// Policy store backed by a map, keyed by policy name
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<HashMap<String, GuardrailPolicy>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, policy: GuardrailPolicy) {
        let mut guard = self.policies.write().await;
        guard.insert(policy.name().to_string(), policy);
    }

    pub async fn remove(&self, name: &str) {
        let mut guard = self.policies.write().await;
        guard.remove(name);
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn fetch(&self, name: &str) -> Result<GuardrailPolicy, DomainError> {
        let guard = self.policies.read().await;
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Policy not found: {}", name)))
    }
}
