//! Policy store trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::policy::GuardrailPolicy;
use crate::domain::error::DomainError;

/// Source of named guardrail policies
#[async_trait]
pub trait PolicyStore: Send + Sync + Debug {
    /// Fetch the policy with the given name.
    async fn fetch(&self, name: &str) -> Result<GuardrailPolicy, DomainError>;
}
