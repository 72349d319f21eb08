//! Guardrail check entry point

use std::sync::Arc;

use tracing::{info, warn};

use super::cache::PolicyCache;
use super::detector::{GuardrailVerdict, PiiDetector};
use crate::domain::error::DomainError;

/// Applies the active policy to inbound text
#[derive(Debug)]
pub struct GuardrailEngine {
    cache: Arc<PolicyCache>,
    detector: PiiDetector,
}

impl GuardrailEngine {
    pub fn new(cache: Arc<PolicyCache>) -> Self {
        Self {
            cache,
            detector: PiiDetector::new(),
        }
    }

    /// Evaluate `text` against the active policy.
    pub async fn check(&self, text: &str) -> GuardrailVerdict {
        let policy = self.cache.get(false).await;
        let verdict = self.detector.enforce(&policy, text);

        match &verdict {
            GuardrailVerdict::Blocked { categories } => {
                info!("Input blocked by policy '{}': {:?}", policy.name(), categories);
            }
            GuardrailVerdict::Warned { categories } => {
                warn!("PII detected under warn policy '{}': {:?}", policy.name(), categories);
            }
            _ => {}
        }

        verdict
    }

    /// Evaluate `text` and return the content safe to forward, erring when
    /// the policy blocks it.
    pub async fn sanitize(&self, text: &str) -> Result<String, DomainError> {
        match self.check(text).await {
            GuardrailVerdict::Clean => Ok(text.to_string()),
            GuardrailVerdict::Redacted { text, .. } => Ok(text),
            GuardrailVerdict::Warned { .. } => Ok(text.to_string()),
            GuardrailVerdict::Blocked { categories } => Err(DomainError::blocked(
                categories.iter().map(|c| c.name().to_string()).collect(),
            )),
        }
    }
}
