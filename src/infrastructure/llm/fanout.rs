//! Concurrent fan-out across multiple model configurations

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::llm::{Message, ModelConfig, ModelInvocationResult, ModelInvoker};

/// Outcome of one target in a comparison fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareOutcome {
    /// Model name as requested, before alias resolution
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ModelInvocationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Invoke the same messages against every config concurrently.
///
/// Always returns one outcome per config, in config order. A failing
/// target never aborts the others.
pub async fn invoke_all(
    invoker: &dyn ModelInvoker,
    configs: &[ModelConfig],
    messages: &[Message],
) -> Vec<CompareOutcome> {
    let futures = configs
        .iter()
        .map(|config| async move {
            match invoker.invoke(config, messages).await {
                Ok(result) => CompareOutcome {
                    model: config.model.clone(),
                    result: Some(result),
                    error: None,
                },
                Err(e) => {
                    warn!("Fan-out target '{}' failed: {}", config.model, e);
                    CompareOutcome {
                        model: config.model.clone(),
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect::<Vec<_>>();

    join_all(futures).await
}
