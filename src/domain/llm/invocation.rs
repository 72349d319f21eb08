//! Model invocation trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::message::Message;
use crate::domain::error::DomainError;

/// Parameters for a single model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model alias or backend identifier
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Completed model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInvocationResult {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Backend model id the call actually ran against
    pub resolved_model_id: String,
}

impl ModelInvocationResult {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Executes chat completions against a model backend
#[async_trait]
pub trait ModelInvoker: Send + Sync + Debug {
    async fn invoke(
        &self,
        config: &ModelConfig,
        messages: &[Message],
    ) -> Result<ModelInvocationResult, DomainError>;

    fn invoker_name(&self) -> &'static str;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new("gpt-4o")
            .with_temperature(0.2)
            .with_max_tokens(512);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_tokens, Some(512));
    }

    #[test]
    fn test_config_serialization_skips_unset_fields() {
        let json = serde_json::to_string(&ModelConfig::new("gpt-4o")).unwrap();
        assert_eq!(json, r#"{"model":"gpt-4o"}"#);
    }

    #[test]
    fn test_total_tokens() {
        let result = ModelInvocationResult {
            content: "ok".to_string(),
            input_tokens: 12,
            output_tokens: 30,
            resolved_model_id: "gpt-4o".to_string(),
        };

        assert_eq!(result.total_tokens(), 42);
    }
}
