//! Chat completion client for the model gateway
//!
//! Speaks the OpenAI-compatible `/v1/chat/completions` shape. Model names
//! are resolved through the alias table before the request is built, and
//! the backend id reported by the gateway is echoed back on the result.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::error::DomainError;
use crate::domain::llm::{Message, ModelConfig, ModelInvocationResult, ModelInvoker, ModelResolver};

#[derive(Debug)]
pub struct ChatGatewayClient<C: HttpClientTrait> {
    client: C,
    base_url: String,
    auth_header: Option<String>,
    resolver: ModelResolver,
}

impl<C: HttpClientTrait> ChatGatewayClient<C> {
    pub fn new(client: C, base_url: impl Into<String>, resolver: ModelResolver) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth_header: None,
            resolver,
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.auth_header = Some(format!("Bearer {}", api_key));
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl<C: HttpClientTrait> ModelInvoker for ChatGatewayClient<C> {
    async fn invoke(
        &self,
        config: &ModelConfig,
        messages: &[Message],
    ) -> Result<ModelInvocationResult, DomainError> {
        let resolved_model = self.resolver.resolve(&config.model);

        let mut body = json!({
            "model": resolved_model,
            "messages": messages,
        });
        if let Some(temperature) = config.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let mut headers = Vec::new();
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        debug!("Invoking model '{}' via gateway", resolved_model);

        let response = self
            .client
            .post_json(&self.completions_url(), headers, &body)
            .await?;

        parse_completion(&response)
    }

    fn invoker_name(&self) -> &'static str {
        "chat_gateway"
    }
}

fn parse_completion(response: &serde_json::Value) -> Result<ModelInvocationResult, DomainError> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            DomainError::upstream(
                None,
                "Completion response has no message content",
                "verify the model id and gateway availability",
            )
        })?
        .to_string();

    let input_tokens = response["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32;
    let output_tokens = response["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32;

    let resolved_model_id = response["model"].as_str().unwrap_or_default().to_string();

    Ok(ModelInvocationResult {
        content,
        input_tokens,
        output_tokens,
        resolved_model_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use serde_json::json;

    const URL: &str = "http://gateway/v1/chat/completions";

    fn completion_response() -> serde_json::Value {
        json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "hello there"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5}
        })
    }

    #[tokio::test]
    async fn test_invoke_parses_completion() {
        let client = MockHttpClient::new().with_response(URL, completion_response());
        let gateway =
            ChatGatewayClient::new(client, "http://gateway", ModelResolver::with_default_aliases());

        let result = gateway
            .invoke(&ModelConfig::new("fast"), &[Message::user("hi")])
            .await
            .unwrap();

        assert_eq!(result.content, "hello there");
        assert_eq!(result.input_tokens, 12);
        assert_eq!(result.output_tokens, 5);
        assert_eq!(result.resolved_model_id, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_invoke_resolves_alias_in_request() {
        let client = MockHttpClient::new().with_response(URL, completion_response());
        let gateway =
            ChatGatewayClient::new(client, "http://gateway", ModelResolver::with_default_aliases());

        gateway
            .invoke(&ModelConfig::new("fast"), &[Message::user("hi")])
            .await
            .unwrap();

        let requests = gateway.client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1["model"], "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_invoke_sends_sampling_parameters() {
        let client = MockHttpClient::new().with_response(URL, completion_response());
        let gateway =
            ChatGatewayClient::new(client, "http://gateway", ModelResolver::new());

        let config = ModelConfig::new("gpt-4o-mini")
            .with_temperature(0.1)
            .with_max_tokens(64);
        gateway.invoke(&config, &[Message::user("hi")]).await.unwrap();

        let requests = gateway.client.recorded_requests();
        assert_eq!(requests[0].1["max_tokens"], 64);
    }

    #[tokio::test]
    async fn test_invoke_propagates_upstream_status() {
        let client = MockHttpClient::new().with_error(
            URL,
            DomainError::upstream(Some(404), "model missing", "verify the model id"),
        );
        let gateway = ChatGatewayClient::new(client, "http://gateway", ModelResolver::new());

        let error = gateway
            .invoke(&ModelConfig::new("ghost"), &[Message::user("hi")])
            .await
            .unwrap_err();

        assert_eq!(error.upstream_status(), Some(404));
    }

    #[tokio::test]
    async fn test_invoke_rejects_malformed_completion() {
        let client = MockHttpClient::new().with_response(URL, json!({"choices": []}));
        let gateway = ChatGatewayClient::new(client, "http://gateway", ModelResolver::new());

        let error = gateway
            .invoke(&ModelConfig::new("gpt-4o"), &[Message::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Upstream { .. }));
    }
}
