//! HTTP embedding provider
//!
//! Speaks the OpenAI-compatible `/v1/embeddings` shape. Results are
//! reordered by the reported index so the output always lines up with
//! the input batch.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::error::DomainError;
use crate::infrastructure::llm::http_client::HttpClientTrait;

#[derive(Debug)]
pub struct HttpEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    model: String,
    auth_header: Option<String>,
}

impl<C: HttpClientTrait> HttpEmbeddingProvider<C> {
    pub fn new(client: C, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            auth_header: None,
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.auth_header = Some(format!("Bearer {}", api_key));
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for HttpEmbeddingProvider<C> {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut headers = Vec::new();
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        let response = self
            .client
            .post_json(&self.embeddings_url(), headers, &body)
            .await?;

        let data = response["data"].as_array().ok_or_else(|| {
            DomainError::upstream(
                None,
                "Embedding response has no data array",
                "verify the embedding service response shape",
            )
        })?;

        let mut embeddings = vec![Vec::new(); inputs.len()];
        for item in data {
            let index = item["index"].as_u64().ok_or_else(|| {
                DomainError::upstream(
                    None,
                    "Embedding item has no index",
                    "verify the embedding service response shape",
                )
            })? as usize;

            if index >= embeddings.len() {
                return Err(DomainError::upstream(
                    None,
                    format!("Embedding index {} out of range", index),
                    "verify the embedding service response shape",
                ));
            }

            let vector = item["embedding"]
                .as_array()
                .ok_or_else(|| {
                    DomainError::upstream(
                        None,
                        "Embedding item has no vector",
                        "verify the embedding service response shape",
                    )
                })?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();

            embeddings[index] = vector;
        }

        if embeddings.iter().any(|e| e.is_empty()) {
            return Err(DomainError::upstream(
                None,
                "Embedding response is missing vectors for some inputs",
                "verify the embedding service response shape",
            ));
        }

        Ok(embeddings)
    }

    fn provider_name(&self) -> &'static str {
        "http_embeddings"
    }
}
