//! Converse orchestration core
//!
//! Building blocks for an LLM platform backend:
//! - Workflow execution over typed node graphs
//! - PII guardrails with cached policies
//! - Document ingestion and similarity retrieval
//! - Model invocation with alias resolution and cost accounting

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use domain::documents::{DocumentPipeline, Retriever};
use domain::guardrail::{GuardrailEngine, GuardrailPolicy, PolicyCache};
use domain::ingestion::ChunkingConfig;
use domain::llm::{ModelInvoker, ModelResolver, RateTable};
use domain::workflow::WorkflowExecutor;
use infrastructure::documents::InMemoryDocumentStore;
use infrastructure::embedding::HttpEmbeddingProvider;
use infrastructure::guardrail::InMemoryPolicyStore;
use infrastructure::llm::{ChatGatewayClient, HttpClient};
use infrastructure::workflow::{ActionRegistry, GraphExecutor};

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Fully wired orchestration services
pub struct Orchestrator {
    pub guardrail: Arc<GuardrailEngine>,
    pub documents: Arc<DocumentPipeline>,
    pub executor: Arc<dyn WorkflowExecutor>,
    pub rates: RateTable,
}

/// Wire the orchestration services from configuration.
///
/// Stores are in-memory; model and embedding calls go through the HTTP
/// gateway endpoints in the config. API keys come from `GATEWAY_API_KEY`
/// when set.
pub async fn create_orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let timeout = Duration::from_secs(config.gateway.request_timeout_secs);
    let api_key = std::env::var("GATEWAY_API_KEY").ok();

    let policy_store = Arc::new(InMemoryPolicyStore::new());
    policy_store
        .insert(GuardrailPolicy::new(&config.guardrail.policy_name))
        .await;

    let policy_cache = Arc::new(PolicyCache::new(
        policy_store,
        &config.guardrail.policy_name,
        Duration::from_secs(config.guardrail.cache_ttl_secs),
    ));
    let guardrail = Arc::new(GuardrailEngine::new(policy_cache));

    let mut embedder =
        HttpEmbeddingProvider::new(HttpClient::with_timeout(timeout)?, &config.gateway.embedding_base_url, DEFAULT_EMBEDDING_MODEL);
    if let Some(key) = &api_key {
        embedder = embedder.with_api_key(key);
    }

    let chunking = ChunkingConfig::new(config.ingestion.chunk_size, config.ingestion.chunk_overlap)?;
    let documents = Arc::new(DocumentPipeline::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(embedder),
        chunking,
    ));

    let mut gateway = ChatGatewayClient::new(
        HttpClient::with_timeout(timeout)?,
        &config.gateway.base_url,
        ModelResolver::with_default_aliases(),
    );
    if let Some(key) = &api_key {
        gateway = gateway.with_api_key(key);
    }

    let invoker: Arc<dyn ModelInvoker> = Arc::new(gateway);
    let retriever: Arc<dyn Retriever> = documents.clone();
    let executor: Arc<dyn WorkflowExecutor> = Arc::new(GraphExecutor::new(
        invoker,
        retriever,
        ActionRegistry::new(),
    ));

    info!("Orchestrator wired against gateway {}", config.gateway.base_url);

    Ok(Orchestrator {
        guardrail,
        documents,
        executor,
        rates: RateTable::with_default_rates(),
    })
}
