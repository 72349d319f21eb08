use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub guardrail: GuardrailSettings,
    #[serde(default)]
    pub ingestion: IngestionSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Guardrail policy lookup and cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct GuardrailSettings {
    /// Name of the policy record to enforce
    pub policy_name: String,
    /// How long a fetched policy stays fresh, in seconds
    pub cache_ttl_secs: u64,
}

/// Document chunking defaults
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Model gateway and embedding service endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    pub base_url: String,
    pub embedding_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GuardrailSettings {
    fn default() -> Self {
        Self {
            policy_name: "default".to_string(),
            cache_ttl_secs: 300,
        }
    }
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            embedding_base_url: "http://localhost:8081".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
