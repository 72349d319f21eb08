mod app_config;

pub use app_config::{
    AppConfig, GatewaySettings, GuardrailSettings, IngestionSettings, LogFormat, LoggingConfig,
};
