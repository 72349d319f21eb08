use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Blocked by content policy: detected {categories:?}")]
    BlockedByPolicy { categories: Vec<String> },

    #[error("Upstream error{}: {message} ({hint})", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
        hint: String,
    },

    #[error("Ingestion failed: {message}")]
    Ingestion { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn blocked(categories: Vec<String>) -> Self {
        Self::BlockedByPolicy { categories }
    }

    pub fn upstream(
        status: Option<u16>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Upstream HTTP status, when one was reported
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}
