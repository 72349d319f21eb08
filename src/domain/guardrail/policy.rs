//! Guardrail policy entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categories of personally identifiable information the engine can detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Ssn,
    CreditCard,
    Email,
    Phone,
    IpAddress,
}

impl PiiCategory {
    /// All detectable categories, in detection order
    pub fn all() -> &'static [PiiCategory] {
        &[
            Self::Ssn,
            Self::CreditCard,
            Self::Email,
            Self::Phone,
            Self::IpAddress,
        ]
    }

    /// Stable name used in logs and error payloads
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::IpAddress => "ip_address",
        }
    }

    /// Token substituted for a redacted match of this category
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Ssn => "[SSN REDACTED]",
            Self::CreditCard => "[CREDIT CARD REDACTED]",
            Self::Email => "[EMAIL REDACTED]",
            Self::Phone => "[PHONE REDACTED]",
            Self::IpAddress => "[IP ADDRESS REDACTED]",
        }
    }
}

/// What to do when detection finds a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailAction {
    #[default]
    Redact,
    Block,
    Warn,
}

/// A named content-safety policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailPolicy {
    name: String,
    enabled: bool,
    categories: Vec<PiiCategory>,
    action: GuardrailAction,
    allowlist_patterns: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GuardrailPolicy {
    /// Create a new policy with the given name, enabled and covering all categories
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            enabled: true,
            categories: PiiCategory::all().to_vec(),
            action: GuardrailAction::default(),
            allowlist_patterns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The default applied when no policy can be read: enabled, all
    /// categories, redact. Chosen over erroring so that a missing or
    /// unreadable policy store never disables detection.
    pub fn fail_closed() -> Self {
        Self::new("fail-closed")
    }

    // Builder methods

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_categories(mut self, categories: Vec<PiiCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_action(mut self, action: GuardrailAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_allowlist_patterns(mut self, patterns: Vec<String>) -> Self {
        self.allowlist_patterns = patterns;
        self
    }

    pub fn with_allowlist_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.allowlist_patterns.push(pattern.into());
        self
    }

    // Getters

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn categories(&self) -> &[PiiCategory] {
        &self.categories
    }

    pub fn action(&self) -> GuardrailAction {
        self.action
    }

    pub fn allowlist_patterns(&self) -> &[String] {
        &self.allowlist_patterns
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_closed_default() {
        let policy = GuardrailPolicy::fail_closed();

        assert!(policy.is_enabled());
        assert_eq!(policy.categories(), PiiCategory::all());
        assert_eq!(policy.action(), GuardrailAction::Redact);
        assert!(policy.allowlist_patterns().is_empty());
    }

    #[test]
    fn test_policy_builder() {
        let policy = GuardrailPolicy::new("support-chat")
            .with_categories(vec![PiiCategory::Email, PiiCategory::Phone])
            .with_action(GuardrailAction::Block)
            .with_allowlist_pattern(r"@example\.com$");

        assert_eq!(policy.name(), "support-chat");
        assert_eq!(policy.categories().len(), 2);
        assert_eq!(policy.action(), GuardrailAction::Block);
        assert_eq!(policy.allowlist_patterns().len(), 1);
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&PiiCategory::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");

        let parsed: PiiCategory = serde_json::from_str("\"ip_address\"").unwrap();
        assert_eq!(parsed, PiiCategory::IpAddress);
    }

    #[test]
    fn test_policy_serialization() {
        let policy = GuardrailPolicy::new("default").with_action(GuardrailAction::Warn);
        let json = serde_json::to_string(&policy).unwrap();

        assert!(json.contains("\"action\":\"warn\""));

        let parsed: GuardrailPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name(), "default");
        assert_eq!(parsed.action(), GuardrailAction::Warn);
    }
}
