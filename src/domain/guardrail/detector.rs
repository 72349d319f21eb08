//! PII detection and redaction
//!
//! Each category has one fixed pattern. Allowlist patterns are supplied by
//! the caller and tested against each matched substring independently; a
//! pattern that fails to compile is skipped, never fatal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::policy::{GuardrailAction, GuardrailPolicy, PiiCategory};

static SSN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

static CREDIT_CARD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b").unwrap());

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
});

static IPV4_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap());

fn pattern_for(category: PiiCategory) -> &'static Regex {
    match category {
        PiiCategory::Ssn => &SSN_PATTERN,
        PiiCategory::CreditCard => &CREDIT_CARD_PATTERN,
        PiiCategory::Email => &EMAIL_PATTERN,
        PiiCategory::Phone => &PHONE_PATTERN,
        PiiCategory::IpAddress => &IPV4_PATTERN,
    }
}

/// A single detected PII occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiMatch {
    pub category: PiiCategory,
    pub matched_value: String,
    pub start: usize,
    pub end: usize,
}

/// Result of redacting a piece of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionOutcome {
    pub redacted_text: String,
    /// Deduplicated categories that actually matched, in order of first match
    pub detected_categories: Vec<PiiCategory>,
}

/// Outcome of applying a policy's action to a piece of text
#[derive(Debug, Clone, PartialEq)]
pub enum GuardrailVerdict {
    /// Nothing detected (or policy disabled); continue with the original text
    Clean,
    /// Continue with the redacted text
    Redacted {
        text: String,
        categories: Vec<PiiCategory>,
    },
    /// Abort before any model call
    Blocked { categories: Vec<PiiCategory> },
    /// Continue with the original text, flagging a warning for display
    Warned { categories: Vec<PiiCategory> },
}

/// PII detection engine
#[derive(Debug, Clone, Default)]
pub struct PiiDetector;

impl PiiDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect PII occurrences in `text`, ordered by start offset.
    ///
    /// A match whose substring satisfies any allowlist pattern is discarded.
    pub fn detect(
        &self,
        text: &str,
        categories: &[PiiCategory],
        allowlist: &[String],
    ) -> Vec<PiiMatch> {
        let allow = compile_allowlist(allowlist);
        let mut matches = Vec::new();

        for &category in categories {
            for found in pattern_for(category).find_iter(text) {
                if allow.iter().any(|re| re.is_match(found.as_str())) {
                    continue;
                }

                matches.push(PiiMatch {
                    category,
                    matched_value: found.as_str().to_string(),
                    start: found.start(),
                    end: found.end(),
                });
            }
        }

        matches.sort_by_key(|m| (m.start, m.end));
        matches
    }

    /// Redact every detected occurrence, replacing it with the category's
    /// placeholder token.
    ///
    /// Overlapping matches are merged into one region first so no fragment
    /// of any match survives. Regions are replaced in descending start
    /// order so earlier replacements never shift the offsets of regions
    /// still pending.
    pub fn redact(
        &self,
        text: &str,
        categories: &[PiiCategory],
        allowlist: &[String],
    ) -> RedactionOutcome {
        let matches = self.detect(text, categories, allowlist);

        let mut detected_categories = Vec::new();
        for m in &matches {
            if !detected_categories.contains(&m.category) {
                detected_categories.push(m.category);
            }
        }

        // Union of overlapping spans, labeled with the earliest match's
        // category; matches arrive sorted by start offset
        let mut regions: Vec<(usize, usize, PiiCategory)> = Vec::new();
        for m in &matches {
            match regions.last_mut() {
                Some((_, end, _)) if m.start < *end => {
                    if m.end > *end {
                        *end = m.end;
                    }
                }
                _ => regions.push((m.start, m.end, m.category)),
            }
        }

        let mut redacted_text = text.to_string();
        for (start, end, category) in regions.iter().rev() {
            redacted_text.replace_range(*start..*end, category.placeholder());
        }

        RedactionOutcome {
            redacted_text,
            detected_categories,
        }
    }

    /// Apply a policy's configured action to `text`.
    pub fn enforce(&self, policy: &GuardrailPolicy, text: &str) -> GuardrailVerdict {
        if !policy.is_enabled() {
            return GuardrailVerdict::Clean;
        }

        let matches = self.detect(text, policy.categories(), policy.allowlist_patterns());
        if matches.is_empty() {
            return GuardrailVerdict::Clean;
        }

        match policy.action() {
            GuardrailAction::Redact => {
                let outcome = self.redact(text, policy.categories(), policy.allowlist_patterns());
                GuardrailVerdict::Redacted {
                    text: outcome.redacted_text,
                    categories: outcome.detected_categories,
                }
            }
            GuardrailAction::Block => {
                let mut categories = Vec::new();
                for m in &matches {
                    if !categories.contains(&m.category) {
                        categories.push(m.category);
                    }
                }
                GuardrailVerdict::Blocked { categories }
            }
            GuardrailAction::Warn => {
                let mut categories = Vec::new();
                for m in &matches {
                    if !categories.contains(&m.category) {
                        categories.push(m.category);
                    }
                }
                GuardrailVerdict::Warned { categories }
            }
        }
    }
}

fn compile_allowlist(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        match Regex::new(pattern) {
            Ok(re) => compiled.push(re),
            Err(e) => {
                warn!("Skipping malformed allowlist pattern '{}': {}", pattern, e);
            }
        }
    }

    compiled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> PiiDetector {
        PiiDetector::new()
    }

    fn all() -> &'static [PiiCategory] {
        PiiCategory::all()
    }

    #[test]
    fn test_detect_email() {
        let matches = detector().detect("contact me at a@b.com", all(), &[]);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].category, PiiCategory::Email);
        assert_eq!(matches[0].matched_value, "a@b.com");
        assert_eq!(matches[0].start, 14);
        assert_eq!(matches[0].end, 21);
    }

    #[test]
    fn test_detect_ssn() {
        let matches = detector().detect("SSN is 123-45-6789.", all(), &[]);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].category, PiiCategory::Ssn);
        assert_eq!(matches[0].matched_value, "123-45-6789");
    }

    #[test]
    fn test_detect_credit_card() {
        let matches = detector().detect("card: 4111-1111-1111-1111", all(), &[]);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].category, PiiCategory::CreditCard);
    }

    #[test]
    fn test_detect_phone() {
        let matches = detector().detect("call 555-123-4567 today", all(), &[]);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].category, PiiCategory::Phone);
        assert_eq!(matches[0].matched_value, "555-123-4567");
    }

    #[test]
    fn test_detect_ipv4() {
        let matches = detector().detect("server at 192.168.1.1 is down", all(), &[]);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].category, PiiCategory::IpAddress);
        assert_eq!(matches[0].matched_value, "192.168.1.1");
    }

    #[test]
    fn test_detect_ordered_by_start() {
        let text = "ip 10.0.0.1 then mail x@y.org then ssn 123-45-6789";
        let matches = detector().detect(text, all(), &[]);

        assert_eq!(matches.len(), 3);
        assert!(matches[0].start < matches[1].start);
        assert!(matches[1].start < matches[2].start);
        assert_eq!(matches[0].category, PiiCategory::IpAddress);
        assert_eq!(matches[1].category, PiiCategory::Email);
        assert_eq!(matches[2].category, PiiCategory::Ssn);
    }

    #[test]
    fn test_detect_scoped_categories() {
        let text = "mail x@y.org, ssn 123-45-6789";
        let matches = detector().detect(text, &[PiiCategory::Email], &[]);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].category, PiiCategory::Email);
    }

    #[test]
    fn test_allowlist_exempts_match() {
        let allowlist = vec![r"@example\.com$".to_string()];
        let text = "write to support@example.com or leak@other.com";
        let matches = detector().detect(text, all(), &allowlist);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched_value, "leak@other.com");
    }

    #[test]
    fn test_malformed_allowlist_pattern_is_skipped() {
        let allowlist = vec!["[unclosed".to_string(), r"@example\.com$".to_string()];
        let text = "write to support@example.com";
        let matches = detector().detect(text, all(), &allowlist);

        // The valid pattern still applies; the malformed one is ignored
        assert!(matches.is_empty());
    }

    #[test]
    fn test_redact_email_end_to_end() {
        let outcome = detector().redact("contact me at a@b.com", &[PiiCategory::Email], &[]);

        assert_eq!(outcome.redacted_text, "contact me at [EMAIL REDACTED]");
        assert_eq!(outcome.detected_categories, vec![PiiCategory::Email]);
    }

    #[test]
    fn test_redact_leaves_other_characters_unchanged() {
        let outcome = detector().redact("a 123-45-6789 z", all(), &[]);

        assert_eq!(outcome.redacted_text, "a [SSN REDACTED] z");
    }

    #[test]
    fn test_redact_multiple_matches() {
        let text = "mail x@y.org, ssn 123-45-6789, ip 10.0.0.1";
        let outcome = detector().redact(text, all(), &[]);

        assert_eq!(
            outcome.redacted_text,
            "mail [EMAIL REDACTED], ssn [SSN REDACTED], ip [IP ADDRESS REDACTED]"
        );
        assert_eq!(
            outcome.detected_categories,
            vec![PiiCategory::Email, PiiCategory::Ssn, PiiCategory::IpAddress]
        );
    }

    #[test]
    fn test_redact_merges_overlapping_matches() {
        // The IPv4 match nests inside the email match; the merged region
        // must leave no fragment of either visible
        let outcome = detector().redact("reach me at a@192.168.1.1.com", all(), &[]);

        assert_eq!(outcome.redacted_text, "reach me at [EMAIL REDACTED]");
        assert_eq!(
            outcome.detected_categories,
            vec![PiiCategory::Email, PiiCategory::IpAddress]
        );
    }

    #[test]
    fn test_redact_is_idempotent() {
        let first = detector().redact("contact a@b.com and 555-123-4567", all(), &[]);
        let second = detector().redact(&first.redacted_text, all(), &[]);

        assert_eq!(second.redacted_text, first.redacted_text);
        assert!(second.detected_categories.is_empty());
    }

    #[test]
    fn test_redact_detected_categories_deduplicated() {
        let outcome = detector().redact("a@b.com and c@d.org", all(), &[]);

        assert_eq!(outcome.detected_categories, vec![PiiCategory::Email]);
    }

    #[test]
    fn test_enforce_disabled_policy() {
        let policy = GuardrailPolicy::new("off").with_enabled(false);
        let verdict = detector().enforce(&policy, "a@b.com");

        assert_eq!(verdict, GuardrailVerdict::Clean);
    }

    #[test]
    fn test_enforce_redact_action() {
        let policy = GuardrailPolicy::new("default")
            .with_categories(vec![PiiCategory::Email])
            .with_action(GuardrailAction::Redact);

        let verdict = detector().enforce(&policy, "contact me at a@b.com");

        assert_eq!(
            verdict,
            GuardrailVerdict::Redacted {
                text: "contact me at [EMAIL REDACTED]".to_string(),
                categories: vec![PiiCategory::Email],
            }
        );
    }

    #[test]
    fn test_enforce_block_action() {
        let policy = GuardrailPolicy::new("strict").with_action(GuardrailAction::Block);
        let verdict = detector().enforce(&policy, "ssn 123-45-6789");

        assert_eq!(
            verdict,
            GuardrailVerdict::Blocked {
                categories: vec![PiiCategory::Ssn],
            }
        );
    }

    #[test]
    fn test_enforce_warn_action() {
        let policy = GuardrailPolicy::new("lenient").with_action(GuardrailAction::Warn);
        let verdict = detector().enforce(&policy, "ip 10.0.0.1");

        assert_eq!(
            verdict,
            GuardrailVerdict::Warned {
                categories: vec![PiiCategory::IpAddress],
            }
        );
    }

    #[test]
    fn test_enforce_clean_text() {
        let policy = GuardrailPolicy::new("default");
        let verdict = detector().enforce(&policy, "nothing sensitive here");

        assert_eq!(verdict, GuardrailVerdict::Clean);
    }
}
