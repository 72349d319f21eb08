//! Per-model pricing and cost accounting

use std::collections::HashMap;

use crate::domain::error::DomainError;

/// USD rates per 1000 tokens for a single model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRates {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl ModelRates {
    pub fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Cost in USD for a completed call.
    pub fn cost_of(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

/// Rate lookup keyed by backend model id
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<String, ModelRates>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with current list prices.
    pub fn with_default_rates() -> Self {
        let mut table = Self::new();
        table.register("gpt-4o", ModelRates::new(0.0025, 0.01));
        table.register("gpt-4o-mini", ModelRates::new(0.00015, 0.0006));
        table.register("claude-3-5-sonnet-20241022", ModelRates::new(0.003, 0.015));
        table.register("claude-3-5-haiku-20241022", ModelRates::new(0.0008, 0.004));
        table
    }

    pub fn register(&mut self, model_id: impl Into<String>, rates: ModelRates) {
        self.rates.insert(model_id.into(), rates);
    }

    pub fn rates_for(&self, model_id: &str) -> Result<ModelRates, DomainError> {
        self.rates
            .get(model_id)
            .copied()
            .ok_or_else(|| DomainError::not_found(format!("No rates for model: {}", model_id)))
    }

    /// Cost in USD for a call against `model_id`, erring on unknown models
    /// rather than silently billing zero.
    pub fn cost_of(
        &self,
        model_id: &str,
        input_tokens: u32,
        output_tokens: u32,
    ) -> Result<f64, DomainError> {
        Ok(self
            .rates_for(model_id)?
            .cost_of(input_tokens, output_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_of_basic() {
        let rates = ModelRates::new(0.0025, 0.01);
        let cost = rates.cost_of(1000, 500);

        assert!((cost - 0.0075).abs() < 1e-12);
    }

    #[test]
    fn test_cost_of_zero_tokens() {
        let rates = ModelRates::new(0.003, 0.015);
        assert_eq!(rates.cost_of(0, 0), 0.0);
    }

    #[test]
    fn test_rate_table_lookup() {
        let table = RateTable::with_default_rates();
        let cost = table.cost_of("gpt-4o-mini", 2000, 1000).unwrap();

        assert!((cost - 0.0009).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_model_errors() {
        let table = RateTable::with_default_rates();
        let result = table.cost_of("unknown-model", 100, 100);

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
