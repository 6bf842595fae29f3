//! Token price table and cost estimates.

use std::collections::HashMap;

use launchai_core::config::ProviderRates;

/// Read-only map of provider name → per-1k-token rates.
#[derive(Clone, Debug, Default)]
pub struct PriceTable {
    rates: HashMap<String, ProviderRates>,
}

impl PriceTable {
    pub fn new(rates: HashMap<String, ProviderRates>) -> Self {
        Self { rates }
    }

    pub fn rates(&self, provider: &str) -> Option<ProviderRates> {
        self.rates.get(provider).copied()
    }

    /// Estimated cost of one completion. Unknown providers cost zero.
    pub fn cost(&self, provider: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        let Some(r) = self.rates(provider) else {
            return 0.0;
        };
        r.input_per_1k * input_tokens as f64 / 1000.0
            + r.output_per_1k * output_tokens as f64 / 1000.0
    }
}

impl From<&HashMap<String, ProviderRates>> for PriceTable {
    fn from(rates: &HashMap<String, ProviderRates>) -> Self {
        Self::new(rates.clone())
    }
}
