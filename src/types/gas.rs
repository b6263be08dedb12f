use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// One step of the route a swap will take, as reported by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    /// Short label for the step, e.g. `approve` or `swap`.
    pub label: String,
    /// Free-form detail for display.
    #[serde(default)]
    pub detail: String,
}

/// The raw gas figures returned by the aggregator for a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasBreakdown {
    /// Total gas cost in native wei.
    pub total_gas: U256,
    /// The steps the swap will execute.
    pub actions: Vec<ActionStep>,
}

/// A priced gas estimate with a bounded validity window.
#[derive(Debug, Clone, PartialEq)]
pub struct GasEstimate {
    /// Total gas cost in native wei.
    pub total_gas: U256,
    /// Total cost formatted in whole native tokens.
    pub total_native: String,
    /// Total cost formatted in USD.
    pub total_usd: String,
    /// The steps the swap will execute.
    pub actions: Vec<ActionStep>,
    /// When the estimate was computed.
    pub computed_at: Instant,
}

impl GasEstimate {
    /// Returns `true` if the estimate is older than `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.computed_at.elapsed() >= ttl
    }
}
