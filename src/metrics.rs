//! Metrics for the wallet services.

use metrics::Counter;
use metrics_derive::Metrics;

/// Metrics for the quote refresh loop.
#[derive(Metrics, Clone)]
#[metrics(scope = "quote_feed")]
pub struct QuoteFeedMetrics {
    /// The number of quote refreshes started.
    pub refreshes: Counter,
    /// The number of quote refreshes that failed.
    pub failures: Counter,
}

/// Metrics for the receipt poller.
#[derive(Metrics, Clone)]
#[metrics(scope = "receipt_poller")]
pub struct ReceiptPollerMetrics {
    /// The number of bundler polls issued.
    pub polls: Counter,
    /// The number of operations tracked to confirmation.
    pub confirmed: Counter,
    /// The number of operations abandoned at the polling deadline.
    pub deadline_exceeded: Counter,
}

/// Metrics for the portfolio service.
#[derive(Metrics, Clone)]
#[metrics(scope = "portfolio")]
pub struct PortfolioMetrics {
    /// The number of balance refreshes performed.
    pub balance_refreshes: Counter,
    /// The number of balance entries zeroed because a lookup failed.
    pub degraded_entries: Counter,
    /// The number of history refreshes performed.
    pub history_refreshes: Counter,
}
