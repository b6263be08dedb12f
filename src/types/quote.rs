//! Quote types.

use std::time::Duration;
use tokio::time::Instant;

/// An exchange rate for a token pair, sampled at a point in time.
///
/// The rate is expressed as destination token units per one whole source token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Destination units received per whole source unit.
    pub rate: f64,
    /// When the rate was sampled.
    pub fetched_at: Instant,
}

impl Quote {
    /// Create a quote sampled now.
    pub fn new(rate: f64) -> Self {
        Self { rate, fetched_at: Instant::now() }
    }

    /// Returns `true` if the quote is older than `ttl`.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }
}

/// The quote held for the currently selected pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum QuoteState {
    /// No quote has been fetched for this pair yet.
    #[default]
    Empty,
    /// A rate is available.
    Ready(Quote),
    /// The last refresh failed.
    Unavailable,
    /// The aggregator cannot fill this pair at any size.
    InsufficientLiquidity,
}

impl QuoteState {
    /// Returns the quote if one is available.
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Ready(quote) => Some(quote),
            _ => None,
        }
    }

    /// Returns the rate if a quote is available.
    pub fn rate(&self) -> Option<f64> {
        self.quote().map(|quote| quote.rate)
    }
}
