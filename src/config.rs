//! Wallet configuration.
use crate::{
    constants::{
        BALANCE_FETCH_SPACING, DEFAULT_SLIPPAGE, GAS_ESTIMATE_TTL, QUOTE_REFRESH_INTERVAL,
        RECEIPT_POLL_DEADLINE, RECEIPT_POLL_INTERVAL, XLAYER_CHAIN_ID, XLAYER_PUBLIC_RPC_URL,
    },
    types::TokenRegistry,
};
use alloy::primitives::ChainId;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Wallet configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Base URL of the wallet backend.
    pub backend_url: Url,
    /// Base URL of the DEX aggregator.
    pub dex_url: Url,
    /// URL of the bundler.
    pub bundler_url: Url,
    /// RPC endpoint used for balance reads.
    pub rpc_url: Url,
    /// The chain everything settles on.
    pub chain_id: ChainId,
    /// The tradable token set.
    #[serde(default)]
    pub registry: TokenRegistry,
    /// Quote refresh configuration.
    #[serde(default)]
    pub quote: QuoteConfig,
    /// Operation tracking configuration.
    #[serde(default)]
    pub ops: OpPollConfig,
    /// Balance refresh configuration.
    #[serde(default)]
    pub balances: BalanceConfig,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".parse().unwrap(),
            dex_url: "http://localhost:8282".parse().unwrap(),
            bundler_url: "http://localhost:8181".parse().unwrap(),
            rpc_url: XLAYER_PUBLIC_RPC_URL.parse().unwrap(),
            chain_id: XLAYER_CHAIN_ID,
            registry: TokenRegistry::default(),
            quote: QuoteConfig::default(),
            ops: OpPollConfig::default(),
            balances: BalanceConfig::default(),
        }
    }
}

impl WalletConfig {
    /// Sets the backend URL.
    pub fn with_backend_url(mut self, url: Url) -> Self {
        self.backend_url = url;
        self
    }

    /// Sets the DEX aggregator URL.
    pub fn with_dex_url(mut self, url: Url) -> Self {
        self.dex_url = url;
        self
    }

    /// Sets the bundler URL.
    pub fn with_bundler_url(mut self, url: Url) -> Self {
        self.bundler_url = url;
        self
    }

    /// Sets the RPC endpoint used for balance reads.
    pub fn with_rpc_url(mut self, url: Url) -> Self {
        self.rpc_url = url;
        self
    }

    /// Sets the chain id.
    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the tradable token set.
    pub fn with_registry(mut self, registry: TokenRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the interval between scheduled quote refreshes.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.quote.refresh_interval = interval;
        self
    }

    /// Sets how long a gas estimate may back a submission.
    pub fn with_gas_ttl(mut self, ttl: Duration) -> Self {
        self.quote.gas_ttl = ttl;
        self
    }

    /// Sets the slippage sent with quotes and swaps.
    pub fn with_slippage(mut self, slippage: impl Into<String>) -> Self {
        self.quote.slippage = slippage.into();
        self
    }

    /// Sets the interval between receipt polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.ops.poll_interval = interval;
        self
    }

    /// Sets the deadline after which a tracked operation is reported unresolved.
    pub fn with_poll_deadline(mut self, deadline: Duration) -> Self {
        self.ops.deadline = deadline;
        self
    }

    /// Sets the gap between consecutive balance lookups.
    pub fn with_fetch_spacing(mut self, spacing: Duration) -> Self {
        self.balances.fetch_spacing = spacing;
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Quote refresh configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteConfig {
    /// Interval between scheduled quote refreshes.
    ///
    /// Doubles as the staleness bound: a quote older than this never backs an action.
    #[serde(with = "crate::serde::duration")]
    pub refresh_interval: Duration,
    /// How long a gas estimate may back a submission.
    #[serde(with = "crate::serde::duration")]
    pub gas_ttl: Duration,
    /// Slippage sent with quotes and swaps, as a decimal fraction.
    pub slippage: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            refresh_interval: QUOTE_REFRESH_INTERVAL,
            gas_ttl: GAS_ESTIMATE_TTL,
            slippage: DEFAULT_SLIPPAGE.to_string(),
        }
    }
}

/// Operation tracking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpPollConfig {
    /// Interval between receipt polls.
    #[serde(with = "crate::serde::duration_ms")]
    pub poll_interval: Duration,
    /// Deadline after which a tracked operation is reported unresolved.
    #[serde(with = "crate::serde::duration")]
    pub deadline: Duration,
}

impl Default for OpPollConfig {
    fn default() -> Self {
        Self { poll_interval: RECEIPT_POLL_INTERVAL, deadline: RECEIPT_POLL_DEADLINE }
    }
}

/// Balance refresh configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceConfig {
    /// Gap between consecutive balance lookups.
    #[serde(with = "crate::serde::duration_ms")]
    pub fetch_spacing: Duration,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self { fetch_spacing: BALANCE_FETCH_SPACING }
    }
}
