//! The portfolio service.
//!
//! Tracks the account's token balances and swap history. Balances are read on chain one
//! token at a time with a small gap between lookups so a public RPC endpoint is never
//! hammered, and a failed lookup degrades to a zero row instead of failing the refresh.

use crate::{
    config::WalletConfig,
    constants::DISPLAY_DECIMALS,
    error::ApiError,
    metrics::PortfolioMetrics,
    types::{Token, TokenRegistry, TxRecord, format_amount, trim_to_decimals},
    upstream::{BackendApi, BalanceReader, PriceFeed},
};
use alloy::primitives::{Address, U256};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, warn};

/// One row of the balance table.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalance {
    /// Ticker symbol.
    pub symbol: String,
    /// Human-readable name.
    pub name: String,
    /// Logo asset identifier.
    pub logo: String,
    /// Balance in whole tokens.
    pub balance: f64,
    /// Balance in USD.
    pub usd_value: f64,
}

/// A consistent view of the account's holdings and history.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSnapshot {
    /// Balance rows in registry order.
    pub balances: Vec<TokenBalance>,
    /// Sum of all balance rows in USD.
    pub total_usd: f64,
    /// Completed swaps, newest first as reported by the backend.
    pub history: Vec<TxRecord>,
    /// Whether a balance refresh is in flight.
    pub balances_refreshing: bool,
    /// Whether a history refresh is in flight.
    pub history_refreshing: bool,
    /// The last error surfaced by a refresh.
    pub last_error: Option<String>,
}

enum PortfolioCommand {
    RefreshBalances { account: Address },
    RefreshHistory,
}

enum PortfolioEvent {
    Balances { entries: Vec<TokenBalance>, total: f64 },
    History { result: Result<Vec<TxRecord>, ApiError> },
}

/// Handle to a running [`PortfolioService`].
#[derive(Debug, Clone)]
pub struct PortfolioHandle {
    commands: mpsc::UnboundedSender<PortfolioCommand>,
    snapshot: watch::Receiver<PortfolioSnapshot>,
}

impl PortfolioHandle {
    /// Starts a balance refresh for `account`. Coalesced if one is already in flight.
    pub fn refresh_balances(&self, account: Address) {
        let _ = self.commands.send(PortfolioCommand::RefreshBalances { account });
    }

    /// Starts a history refresh. Coalesced if one is already in flight.
    pub fn refresh_history(&self) {
        let _ = self.commands.send(PortfolioCommand::RefreshHistory);
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns a watch receiver that yields every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PortfolioSnapshot> {
        self.snapshot.clone()
    }
}

/// The service loop behind a [`PortfolioHandle`].
pub struct PortfolioService {
    commands: mpsc::UnboundedReceiver<PortfolioCommand>,
    events: mpsc::UnboundedReceiver<PortfolioEvent>,
    coordinator: PortfolioCoordinator,
}

impl PortfolioService {
    /// Spawns the service, returning a handle to it.
    pub fn spawn(
        registry: TokenRegistry,
        balances: Arc<dyn BalanceReader>,
        prices: Arc<dyn PriceFeed>,
        backend: Arc<dyn BackendApi>,
        config: &WalletConfig,
    ) -> PortfolioHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PortfolioSnapshot::default());

        let coordinator = PortfolioCoordinator {
            registry,
            balances,
            prices,
            backend,
            events: event_tx,
            snapshot_tx,
            state: PortfolioSnapshot::default(),
            fetch_spacing: config.balances.fetch_spacing,
            balance_task: None,
            history_task: None,
            metrics: PortfolioMetrics::default(),
        };

        tokio::spawn(Self { commands: command_rx, events: event_rx, coordinator }.run());

        PortfolioHandle { commands: command_tx, snapshot: snapshot_rx }
    }

    async fn run(self) {
        let Self { mut commands, mut events, mut coordinator } = self;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    coordinator.on_command(command);
                }
                Some(event) = events.recv() => coordinator.on_event(event),
            }
            coordinator.publish();
        }

        coordinator.abort_tasks();
    }
}

struct PortfolioCoordinator {
    registry: TokenRegistry,
    balances: Arc<dyn BalanceReader>,
    prices: Arc<dyn PriceFeed>,
    backend: Arc<dyn BackendApi>,
    events: mpsc::UnboundedSender<PortfolioEvent>,
    snapshot_tx: watch::Sender<PortfolioSnapshot>,
    state: PortfolioSnapshot,
    fetch_spacing: Duration,
    balance_task: Option<JoinHandle<()>>,
    history_task: Option<JoinHandle<()>>,
    metrics: PortfolioMetrics,
}

impl PortfolioCoordinator {
    fn on_command(&mut self, command: PortfolioCommand) {
        match command {
            PortfolioCommand::RefreshBalances { account } => self.start_balance_refresh(account),
            PortfolioCommand::RefreshHistory => self.start_history_refresh(),
        }
    }

    fn start_balance_refresh(&mut self, account: Address) {
        if self.state.balances_refreshing {
            debug!("balance refresh already in flight");
            return;
        }
        self.state.balances_refreshing = true;
        self.metrics.balance_refreshes.increment(1);

        let registry = self.registry.clone();
        let balances = self.balances.clone();
        let prices = self.prices.clone();
        let events = self.events.clone();
        let spacing = self.fetch_spacing;
        let metrics = self.metrics.clone();
        self.balance_task = Some(tokio::spawn(async move {
            let mut entries = Vec::with_capacity(registry.len());
            let mut total = 0.0;
            for token in registry.iter() {
                let entry = match fetch_entry(&*balances, &*prices, account, token).await {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(token = %token.symbol, %err, "balance lookup failed, reporting zero");
                        metrics.degraded_entries.increment(1);
                        TokenBalance {
                            symbol: token.symbol.clone(),
                            name: token.name.clone(),
                            logo: token.logo.clone(),
                            balance: 0.0,
                            usd_value: 0.0,
                        }
                    }
                };
                total += entry.usd_value;
                entries.push(entry);
                sleep(spacing).await;
            }
            let _ = events.send(PortfolioEvent::Balances { entries, total });
        }));
    }

    fn start_history_refresh(&mut self) {
        if self.state.history_refreshing {
            debug!("history refresh already in flight");
            return;
        }
        self.state.history_refreshing = true;
        self.metrics.history_refreshes.increment(1);

        let registry = self.registry.clone();
        let backend = self.backend.clone();
        let events = self.events.clone();
        self.history_task = Some(tokio::spawn(async move {
            let result =
                backend.tx_history().await.map(|records| normalize_history(&registry, records));
            let _ = events.send(PortfolioEvent::History { result });
        }));
    }

    fn on_event(&mut self, event: PortfolioEvent) {
        match event {
            PortfolioEvent::Balances { entries, total } => {
                self.state.balances_refreshing = false;
                self.state.balances = entries;
                self.state.total_usd = total;
                self.balance_task = None;
            }
            PortfolioEvent::History { result } => {
                self.state.history_refreshing = false;
                self.history_task = None;
                match result {
                    Ok(history) => {
                        self.state.history = history;
                        self.state.last_error = None;
                    }
                    Err(err) => {
                        warn!(%err, "history refresh failed");
                        self.state.history = Vec::new();
                        self.state.last_error = Some(err.to_string());
                    }
                }
            }
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.clone());
    }

    fn abort_tasks(&mut self) {
        if let Some(task) = self.balance_task.take() {
            task.abort();
        }
        if let Some(task) = self.history_task.take() {
            task.abort();
        }
    }
}

async fn fetch_entry(
    balances: &dyn BalanceReader,
    prices: &dyn PriceFeed,
    account: Address,
    token: &Token,
) -> Result<TokenBalance, ApiError> {
    let balance = balances.token_balance(account, token).await?;
    let price = prices.usd_price(token.address).await?;
    Ok(TokenBalance {
        symbol: token.symbol.clone(),
        name: token.name.clone(),
        logo: token.logo.clone(),
        balance,
        usd_value: balance * price,
    })
}

/// Normalizes raw history amounts for display.
///
/// The backend reports amounts in base units of their token. Known symbols are converted to
/// whole tokens and truncated to display precision; unknown symbols pass through untouched.
fn normalize_history(registry: &TokenRegistry, mut records: Vec<TxRecord>) -> Vec<TxRecord> {
    for record in &mut records {
        normalize_field(registry, &record.from_token, &mut record.from_amount);
        normalize_field(registry, &record.to_token, &mut record.to_amount);
    }
    records
}

fn normalize_field(registry: &TokenRegistry, symbol: &str, amount: &mut String) {
    if let Some(token) = registry.get(symbol)
        && let Some(normalized) = normalize_amount(amount, token)
    {
        *amount = normalized;
    }
}

fn normalize_amount(raw: &str, token: &Token) -> Option<String> {
    let base = U256::from_str_radix(raw.trim(), 10).ok()?;
    let whole: f64 = format_amount(base, token.decimals).parse().ok()?;
    Some(trim_to_decimals(whole, DISPLAY_DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_passes_unknown_symbols_through() {
        let registry = TokenRegistry::default();
        let records = vec![TxRecord {
            dex_name: "OKX DEX".to_string(),
            from_token: "WOKB".to_string(),
            from_amount: "1000000000000000000".to_string(),
            to_token: "DOGE".to_string(),
            to_amount: "12345".to_string(),
            timestamp: chrono::Utc::now(),
        }];

        let normalized = normalize_history(&registry, records);
        assert_eq!(normalized[0].from_amount, "1");
        assert_eq!(normalized[0].to_amount, "12345");
    }

    #[test]
    fn normalization_truncates_to_display_precision() {
        let registry = TokenRegistry::default();
        let token = registry.get("WOKB").unwrap();

        // 1.23456789 WOKB in wei.
        assert_eq!(normalize_amount("1234567890000000000", token).unwrap(), "1.234567");
        assert_eq!(normalize_amount("2500000000000000000", token).unwrap(), "2.5");
        assert!(normalize_amount("not-a-number", token).is_none());
    }
}
