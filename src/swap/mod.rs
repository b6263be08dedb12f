//! The swap workflow service.
//!
//! A [`SwapService`] owns the whole lifecycle of one swap form: pair selection, the quote
//! refresh loop, gas estimation, submission and receipt tracking. It runs as a task and is
//! driven through a cheaply cloneable [`SwapHandle`]; observers read consistent
//! [`SwapSnapshot`]s from a watch channel instead of locking shared state.

use crate::{
    config::WalletConfig,
    constants::{DISPLAY_DECIMALS, NATIVE_GAS_DECIMALS, NATIVE_GAS_TOKEN, QUOTE_COUNTDOWN_TICK},
    error::SwapError,
    metrics::{QuoteFeedMetrics, ReceiptPollerMetrics},
    types::{
        GasEstimate, OpState, Quote, QuoteState, SwapRequest, Token, TokenRegistry,
        UserOperationReceipt, format_amount, format_amount_to_usd, parse_amount, whole_unit,
    },
    upstream::{BundlerApi, PriceFeed, SwapApi},
};
use alloy::primitives::{Address, B256};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval, interval_at},
};
use tracing::{debug, warn};

mod poller;
use poller::ReceiptPoller;

/// The stage a swap is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapStage {
    /// Editing the pair and amount.
    #[default]
    Idle,
    /// A fresh gas estimate is held and the swap can be confirmed.
    GasCalculated,
    /// The swap has been handed to the aggregator.
    Submitting,
    /// The operation is being tracked against the bundler.
    Processing,
    /// The operation landed on chain.
    Confirmed,
    /// The operation did not land within the polling deadline.
    Unresolved,
}

/// A consistent view of the swap form.
#[derive(Debug, Clone)]
pub struct SwapSnapshot {
    /// The current stage.
    pub stage: SwapStage,
    /// The token being sold.
    pub from: Token,
    /// The token being bought.
    pub to: Token,
    /// The amount being sold, as entered.
    pub amount: String,
    /// The amount received, derived from `amount` and the current rate.
    pub to_amount: String,
    /// The quote held for the pair.
    pub quote: QuoteState,
    /// Whether a quote refresh is in flight.
    pub quote_fetching: bool,
    /// Seconds until the next scheduled quote refresh.
    pub countdown: u64,
    /// The gas estimate, if one is held.
    pub gas: Option<GasEstimate>,
    /// Whether a gas estimate is in flight.
    pub gas_fetching: bool,
    /// The hash of the submitted operation.
    pub op_hash: Option<B256>,
    /// The reported state of the submitted operation.
    pub op_state: Option<OpState>,
    /// The receipt of the landed operation.
    pub receipt: Option<UserOperationReceipt>,
    /// The gas actually paid, in USD.
    pub gas_cost_usd: Option<String>,
    /// The last error surfaced by a background task.
    pub last_error: Option<String>,
}

impl SwapSnapshot {
    fn new(from: Token, to: Token, countdown: u64) -> Self {
        Self {
            stage: SwapStage::Idle,
            from,
            to,
            amount: String::new(),
            to_amount: String::new(),
            quote: QuoteState::Empty,
            quote_fetching: false,
            countdown,
            gas: None,
            gas_fetching: false,
            op_hash: None,
            op_state: None,
            receipt: None,
            gas_cost_usd: None,
            last_error: None,
        }
    }
}

enum SwapCommand {
    SelectFrom(String),
    SelectTo(String),
    Flip,
    SetAmount(String),
    RefreshQuote,
    CalculateGas(oneshot::Sender<Result<(), SwapError>>),
    Confirm(oneshot::Sender<Result<(), SwapError>>),
    Acknowledge,
}

enum SwapEvent {
    Quote { epoch: u64, result: Result<f64, SwapError> },
    Gas { epoch: u64, result: Result<GasEstimate, SwapError> },
    Submitted { epoch: u64, result: Result<B256, SwapError> },
    Op { epoch: u64, update: OpUpdate },
}

enum OpUpdate {
    Bundled,
    Sent { receipt: Option<UserOperationReceipt>, gas_cost_usd: Option<String> },
    Deadline,
}

/// Handle to a running [`SwapService`].
#[derive(Debug, Clone)]
pub struct SwapHandle {
    commands: mpsc::UnboundedSender<SwapCommand>,
    snapshot: watch::Receiver<SwapSnapshot>,
}

impl SwapHandle {
    /// Selects the token to sell by symbol.
    pub fn select_from(&self, symbol: impl Into<String>) {
        let _ = self.commands.send(SwapCommand::SelectFrom(symbol.into()));
    }

    /// Selects the token to buy by symbol.
    pub fn select_to(&self, symbol: impl Into<String>) {
        let _ = self.commands.send(SwapCommand::SelectTo(symbol.into()));
    }

    /// Swaps the two sides of the pair.
    pub fn flip(&self) {
        let _ = self.commands.send(SwapCommand::Flip);
    }

    /// Sets the amount to sell.
    pub fn set_amount(&self, amount: impl Into<String>) {
        let _ = self.commands.send(SwapCommand::SetAmount(amount.into()));
    }

    /// Requests a quote refresh ahead of the scheduled one.
    pub fn refresh_quote(&self) {
        let _ = self.commands.send(SwapCommand::RefreshQuote);
    }

    /// Starts a gas estimate for the current form.
    ///
    /// Resolves once the estimate has been accepted for computation; the result lands in the
    /// snapshot.
    pub async fn calculate_gas(&self) -> Result<(), SwapError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(SwapCommand::CalculateGas(tx))
            .map_err(|_| SwapError::ServiceStopped)?;
        rx.await.map_err(|_| SwapError::ServiceStopped)?
    }

    /// Submits the swap backed by the held gas estimate.
    ///
    /// Resolves once the submission has been handed off; progress lands in the snapshot.
    pub async fn confirm(&self) -> Result<(), SwapError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(SwapCommand::Confirm(tx)).map_err(|_| SwapError::ServiceStopped)?;
        rx.await.map_err(|_| SwapError::ServiceStopped)?
    }

    /// Dismisses a finished swap and returns the form to editing.
    pub fn acknowledge(&self) {
        let _ = self.commands.send(SwapCommand::Acknowledge);
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> SwapSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns a watch receiver that yields every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SwapSnapshot> {
        self.snapshot.clone()
    }
}

/// The service loop behind a [`SwapHandle`].
pub struct SwapService {
    commands: mpsc::UnboundedReceiver<SwapCommand>,
    events: mpsc::UnboundedReceiver<SwapEvent>,
    coordinator: SwapCoordinator,
}

impl SwapService {
    /// Spawns the service for `account`, returning a handle to it.
    ///
    /// The first two registry tokens become the initial pair and a quote refresh for it is
    /// scheduled immediately.
    pub fn spawn(
        account: Address,
        registry: TokenRegistry,
        swap_api: Arc<dyn SwapApi>,
        prices: Arc<dyn PriceFeed>,
        bundler: Arc<dyn BundlerApi>,
        config: &WalletConfig,
    ) -> eyre::Result<SwapHandle> {
        let mut tokens = registry.iter();
        let from = tokens.next().cloned().ok_or_else(|| eyre::eyre!("token registry is empty"))?;
        let to = tokens
            .next()
            .cloned()
            .ok_or_else(|| eyre::eyre!("token registry needs at least two tokens"))?;
        drop(tokens);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let refresh_interval = config.quote.refresh_interval;
        let state = SwapSnapshot::new(from, to, refresh_interval.as_secs());
        let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());

        let coordinator = SwapCoordinator {
            account,
            registry,
            swap_api,
            prices,
            bundler,
            events: event_tx,
            snapshot_tx,
            state,
            epoch: 0,
            gas_epoch: 0,
            slippage: config.quote.slippage.clone(),
            refresh_interval,
            gas_ttl: config.quote.gas_ttl,
            poll_interval: config.ops.poll_interval,
            poll_deadline: config.ops.deadline,
            poller: None,
            metrics: QuoteFeedMetrics::default(),
        };

        tokio::spawn(Self { commands: command_rx, events: event_rx, coordinator }.run());

        Ok(SwapHandle { commands: command_tx, snapshot: snapshot_rx })
    }

    async fn run(self) {
        let Self { mut commands, mut events, mut coordinator } = self;

        let mut refresh = interval(coordinator.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut countdown =
            interval_at(Instant::now() + QUOTE_COUNTDOWN_TICK, QUOTE_COUNTDOWN_TICK);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if coordinator.on_command(command) {
                        refresh.reset();
                    }
                }
                Some(event) = events.recv() => coordinator.on_event(event),
                _ = refresh.tick() => coordinator.spawn_quote_fetch(),
                _ = countdown.tick() => coordinator.on_tick(),
            }
            coordinator.publish();
        }

        coordinator.abort_poller();
    }
}

struct SwapCoordinator {
    account: Address,
    registry: TokenRegistry,
    swap_api: Arc<dyn SwapApi>,
    prices: Arc<dyn PriceFeed>,
    bundler: Arc<dyn BundlerApi>,
    events: mpsc::UnboundedSender<SwapEvent>,
    snapshot_tx: watch::Sender<SwapSnapshot>,
    state: SwapSnapshot,
    /// Identity of the selected pair. Bumped on every pair change so results computed for a
    /// previous pair are discarded when they land.
    epoch: u64,
    /// Identity of the (pair, amount) a gas estimate was started for. Bumped on pair and
    /// amount changes.
    gas_epoch: u64,
    slippage: String,
    refresh_interval: Duration,
    gas_ttl: Duration,
    poll_interval: Duration,
    poll_deadline: Duration,
    poller: Option<JoinHandle<()>>,
    metrics: QuoteFeedMetrics,
}

impl SwapCoordinator {
    /// Applies a command, returning `true` if the pair changed and the refresh schedule
    /// should restart.
    fn on_command(&mut self, command: SwapCommand) -> bool {
        match command {
            SwapCommand::SelectFrom(symbol) => self.select_from(&symbol),
            SwapCommand::SelectTo(symbol) => self.select_to(&symbol),
            SwapCommand::Flip => self.flip(),
            SwapCommand::SetAmount(amount) => {
                self.set_amount(amount);
                false
            }
            SwapCommand::RefreshQuote => {
                self.spawn_quote_fetch();
                false
            }
            SwapCommand::CalculateGas(reply) => {
                let _ = reply.send(self.start_gas_estimate());
                false
            }
            SwapCommand::Confirm(reply) => {
                let _ = reply.send(self.confirm());
                false
            }
            SwapCommand::Acknowledge => {
                self.acknowledge();
                false
            }
        }
    }

    fn on_event(&mut self, event: SwapEvent) {
        match event {
            SwapEvent::Quote { epoch, result } => self.on_quote(epoch, result),
            SwapEvent::Gas { epoch, result } => self.on_gas(epoch, result),
            SwapEvent::Submitted { epoch, result } => self.on_submitted(epoch, result),
            SwapEvent::Op { epoch, update } => self.on_op(epoch, update),
        }
    }

    fn select_from(&mut self, symbol: &str) -> bool {
        let Some(token) = self.registry.get(symbol).cloned() else {
            debug!(symbol, "ignoring selection of unknown token");
            return false;
        };
        if token == self.state.from {
            return false;
        }
        self.state.from = token;
        self.reset_pair();
        true
    }

    fn select_to(&mut self, symbol: &str) -> bool {
        let Some(token) = self.registry.get(symbol).cloned() else {
            debug!(symbol, "ignoring selection of unknown token");
            return false;
        };
        if token == self.state.to {
            return false;
        }
        self.state.to = token;
        self.reset_pair();
        true
    }

    fn flip(&mut self) -> bool {
        std::mem::swap(&mut self.state.from, &mut self.state.to);
        self.reset_pair();
        true
    }

    /// Resets everything tied to the pair and schedules an immediate refresh.
    ///
    /// The entered amounts and the held quote are both cleared, so a value entered or a rate
    /// sampled for the previous pair can never carry over to the new one.
    fn reset_pair(&mut self) {
        self.epoch += 1;
        self.gas_epoch += 1;
        self.abort_poller();
        self.state = SwapSnapshot::new(
            self.state.from.clone(),
            self.state.to.clone(),
            self.refresh_interval.as_secs(),
        );
        self.spawn_quote_fetch();
    }

    fn set_amount(&mut self, amount: String) {
        if !matches!(self.state.stage, SwapStage::Idle | SwapStage::GasCalculated) {
            debug!(stage = ?self.state.stage, "ignoring amount edit");
            return;
        }
        if amount == self.state.amount {
            return;
        }
        self.gas_epoch += 1;
        self.state.amount = amount;
        self.state.gas = None;
        self.state.gas_fetching = false;
        self.state.stage = SwapStage::Idle;
        self.state.to_amount = self.derive_to_amount();
    }

    fn spawn_quote_fetch(&mut self) {
        if self.state.quote_fetching || self.state.from == self.state.to {
            return;
        }
        self.state.quote_fetching = true;
        self.metrics.refreshes.increment(1);

        let epoch = self.epoch;
        let events = self.events.clone();
        let api = self.swap_api.clone();
        let from = self.state.from.clone();
        let to = self.state.to.clone();
        let slippage = self.slippage.clone();
        tokio::spawn(async move {
            // The rate is probed with one whole source token.
            let probe = whole_unit(from.decimals);
            let result = api
                .swap_quote(&from, &to, probe, &slippage)
                .await
                .map(|out| format_amount(out, to.decimals).parse().unwrap_or_default());
            let _ = events.send(SwapEvent::Quote { epoch, result });
        });
    }

    fn on_quote(&mut self, epoch: u64, result: Result<f64, SwapError>) {
        if epoch != self.epoch {
            debug!("discarding quote for a previous pair");
            return;
        }
        self.state.quote_fetching = false;
        self.state.countdown = self.refresh_interval.as_secs();
        match result {
            Ok(rate) => self.state.quote = QuoteState::Ready(Quote::new(rate)),
            Err(SwapError::InsufficientLiquidity) => {
                self.state.quote = QuoteState::InsufficientLiquidity;
            }
            Err(err) => {
                self.metrics.failures.increment(1);
                warn!(%err, "quote refresh failed");
                self.state.quote = QuoteState::Unavailable;
            }
        }
        self.state.to_amount = self.derive_to_amount();
    }

    fn derive_to_amount(&self) -> String {
        let Some(rate) = self.state.quote.rate() else { return String::new() };
        let Ok(amount) = self.state.amount.trim().parse::<f64>() else { return String::new() };
        if !amount.is_finite() || amount <= 0.0 {
            return String::new();
        }
        format!("{:.*}", DISPLAY_DECIMALS as usize, amount * rate)
    }

    fn build_request(&self) -> Result<SwapRequest, SwapError> {
        if self.state.from == self.state.to {
            return Err(SwapError::IdenticalTokens);
        }
        let amount = parse_amount(&self.state.amount, self.state.from.decimals)?;
        Ok(SwapRequest {
            sender: self.account,
            from_token: self.state.from.clone(),
            to_token: self.state.to.clone(),
            amount,
            slippage: self.slippage.clone(),
        })
    }

    fn ensure_quote_ready(&self) -> Result<(), SwapError> {
        if self.state.quote_fetching {
            return Err(SwapError::QuoteRefreshing);
        }
        match self.state.quote {
            QuoteState::Ready(quote) if !quote.is_stale(self.refresh_interval) => Ok(()),
            QuoteState::Ready(_) => Err(SwapError::QuoteRefreshing),
            QuoteState::InsufficientLiquidity => Err(SwapError::InsufficientLiquidity),
            QuoteState::Empty | QuoteState::Unavailable => Err(SwapError::QuoteUnavailable),
        }
    }

    fn gate_stage(&self) -> Result<(), SwapError> {
        match self.state.stage {
            SwapStage::Idle | SwapStage::GasCalculated => Ok(()),
            SwapStage::Submitting | SwapStage::Processing => Err(SwapError::OpInFlight),
            SwapStage::Confirmed | SwapStage::Unresolved => Err(SwapError::NotReady),
        }
    }

    fn start_gas_estimate(&mut self) -> Result<(), SwapError> {
        self.gate_stage()?;
        if self.state.gas_fetching {
            return Err(SwapError::EstimateInFlight);
        }
        let request = self.build_request()?;
        self.ensure_quote_ready()?;

        self.state.gas_fetching = true;
        self.state.last_error = None;
        let epoch = self.gas_epoch;
        let events = self.events.clone();
        let api = self.swap_api.clone();
        let prices = self.prices.clone();
        tokio::spawn(async move {
            let result = estimate_with_usd(api, prices, request).await;
            let _ = events.send(SwapEvent::Gas { epoch, result });
        });
        Ok(())
    }

    fn on_gas(&mut self, epoch: u64, result: Result<GasEstimate, SwapError>) {
        if epoch != self.gas_epoch {
            debug!("discarding gas estimate for a previous request");
            return;
        }
        self.state.gas_fetching = false;
        if !matches!(self.state.stage, SwapStage::Idle | SwapStage::GasCalculated) {
            return;
        }
        match result {
            Ok(estimate) => {
                self.state.gas = Some(estimate);
                self.state.stage = SwapStage::GasCalculated;
            }
            Err(err) => {
                warn!(%err, "gas estimation failed");
                self.state.gas = None;
                self.state.stage = SwapStage::Idle;
                self.state.last_error = Some(err.to_string());
            }
        }
    }

    fn confirm(&mut self) -> Result<(), SwapError> {
        match self.state.stage {
            SwapStage::GasCalculated => {}
            SwapStage::Submitting | SwapStage::Processing => return Err(SwapError::OpInFlight),
            _ => return Err(SwapError::NotReady),
        }
        match &self.state.gas {
            Some(gas) if !gas.is_expired(self.gas_ttl) => {}
            Some(_) => {
                self.state.gas = None;
                self.state.stage = SwapStage::Idle;
                return Err(SwapError::EstimateExpired);
            }
            None => return Err(SwapError::NotReady),
        }
        let request = self.build_request()?;

        self.state.stage = SwapStage::Submitting;
        self.state.last_error = None;
        let epoch = self.epoch;
        let events = self.events.clone();
        let api = self.swap_api.clone();
        tokio::spawn(async move {
            let result = api.submit(&request).await;
            let _ = events.send(SwapEvent::Submitted { epoch, result });
        });
        Ok(())
    }

    fn on_submitted(&mut self, epoch: u64, result: Result<B256, SwapError>) {
        if epoch != self.epoch || self.state.stage != SwapStage::Submitting {
            debug!("discarding submission result for a previous swap");
            return;
        }
        match result {
            Ok(hash) => {
                self.state.stage = SwapStage::Processing;
                self.state.op_hash = Some(hash);
                self.state.op_state = Some(OpState::Pending);
                self.spawn_poller(hash);
            }
            Err(err) => {
                warn!(%err, "swap submission failed");
                self.state.stage = SwapStage::GasCalculated;
                self.state.last_error = Some(err.to_string());
            }
        }
    }

    fn spawn_poller(&mut self, hash: B256) {
        self.abort_poller();
        let poller = ReceiptPoller {
            hash,
            epoch: self.epoch,
            bundler: self.bundler.clone(),
            prices: self.prices.clone(),
            events: self.events.clone(),
            interval: self.poll_interval,
            deadline: self.poll_deadline,
            metrics: ReceiptPollerMetrics::default(),
        };
        self.poller = Some(poller.spawn());
    }

    fn on_op(&mut self, epoch: u64, update: OpUpdate) {
        if epoch != self.epoch || self.state.stage != SwapStage::Processing {
            debug!("discarding op update for a previous swap");
            return;
        }
        match update {
            OpUpdate::Bundled => self.state.op_state = Some(OpState::Bundled),
            OpUpdate::Sent { receipt, gas_cost_usd } => {
                self.state.op_state = Some(OpState::Sent);
                self.state.receipt = receipt;
                self.state.gas_cost_usd = gas_cost_usd;
                self.state.stage = SwapStage::Confirmed;
                self.poller = None;
            }
            OpUpdate::Deadline => {
                warn!(op = ?self.state.op_hash, "operation still unresolved at deadline");
                self.state.stage = SwapStage::Unresolved;
                self.poller = None;
            }
        }
    }

    fn acknowledge(&mut self) {
        if !matches!(self.state.stage, SwapStage::Confirmed | SwapStage::Unresolved) {
            return;
        }
        self.abort_poller();
        self.state.stage = SwapStage::Idle;
        self.state.amount.clear();
        self.state.to_amount.clear();
        self.state.gas = None;
        self.state.op_hash = None;
        self.state.op_state = None;
        self.state.receipt = None;
        self.state.gas_cost_usd = None;
        self.state.last_error = None;
    }

    fn on_tick(&mut self) {
        self.state.countdown = if self.state.countdown == 0 {
            self.refresh_interval.as_secs()
        } else {
            self.state.countdown - 1
        };
        // A held estimate only survives its validity window while the form is editable.
        if matches!(self.state.stage, SwapStage::Idle | SwapStage::GasCalculated)
            && let Some(gas) = &self.state.gas
            && gas.is_expired(self.gas_ttl)
        {
            self.state.gas = None;
            self.state.stage = SwapStage::Idle;
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.clone());
    }

    fn abort_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

async fn estimate_with_usd(
    api: Arc<dyn SwapApi>,
    prices: Arc<dyn PriceFeed>,
    request: SwapRequest,
) -> Result<GasEstimate, SwapError> {
    let breakdown = api.estimate_gas(&request).await?;
    let total_native = format_amount(breakdown.total_gas, NATIVE_GAS_DECIMALS);
    let total_usd = match prices.usd_price(NATIVE_GAS_TOKEN).await {
        Ok(price) => {
            let native: f64 = total_native.parse().unwrap_or_default();
            format_amount_to_usd(native, price)
        }
        Err(err) => {
            debug!(%err, "failed to price gas estimate");
            String::new()
        }
    };
    Ok(GasEstimate {
        total_gas: breakdown.total_gas,
        total_native,
        total_usd,
        actions: breakdown.actions,
        computed_at: Instant::now(),
    })
}
