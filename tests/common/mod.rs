//! Shared mocks and fixtures for the integration tests.
#![allow(dead_code)]

use alloy::primitives::{Address, B256, ChainId, U256};
use async_trait::async_trait;
use eolia_wallet::{
    config::WalletConfig,
    error::{ApiError, AuthError, OpError, SwapError},
    portfolio::{PortfolioHandle, PortfolioService},
    swap::{SwapHandle, SwapService},
    types::{
        AuthCredentials, GasBreakdown, OpPoll, OpState, Profile, RegisterRequest, SwapRequest,
        Token, TxRecord, UserOperationReceipt,
    },
    upstream::{BackendApi, BalanceReader, BundlerApi, PriceFeed, SwapApi},
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::watch;

/// The account used across tests.
pub fn account() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn profile() -> Profile {
    Profile {
        wallet_name: "alice".to_string(),
        account_address: account(),
        profile_image_url: None,
        auth_provider: "google".to_string(),
        auth_external_id: "google-123".to_string(),
        last_login: None,
        created_at: None,
    }
}

pub fn credentials() -> AuthCredentials {
    AuthCredentials::new("google", "google-123")
}

pub fn receipt(hash: B256) -> UserOperationReceipt {
    UserOperationReceipt {
        user_op_hash: hash,
        sender: account(),
        nonce: U256::ZERO,
        paymaster: None,
        success: true,
        // 0.002 native tokens.
        actual_gas_cost: U256::from(2_000_000_000_000_000u64),
        actual_gas_used: U256::from(120_000u64),
        receipt: None,
    }
}

pub fn poll(hash: B256, state: OpState) -> OpPoll {
    OpPoll { op_hash: hash, state, receipt: None }
}

pub fn poll_sent(hash: B256) -> OpPoll {
    OpPoll { op_hash: hash, state: OpState::Sent, receipt: Some(receipt(hash)) }
}

/// Waits until the watched value satisfies `predicate`, returning the first match.
pub async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<T>,
    mut predicate: impl FnMut(&T) -> bool,
) -> T {
    let waited = tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("service stopped");
        }
    })
    .await;
    waited.expect("condition not reached before timeout")
}

/// Swap API stub with keyed rates and scriptable failures.
pub struct MockSwapApi {
    /// Base units of the destination token returned for a whole-unit probe, keyed by pair.
    pub quotes: Mutex<HashMap<(Address, Address), U256>>,
    /// Pairs reported as having no liquidity.
    pub illiquid: Mutex<HashSet<(Address, Address)>>,
    /// Delay applied to every quote call.
    pub quote_delay: Duration,
    /// Gas returned by estimates.
    pub gas_total: U256,
    /// Whether estimates fail.
    pub fail_gas: bool,
    /// Hash returned on submission; `None` makes submissions fail.
    pub submit_result: Option<B256>,
    pub quote_calls: AtomicUsize,
    pub estimate_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
}

impl Default for MockSwapApi {
    fn default() -> Self {
        Self {
            quotes: Mutex::new(HashMap::new()),
            illiquid: Mutex::new(HashSet::new()),
            quote_delay: Duration::ZERO,
            // 0.002 native tokens.
            gas_total: U256::from(2_000_000_000_000_000u64),
            fail_gas: false,
            submit_result: Some(B256::repeat_byte(0x11)),
            quote_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
        }
    }
}

impl MockSwapApi {
    pub fn with_rate(self, from: Address, to: Address, out: U256) -> Self {
        self.quotes.lock().unwrap().insert((from, to), out);
        self
    }

    pub fn with_illiquid(self, from: Address, to: Address) -> Self {
        self.illiquid.lock().unwrap().insert((from, to));
        self
    }

    pub fn with_quote_delay(mut self, delay: Duration) -> Self {
        self.quote_delay = delay;
        self
    }

    pub fn failing_gas(mut self) -> Self {
        self.fail_gas = true;
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.submit_result = None;
        self
    }
}

#[async_trait]
impl SwapApi for MockSwapApi {
    async fn swap_quote(
        &self,
        from: &Token,
        to: &Token,
        _amount: U256,
        _slippage: &str,
    ) -> Result<U256, SwapError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if !self.quote_delay.is_zero() {
            tokio::time::sleep(self.quote_delay).await;
        }
        if self.illiquid.lock().unwrap().contains(&(from.address, to.address)) {
            return Err(SwapError::InsufficientLiquidity);
        }
        self.quotes
            .lock()
            .unwrap()
            .get(&(from.address, to.address))
            .copied()
            .ok_or(SwapError::QuoteUnavailable)
    }

    async fn estimate_gas(&self, _request: &SwapRequest) -> Result<GasBreakdown, SwapError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_gas {
            return Err(
                ApiError::Upstream { code: "50000".into(), message: "estimate failed".into() }
                    .into(),
            );
        }
        Ok(GasBreakdown { total_gas: self.gas_total, actions: Vec::new() })
    }

    async fn submit(&self, _request: &SwapRequest) -> Result<B256, SwapError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.submit_result {
            Some(hash) => Ok(hash),
            None => Err(ApiError::Upstream { code: "50011".into(), message: "rejected".into() }
                .into()),
        }
    }
}

/// Price feed stub. Unknown tokens price at 1.0.
#[derive(Default)]
pub struct MockPriceFeed {
    pub prices: Mutex<HashMap<Address, f64>>,
    pub failing: Mutex<HashSet<Address>>,
    pub calls: AtomicUsize,
}

impl MockPriceFeed {
    pub fn with_price(self, token: Address, price: f64) -> Self {
        self.prices.lock().unwrap().insert(token, price);
        self
    }

    pub fn with_failure(self, token: Address) -> Self {
        self.failing.lock().unwrap().insert(token);
        self
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn usd_price(&self, token: Address) -> Result<f64, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&token) {
            return Err(ApiError::MissingData { endpoint: "/market/price".to_string() });
        }
        Ok(self.prices.lock().unwrap().get(&token).copied().unwrap_or(1.0))
    }
}

/// Bundler stub that replays a scripted sequence of poll results.
///
/// The states are returned in order and the final one repeats; an empty script reports the
/// operation pending forever.
pub struct MockBundler {
    pub states: Mutex<VecDeque<OpPoll>>,
    pub receipt_calls: AtomicUsize,
    pub chain: ChainId,
}

impl Default for MockBundler {
    fn default() -> Self {
        Self { states: Mutex::new(VecDeque::new()), receipt_calls: AtomicUsize::new(0), chain: 196 }
    }
}

impl MockBundler {
    pub fn with_states(self, states: impl IntoIterator<Item = OpPoll>) -> Self {
        self.states.lock().unwrap().extend(states);
        self
    }
}

#[async_trait]
impl BundlerApi for MockBundler {
    async fn op_receipt(&self, op_hash: B256) -> Result<OpPoll, OpError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        let mut states = self.states.lock().unwrap();
        if states.len() > 1 {
            Ok(states.pop_front().unwrap())
        } else if let Some(last) = states.front() {
            Ok(last.clone())
        } else {
            Ok(poll(op_hash, OpState::Pending))
        }
    }

    async fn chain_id(&self) -> Result<ChainId, OpError> {
        Ok(self.chain)
    }
}

/// Balance reader stub. Unknown tokens read as zero.
#[derive(Default)]
pub struct MockBalanceReader {
    pub balances: Mutex<HashMap<Address, f64>>,
    pub failing: Mutex<HashSet<Address>>,
    pub calls: AtomicUsize,
}

impl MockBalanceReader {
    pub fn with_balance(self, token: Address, balance: f64) -> Self {
        self.balances.lock().unwrap().insert(token, balance);
        self
    }

    pub fn with_failure(self, token: Address) -> Self {
        self.failing.lock().unwrap().insert(token);
        self
    }
}

#[async_trait]
impl BalanceReader for MockBalanceReader {
    async fn token_balance(&self, _account: Address, token: &Token) -> Result<f64, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&token.address) {
            return Err(ApiError::MissingData { endpoint: "balanceOf".to_string() });
        }
        Ok(self.balances.lock().unwrap().get(&token.address).copied().unwrap_or(0.0))
    }
}

/// Backend stub keyed by preloaded responses.
#[derive(Default)]
pub struct MockBackend {
    /// Profile returned by `me`; `None` reports no session.
    pub me_result: Mutex<Option<Profile>>,
    /// Profile returned by `login`; `None` reports an unknown account.
    pub login_result: Mutex<Option<Profile>>,
    /// Profile returned by `register`; `None` reports the name taken.
    pub register_result: Mutex<Option<Profile>>,
    pub occupied: Mutex<HashSet<String>>,
    pub history: Mutex<Vec<TxRecord>>,
    pub history_fails: Mutex<bool>,
    pub me_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl MockBackend {
    pub fn with_me(self, profile: Profile) -> Self {
        *self.me_result.lock().unwrap() = Some(profile);
        self
    }

    pub fn with_login(self, profile: Profile) -> Self {
        *self.login_result.lock().unwrap() = Some(profile);
        self
    }

    pub fn with_register(self, profile: Profile) -> Self {
        *self.register_result.lock().unwrap() = Some(profile);
        self
    }

    pub fn with_occupied(self, name: &str) -> Self {
        self.occupied.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn with_history(self, records: Vec<TxRecord>) -> Self {
        *self.history.lock().unwrap() = records;
        self
    }

    pub fn failing_history(self) -> Self {
        *self.history_fails.lock().unwrap() = true;
        self
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn me(&self) -> Result<Profile, AuthError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.me_result.lock().unwrap().clone().ok_or(AuthError::Unauthorized)
    }

    async fn login(&self, _credentials: &AuthCredentials) -> Result<Profile, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_result.lock().unwrap().clone().ok_or(AuthError::UnknownAccount)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Profile, AuthError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.register_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthError::NameTaken(request.wallet_name.clone()))
    }

    async fn wallet_name_occupied(&self, name: &str) -> Result<bool, AuthError> {
        Ok(self.occupied.lock().unwrap().contains(name))
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn tx_history(&self) -> Result<Vec<TxRecord>, ApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if *self.history_fails.lock().unwrap() {
            return Err(ApiError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                endpoint: "/txHistory".to_string(),
            });
        }
        Ok(self.history.lock().unwrap().clone())
    }
}

pub struct SwapFixture {
    pub api: Arc<MockSwapApi>,
    pub prices: Arc<MockPriceFeed>,
    pub bundler: Arc<MockBundler>,
    pub handle: SwapHandle,
}

pub fn spawn_swap(
    api: MockSwapApi,
    prices: MockPriceFeed,
    bundler: MockBundler,
    config: &WalletConfig,
) -> SwapFixture {
    let api = Arc::new(api);
    let prices = Arc::new(prices);
    let bundler = Arc::new(bundler);
    let handle = SwapService::spawn(
        account(),
        config.registry.clone(),
        api.clone(),
        prices.clone(),
        bundler.clone(),
        config,
    )
    .expect("swap service should spawn");
    SwapFixture { api, prices, bundler, handle }
}

pub struct PortfolioFixture {
    pub reader: Arc<MockBalanceReader>,
    pub prices: Arc<MockPriceFeed>,
    pub backend: Arc<MockBackend>,
    pub handle: PortfolioHandle,
}

pub fn spawn_portfolio(
    reader: MockBalanceReader,
    prices: MockPriceFeed,
    backend: MockBackend,
    config: &WalletConfig,
) -> PortfolioFixture {
    let reader = Arc::new(reader);
    let prices = Arc::new(prices);
    let backend = Arc::new(backend);
    let handle = PortfolioService::spawn(
        config.registry.clone(),
        reader.clone(),
        prices.clone(),
        backend.clone(),
        config,
    );
    PortfolioFixture { reader, prices, backend, handle }
}
