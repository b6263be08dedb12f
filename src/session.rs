//! Session lifecycle.
//!
//! A [`Session`] owns the connection to the backend and decides which screen the embedder
//! should show: resuming a stored cookie, collecting credentials, registering a wallet name,
//! or the wallet itself. Logging in spawns the swap and portfolio services; logging out
//! drops their handles, which winds the service loops down.

use crate::{
    config::WalletConfig,
    constants::{WALLET_NAME_MAX_LEN, WALLET_NAME_MIN_LEN},
    error::{AuthError, WalletError},
    portfolio::{PortfolioHandle, PortfolioService},
    swap::{SwapHandle, SwapService},
    types::{AuthCredentials, Profile, RegisterRequest},
    upstream::{
        BackendApi, BackendClient, BalanceReader, BundlerApi, BundlerClient, ChainReader,
        OkxDexClient, PriceFeed, SwapApi,
    },
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Where the session stands in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPhase {
    /// Resuming from a stored cookie.
    Checking,
    /// No session is open; credentials are needed.
    NeedsAuth,
    /// The credentials are valid but no account exists for them yet.
    NeedsRegister,
    /// Logged in.
    Ready(Profile),
}

/// Handles to the services running for a logged-in session.
#[derive(Debug, Clone)]
pub struct SessionServices {
    /// The swap workflow.
    pub swap: SwapHandle,
    /// Balances and history.
    pub portfolio: PortfolioHandle,
}

/// A wallet session.
pub struct Session {
    config: WalletConfig,
    backend: Arc<dyn BackendApi>,
    swap_api: Arc<dyn SwapApi>,
    prices: Arc<dyn PriceFeed>,
    bundler: Arc<dyn BundlerApi>,
    balances: Arc<dyn BalanceReader>,
    phase: AuthPhase,
    services: Option<SessionServices>,
}

impl Session {
    /// Create a session wired to the services named in `config`.
    pub fn new(config: WalletConfig) -> eyre::Result<Self> {
        let backend = Arc::new(BackendClient::new(config.backend_url.as_str())?);
        let dex = Arc::new(OkxDexClient::new(config.dex_url.as_str(), config.chain_id));
        let bundler = Arc::new(BundlerClient::new(config.bundler_url.as_str()));
        let chain = Arc::new(ChainReader::new(config.rpc_url.clone()));
        Ok(Self::from_parts(config, backend, dex.clone(), dex, bundler, chain))
    }

    /// Create a session from caller-supplied service implementations.
    pub fn from_parts(
        config: WalletConfig,
        backend: Arc<dyn BackendApi>,
        swap_api: Arc<dyn SwapApi>,
        prices: Arc<dyn PriceFeed>,
        bundler: Arc<dyn BundlerApi>,
        balances: Arc<dyn BalanceReader>,
    ) -> Self {
        Self {
            config,
            backend,
            swap_api,
            prices,
            bundler,
            balances,
            phase: AuthPhase::Checking,
            services: None,
        }
    }

    /// Resumes the session, trying the stored cookie first and `credentials` second.
    pub async fn resume(
        &mut self,
        credentials: Option<&AuthCredentials>,
    ) -> Result<&AuthPhase, WalletError> {
        self.phase = AuthPhase::Checking;
        match self.backend.me().await {
            Ok(profile) => self.finish_login(profile).await?,
            Err(err) => {
                debug!(%err, "no resumable session");
                let Some(credentials) = credentials else {
                    self.phase = AuthPhase::NeedsAuth;
                    return Ok(&self.phase);
                };
                match self.backend.login(credentials).await {
                    Ok(profile) => self.finish_login(profile).await?,
                    Err(AuthError::UnknownAccount) => self.phase = AuthPhase::NeedsRegister,
                    Err(err) => {
                        self.phase = AuthPhase::NeedsAuth;
                        return Err(err.into());
                    }
                }
            }
        }
        Ok(&self.phase)
    }

    /// Registers a new account under `name` and opens a session for it.
    pub async fn register(
        &mut self,
        credentials: &AuthCredentials,
        name: &str,
        profile_image_url: Option<String>,
    ) -> Result<Profile, WalletError> {
        validate_wallet_name(name)?;
        if self.backend.wallet_name_occupied(name).await? {
            return Err(AuthError::NameTaken(name.to_string()).into());
        }

        let request = RegisterRequest {
            auth_provider: credentials.provider.clone(),
            auth_external_id: credentials.external_id.clone(),
            wallet_name: name.to_string(),
            profile_image_url,
        };
        let profile = self.backend.register(&request).await?;
        self.finish_login(profile.clone()).await?;
        Ok(profile)
    }

    /// Closes the session and tears down its services.
    pub async fn logout(&mut self) {
        if let Err(err) = self.backend.logout().await {
            debug!(%err, "backend logout failed");
        }
        self.services = None;
        self.phase = AuthPhase::NeedsAuth;
    }

    /// Where the session stands.
    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    /// Handles to the running services, present once the session is [`AuthPhase::Ready`].
    pub fn services(&self) -> Option<&SessionServices> {
        self.services.as_ref()
    }

    async fn finish_login(&mut self, profile: Profile) -> Result<(), WalletError> {
        // Sanity check that the bundler settles on the configured chain.
        match self.bundler.chain_id().await {
            Ok(chain) if chain != self.config.chain_id => {
                warn!(
                    configured = self.config.chain_id,
                    reported = chain,
                    "bundler settles on a different chain"
                );
            }
            Ok(_) => {}
            Err(err) => debug!(%err, "bundler chain check failed"),
        }

        let swap = SwapService::spawn(
            profile.account_address,
            self.config.registry.clone(),
            self.swap_api.clone(),
            self.prices.clone(),
            self.bundler.clone(),
            &self.config,
        )?;
        let portfolio = PortfolioService::spawn(
            self.config.registry.clone(),
            self.balances.clone(),
            self.prices.clone(),
            self.backend.clone(),
            &self.config,
        );
        portfolio.refresh_balances(profile.account_address);
        portfolio.refresh_history();

        self.services = Some(SessionServices { swap, portfolio });
        self.phase = AuthPhase::Ready(profile);
        Ok(())
    }
}

/// Validates a wallet name.
///
/// Names are 3 to 20 characters from `[A-Za-z0-9_.-]`.
pub fn validate_wallet_name(name: &str) -> Result<(), AuthError> {
    if !(WALLET_NAME_MIN_LEN..=WALLET_NAME_MAX_LEN).contains(&name.len()) {
        return Err(AuthError::InvalidName);
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-')) {
        return Err(AuthError::InvalidName);
    }
    Ok(())
}
