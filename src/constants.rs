//! Wallet constants.

use alloy::primitives::{Address, ChainId, address};
use std::time::Duration;

/// Interval between automatic quote refreshes for the selected pair.
pub const QUOTE_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Tick driving the refresh countdown shown next to the quote.
pub const QUOTE_COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Lifetime of a gas estimate before it must be recomputed.
///
/// Enforced on the countdown tick and again at submission, so an estimate is
/// never acted on past its window even between ticks.
pub const GAS_ESTIMATE_TTL: Duration = Duration::from_secs(15);

/// Interval between bundler receipt polls for an in-flight operation.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Wall-clock bound on receipt polling before an operation is surfaced as
/// unresolved instead of being tracked forever.
pub const RECEIPT_POLL_DEADLINE: Duration = Duration::from_secs(120);

/// Pause between per-token balance reads, bounding the request rate against the
/// RPC node and the price endpoint.
pub const BALANCE_FETCH_SPACING: Duration = Duration::from_millis(200);

/// Default slippage tolerance forwarded to the aggregator.
pub const DEFAULT_SLIPPAGE: &str = "0.005";

/// X Layer mainnet chain id.
pub const XLAYER_CHAIN_ID: ChainId = 196;

/// The public X Layer RPC URL.
///
/// This endpoint is rate-limited.
pub const XLAYER_PUBLIC_RPC_URL: &str = "https://rpc.xlayer.tech";

/// Wrapped OKB on X Layer. Gas costs are denominated in it.
pub const NATIVE_GAS_TOKEN: Address = address!("0xe538905cf8410324e03a5a23c1c177a474d59b2b");

/// Decimals of the native gas token.
pub const NATIVE_GAS_DECIMALS: u8 = 18;

/// Maximum decimal places shown for quoted and derived amounts.
pub const DISPLAY_DECIMALS: u32 = 6;

/// Minimum wallet name length accepted at registration.
pub const WALLET_NAME_MIN_LEN: usize = 3;

/// Maximum wallet name length accepted at registration.
pub const WALLET_NAME_MAX_LEN: usize = 20;
