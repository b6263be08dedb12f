//! Tests of the portfolio service: balance walks, history normalization and coalescing.

mod common;

use chrono::Utc;
use common::*;
use eolia_wallet::{config::WalletConfig, types::TxRecord};
use std::{sync::atomic::Ordering, time::Duration};

fn config() -> WalletConfig {
    WalletConfig::default()
}

fn record(from: &str, from_amount: &str, to: &str, to_amount: &str) -> TxRecord {
    TxRecord {
        dex_name: "OKX DEX".to_string(),
        from_token: from.to_string(),
        from_amount: from_amount.to_string(),
        to_token: to.to_string(),
        to_amount: to_amount.to_string(),
        timestamp: Utc::now(),
    }
}

#[tokio::test(start_paused = true)]
async fn balances_follow_registry_order_with_degraded_zeros() {
    let config = config();
    let wokb = config.registry.get("WOKB").unwrap().address;
    let weth = config.registry.get("WETH").unwrap().address;
    let usdt = config.registry.get("USDT").unwrap().address;
    let usdc = config.registry.get("USDC").unwrap().address;
    let fixture = spawn_portfolio(
        MockBalanceReader::default()
            .with_balance(wokb, 2.0)
            .with_failure(weth)
            .with_balance(usdt, 100.0)
            .with_balance(usdc, 200.0),
        MockPriceFeed::default().with_price(wokb, 5.0),
        MockBackend::default(),
        &config,
    );
    let mut rx = fixture.handle.subscribe();

    fixture.handle.refresh_balances(account());
    let snapshot = wait_for(&mut rx, |s| !s.balances.is_empty()).await;

    let symbols: Vec<&str> = snapshot.balances.iter().map(|b| b.symbol.as_str()).collect();
    assert_eq!(symbols, ["WOKB", "WETH", "USDT", "USDC"]);

    // The unreadable token is reported as a zero row rather than dropped.
    assert_eq!(snapshot.balances[1].balance, 0.0);
    assert_eq!(snapshot.balances[1].usd_value, 0.0);

    assert_eq!(snapshot.balances[0].usd_value, 10.0);
    assert_eq!(snapshot.total_usd, 310.0);
    assert!(!snapshot.balances_refreshing);
}

#[tokio::test(start_paused = true)]
async fn balance_walk_spaces_out_lookups() {
    let config = config();
    let fixture = spawn_portfolio(
        MockBalanceReader::default(),
        MockPriceFeed::default(),
        MockBackend::default(),
        &config,
    );
    let mut rx = fixture.handle.subscribe();

    let started = tokio::time::Instant::now();
    fixture.handle.refresh_balances(account());
    wait_for(&mut rx, |s| s.balances.len() == 4 && !s.balances_refreshing).await;

    // Four tokens at 200ms apiece.
    assert!(started.elapsed() >= Duration::from_millis(800));
    assert_eq!(fixture.reader.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn history_amounts_are_normalized_for_known_tokens() {
    let config = config();
    let fixture = spawn_portfolio(
        MockBalanceReader::default(),
        MockPriceFeed::default(),
        MockBackend::default().with_history(vec![
            record("WOKB", "1234567890000000000", "USDT", "2500000"),
            record("DOGE", "42000000", "WETH", "1000000000000000000"),
        ]),
        &config,
    );
    let mut rx = fixture.handle.subscribe();

    fixture.handle.refresh_history();
    let snapshot = wait_for(&mut rx, |s| !s.history.is_empty()).await;

    assert_eq!(snapshot.history.len(), 2);
    assert_eq!(snapshot.history[0].from_amount, "1.234567");
    assert_eq!(snapshot.history[0].to_amount, "2.5");
    // Symbols outside the registry pass through untouched.
    assert_eq!(snapshot.history[1].from_amount, "42000000");
    assert_eq!(snapshot.history[1].to_amount, "1");
    assert!(snapshot.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn history_failure_surfaces_error() {
    let config = config();
    let fixture = spawn_portfolio(
        MockBalanceReader::default(),
        MockPriceFeed::default(),
        MockBackend::default().failing_history(),
        &config,
    );
    let mut rx = fixture.handle.subscribe();

    fixture.handle.refresh_history();
    let snapshot = wait_for(&mut rx, |s| s.last_error.is_some()).await;
    assert!(snapshot.history.is_empty());
    assert!(!snapshot.history_refreshing);
}

#[tokio::test(start_paused = true)]
async fn balance_refreshes_coalesce() {
    let config = config();
    let fixture = spawn_portfolio(
        MockBalanceReader::default(),
        MockPriceFeed::default(),
        MockBackend::default(),
        &config,
    );
    let mut rx = fixture.handle.subscribe();

    // The second request lands while the walk is in flight and is dropped.
    fixture.handle.refresh_balances(account());
    fixture.handle.refresh_balances(account());
    wait_for(&mut rx, |s| s.balances.len() == 4 && !s.balances_refreshing).await;
    assert_eq!(fixture.reader.calls.load(Ordering::SeqCst), 4);

    // Once idle a new request starts a fresh walk.
    fixture.handle.refresh_balances(account());
    wait_for(&mut rx, |s| s.balances_refreshing).await;
    wait_for(&mut rx, |s| !s.balances_refreshing).await;
    assert_eq!(fixture.reader.calls.load(Ordering::SeqCst), 8);
}
