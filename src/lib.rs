//! # Eolia Wallet
//!
//! Headless session engine for the Eolia self-custodial smart wallet.

pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod portfolio;
pub mod serde;
pub mod session;
pub mod swap;
pub mod types;
pub mod upstream;
