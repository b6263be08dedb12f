//! Shared primitive types.
mod account;
pub use account::*;

mod erc20;
pub use erc20::*;

mod gas;
pub use gas::*;

mod history;
pub use history::*;

mod op;
pub use op::*;

mod quote;
pub use quote::*;

mod swap;
pub use swap::*;

mod token;
pub use token::*;

mod units;
pub use units::*;
