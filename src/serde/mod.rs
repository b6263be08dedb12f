//! Serde helpers.

pub mod duration;
pub mod duration_ms;
pub mod topic_address;
