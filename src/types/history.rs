use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed swap from the account's history, as reported by the backend.
///
/// Amounts arrive in base units and are normalized for display by the portfolio service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    /// The venue the swap executed on.
    pub dex_name: String,
    /// Symbol of the token sold.
    pub from_token: String,
    /// Amount sold.
    pub from_amount: String,
    /// Symbol of the token bought.
    pub to_token: String,
    /// Amount bought.
    pub to_amount: String,
    /// When the swap executed.
    pub timestamp: DateTime<Utc>,
}
