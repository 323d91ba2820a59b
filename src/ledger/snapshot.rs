use serde::{Deserialize, Serialize};

use super::Account;
use crate::model::TxId;

/// Point-in-time copy of a ledger, for a persistence layer to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub accounts: Vec<Account>,
    pub next_transaction_id: TxId,
    #[serde(default = "first_seq")]
    pub next_account_seq: u64,
}

fn first_seq() -> u64 {
    1
}
