//! Error types for ledger operations.

use thiserror::Error;

use crate::Amount;
use crate::model::{AccountId, TxId};

/// Failure of a ledger operation. Nothing is applied when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("invalid amount {0}")]
    InvalidAmount(Amount),

    #[error("insufficient funds in account {0}: available {1}, requested {2}")]
    InsufficientFunds(AccountId, Amount, Amount),

    #[error("cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    #[error("transaction id sequence exhausted")]
    SequenceExhausted,
}

/// Reasons a snapshot cannot be restored into a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("account {0} appears more than once")]
    DuplicateAccount(AccountId),

    #[error("account {0} has negative balance {1}")]
    NegativeBalance(AccountId, Amount),

    #[error("next transaction id must be at least 1, got {0}")]
    InvalidSequence(TxId),
}
