//! Core domain types for the ledger.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Amount;

/// Transaction identifier, issued by the ledger in strictly increasing order.
pub type TxId = u64;

/// Opaque account identifier, assigned by the ledger when an account is opened.
///
/// Ids order naturally: a trailing run of digits compares by numeric value, so
/// `user-2` sorts before `user-10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub(crate) fn from_sequence(seq: u64) -> Self {
        AccountId(format!("user-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AccountId {
    /// Split into the text before the trailing digits and the digits without
    /// leading zeros.
    fn sort_key(&self) -> (&str, usize, &str, &str) {
        let prefix = self.0.trim_end_matches(|c: char| c.is_ascii_digit());
        let digits = &self.0[prefix.len()..];
        let significant = digits.trim_start_matches('0');
        (prefix, significant.len(), significant, digits)
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId::new(id)
    }
}

/// The kind of money movement a [`TransactionRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// Immutable record of an applied money movement.
///
/// `source` is set for withdrawals and transfers, `destination` for deposits
/// and transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    id: TxId,
    kind: TransactionKind,
    amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    destination: Option<AccountId>,
}

impl TransactionRecord {
    pub(crate) fn deposit(id: TxId, destination: AccountId, amount: Amount) -> Self {
        Self {
            id,
            kind: TransactionKind::Deposit,
            amount,
            source: None,
            destination: Some(destination),
        }
    }

    pub(crate) fn withdraw(id: TxId, source: AccountId, amount: Amount) -> Self {
        Self {
            id,
            kind: TransactionKind::Withdraw,
            amount,
            source: Some(source),
            destination: None,
        }
    }

    pub(crate) fn transfer(
        id: TxId,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Self {
        Self {
            id,
            kind: TransactionKind::Transfer,
            amount,
            source: Some(source),
            destination: Some(destination),
        }
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn source(&self) -> Option<&AccountId> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&AccountId> {
        self.destination.as_ref()
    }
}

/// A request against the ledger, as submitted by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a new account; `None` uses the configured opening balance.
    Open {
        display_name: String,
        opening_balance: Option<Amount>,
    },
    /// Credit an account.
    Deposit { account: AccountId, amount: Amount },
    /// Debit an account.
    Withdraw { account: AccountId, amount: Amount },
    /// Move funds between two distinct accounts.
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
}
