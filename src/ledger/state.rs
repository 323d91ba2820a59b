use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::LedgerError;
use crate::Amount;
use crate::model::{AccountId, TxId};

/// An account with its display name and balance.
///
/// Callers only ever hold copies; the balance of the live account is owned by
/// the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    display_name: String,
    balance: Amount,
}

impl Account {
    pub(crate) fn new(id: AccountId, display_name: String, balance: Amount) -> Self {
        Self {
            id,
            display_name,
            balance,
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub(crate) fn set_balance(&mut self, balance: Amount) {
        self.balance = balance;
    }
}

/// Everything guarded by the ledger lock.
#[derive(Debug)]
pub(crate) struct LedgerState {
    pub accounts: BTreeMap<AccountId, Account>,
    /// Id the next applied mutation will receive.
    pub next_tx: TxId,
    /// Sequence number for the next generated account id.
    pub next_account_seq: u64,
}

impl LedgerState {
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            next_tx: 1,
            next_account_seq: 1,
        }
    }

    pub fn account(&self, id: &AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))
    }

    pub fn account_mut(&mut self, id: &AccountId) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))
    }

    /// Take the next transaction id. Call after every other check has passed
    /// and before any balance is written; on error the sequence is untouched.
    pub fn issue_tx_id(&mut self) -> Result<TxId, LedgerError> {
        let id = self.next_tx;
        self.next_tx = id.checked_add(1).ok_or(LedgerError::SequenceExhausted)?;
        Ok(id)
    }

    /// Allocate an account id no existing account uses.
    ///
    /// The sequence wraps back to 1 past `u64::MAX`; taken ids are skipped, so
    /// ids stay unique as long as accounts are never removed.
    pub fn allocate_account_id(&mut self) -> AccountId {
        loop {
            let id = AccountId::from_sequence(self.next_account_seq);
            self.next_account_seq = self.next_account_seq.checked_add(1).unwrap_or(1);
            if !self.accounts.contains_key(&id) {
                return id;
            }
        }
    }
}
