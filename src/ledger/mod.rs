//! The ledger engine.
//!
//! The ledger owns every account and the transaction sequence. All operations
//! run inside a single critical section: they validate first, then issue a
//! transaction id and write the new balances. A failed operation therefore
//! changes nothing and consumes no id, and concurrent callers observe one
//! serial order of operations.
//! Also supports an async stream of commands.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::Amount;
use crate::config::LedgerConfig;
use crate::model::{AccountId, Command, TransactionRecord};

mod state;
use state::LedgerState;
pub use state::Account;

mod error;
pub use error::{LedgerError, SnapshotError};

mod snapshot;
pub use snapshot::LedgerSnapshot;

/// An in-memory account ledger.
///
/// `Ledger` is `Sync`; share it between threads or tasks behind an `Arc`.
pub struct Ledger {
    config: LedgerConfig,
    state: Mutex<LedgerState>,
}

/// Result of a successfully executed [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Opened(Account),
    Recorded(TransactionRecord),
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LedgerState::new()),
        }
    }

    /// Rebuild a ledger from a snapshot taken by [`Ledger::snapshot`].
    pub fn restore(
        snapshot: LedgerSnapshot,
        config: LedgerConfig,
    ) -> Result<Self, SnapshotError> {
        if snapshot.next_transaction_id == 0 {
            return Err(SnapshotError::InvalidSequence(0));
        }

        let mut accounts = BTreeMap::new();
        for account in snapshot.accounts {
            if account.balance().is_negative() {
                return Err(SnapshotError::NegativeBalance(
                    account.id().clone(),
                    account.balance(),
                ));
            }
            let id = account.id().clone();
            if accounts.insert(id.clone(), account).is_some() {
                return Err(SnapshotError::DuplicateAccount(id));
            }
        }

        let state = LedgerState {
            accounts,
            next_tx: snapshot.next_transaction_id,
            next_account_seq: snapshot.next_account_seq.max(1),
        };
        Ok(Self {
            config,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open an account credited with the configured opening balance.
    pub fn create_account(&self, display_name: impl Into<String>) -> Account {
        self.open(display_name.into(), self.config.opening_balance())
    }

    /// Open an account with an explicit opening balance, which must not be negative.
    pub fn create_account_with_balance(
        &self,
        display_name: impl Into<String>,
        opening_balance: Amount,
    ) -> Result<Account, LedgerError> {
        if opening_balance.is_negative() {
            return Err(LedgerError::InvalidAmount(opening_balance));
        }
        Ok(self.open(display_name.into(), opening_balance))
    }

    pub fn balance(&self, account: &AccountId) -> Result<Amount, LedgerError> {
        Ok(self.lock().account(account)?.balance())
    }

    pub fn account(&self, account: &AccountId) -> Result<Account, LedgerError> {
        self.lock().account(account).cloned()
    }

    /// Return a consistent view of all accounts, ordered by id.
    pub fn accounts(&self) -> Vec<Account> {
        self.lock().accounts.values().cloned().collect()
    }

    /// Sum of all balances, taken atomically. `None` if the sum does not fit
    /// in an [`Amount`].
    pub fn total_balance(&self) -> Option<Amount> {
        self.lock()
            .accounts
            .values()
            .map(Account::balance)
            .try_fold(Amount::ZERO, Amount::checked_add)
    }

    /// Credit `amount` to an account.
    pub fn deposit(
        &self,
        account: &AccountId,
        amount: Amount,
    ) -> Result<TransactionRecord, LedgerError> {
        let mut state = self.lock();
        let balance = state.account(account)?.balance();
        Self::ensure_positive(amount)?;

        let credited = balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;

        let id = state.issue_tx_id()?;
        state.account_mut(account)?.set_balance(credited);
        Ok(TransactionRecord::deposit(id, account.clone(), amount))
    }

    /// Debit `amount` from an account, which must hold at least that much.
    pub fn withdraw(
        &self,
        account: &AccountId,
        amount: Amount,
    ) -> Result<TransactionRecord, LedgerError> {
        let mut state = self.lock();
        let available = state.account(account)?.balance();
        Self::ensure_positive(amount)?;

        if available < amount {
            return Err(LedgerError::InsufficientFunds(
                account.clone(),
                available,
                amount,
            ));
        }
        let debited = Self::debit(available, amount)?;

        let id = state.issue_tx_id()?;
        state.account_mut(account)?.set_balance(debited);
        Ok(TransactionRecord::withdraw(id, account.clone(), amount))
    }

    /// Move `amount` from `from` to `to` as one atomic step.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<TransactionRecord, LedgerError> {
        let mut state = self.lock();
        let available = state.account(from)?.balance();
        let destination = state.account(to)?.balance();
        Self::ensure_positive(amount)?;

        if from == to {
            return Err(LedgerError::SameAccount(from.clone()));
        }
        if available < amount {
            return Err(LedgerError::InsufficientFunds(
                from.clone(),
                available,
                amount,
            ));
        }
        let debited = Self::debit(available, amount)?;
        let credited = destination
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;

        let id = state.issue_tx_id()?;
        // both accounts were found above under the same guard
        state.account_mut(from)?.set_balance(debited);
        state.account_mut(to)?.set_balance(credited);
        Ok(TransactionRecord::transfer(
            id,
            from.clone(),
            to.clone(),
            amount,
        ))
    }

    /// Copy the accounts and sequences for a persistence layer.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.lock();
        LedgerSnapshot {
            accounts: state.accounts.values().cloned().collect(),
            next_transaction_id: state.next_tx,
            next_account_seq: state.next_account_seq,
        }
    }

    /// Execute a single command and log its outcome.
    pub fn execute(&self, command: Command) -> Result<Outcome, LedgerError> {
        match command {
            Command::Open {
                display_name,
                opening_balance,
            } => {
                let result = match opening_balance {
                    Some(opening) => {
                        self.create_account_with_balance(display_name.as_str(), opening)
                    }
                    None => Ok(self.create_account(display_name.as_str())),
                }
                .map(Outcome::Opened);
                Self::log_result("open", &display_name, opening_balance, &result);
                result
            }
            Command::Deposit { account, amount } => {
                let result = self.deposit(&account, amount).map(Outcome::Recorded);
                Self::log_result("deposit", &account, Some(amount), &result);
                result
            }
            Command::Withdraw { account, amount } => {
                let result = self.withdraw(&account, amount).map(Outcome::Recorded);
                Self::log_result("withdraw", &account, Some(amount), &result);
                result
            }
            Command::Transfer { from, to, amount } => {
                let result = self.transfer(&from, &to, amount).map(Outcome::Recorded);
                let target = format!("{from} -> {to}");
                Self::log_result("transfer", &target, Some(amount), &result);
                result
            }
        }
    }

    /// Run the ledger over the given command stream
    pub async fn run(&self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // failures are logged by `execute` and must not stop the ledger
            let _ = self.execute(command);
        }
    }
}

/// Private API
impl Ledger {
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // operations validate before writing, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self, display_name: String, opening_balance: Amount) -> Account {
        let mut state = self.lock();
        let id = state.allocate_account_id();
        let account = Account::new(id.clone(), display_name, opening_balance);
        state.accounts.insert(id, account.clone());
        account
    }

    fn ensure_positive(amount: Amount) -> Result<(), LedgerError> {
        if amount.is_positive() {
            Ok(())
        } else {
            Err(LedgerError::InvalidAmount(amount))
        }
    }

    fn debit(balance: Amount, amount: Amount) -> Result<Amount, LedgerError> {
        balance
            .checked_sub(amount)
            .ok_or(LedgerError::InvalidAmount(amount))
    }

    /// Small helper to log `execute` results
    fn log_result(
        op: &str,
        target: &dyn fmt::Display,
        amount: Option<Amount>,
        result: &Result<Outcome, LedgerError>,
    ) {
        match (result, amount) {
            (Ok(Outcome::Opened(account)), _) => {
                info!(
                    account = %account.id(),
                    name = account.display_name(),
                    balance = %account.balance(),
                    "{op} applied"
                );
            }
            (Ok(Outcome::Recorded(record)), _) => {
                info!(
                    account = %target,
                    tx = record.id(),
                    amount = %record.amount(),
                    "{op} applied"
                );
            }
            (Err(e), Some(amt)) => {
                info!(
                    account = %target,
                    amount = %amt,
                    reason = %e,
                    "{op} skipped"
                );
            }
            (Err(e), None) => {
                info!(
                    account = %target,
                    reason = %e,
                    "{op} skipped"
                );
            }
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
