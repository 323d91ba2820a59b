//! Ledger configuration.

use thiserror::Error;

use crate::Amount;

/// Balance credited to accounts opened without an explicit amount.
pub const DEFAULT_OPENING_BALANCE: Amount = Amount::from_units(1000);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("opening balance must not be negative, got {0}")]
    NegativeOpeningBalance(Amount),
}

/// Settings applied when a [`Ledger`](crate::Ledger) is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    opening_balance: Amount,
}

impl LedgerConfig {
    pub fn new(opening_balance: Amount) -> Result<Self, ConfigError> {
        if opening_balance.is_negative() {
            return Err(ConfigError::NegativeOpeningBalance(opening_balance));
        }
        Ok(Self { opening_balance })
    }

    pub fn opening_balance(&self) -> Amount {
        self.opening_balance
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            opening_balance: DEFAULT_OPENING_BALANCE,
        }
    }
}
