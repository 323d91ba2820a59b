pub mod amount;
pub mod config;
pub mod csv;
pub mod ledger;
pub mod model;

pub use amount::Amount;
pub use config::LedgerConfig;
pub use ledger::{Account, Ledger, LedgerError, LedgerSnapshot, Outcome};
pub use model::{AccountId, Command, TransactionKind, TransactionRecord, TxId};
