use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::amount::AmountParseError;
use crate::{Account, AccountId, Amount, Command};

/// Errors that can occur when reading commands or writing accounts
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized operation '{op}'")]
    UnrecognizedOp { line: usize, op: String },

    #[error("line {line}: {op} missing {field}")]
    MissingField {
        line: usize,
        op: String,
        field: &'static str,
    },

    #[error("line {line}: {source}")]
    InvalidAmount {
        line: usize,
        source: AmountParseError,
    },

    #[error("failed to write accounts: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush accounts: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    op: String,
    account: String,
    counterparty: Option<String>,
    amount: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    account: &'a str,
    name: &'a str,
    balance: String,
}

/// Read commands from a csv file
pub fn read_commands_from_path(
    path: &Path,
) -> Result<impl Iterator<Item = Result<Command, CsvError>> + use<>, CsvError> {
    let file = File::open(path).map_err(|source| CsvError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(read_commands(file))
}

/// Read commands from csv with the header `op,account,counterparty,amount`.
///
/// Trailing empty columns may be omitted, e.g. `open,Alice`.
pub fn read_commands<R: io::Read>(
    reader: R,
) -> impl Iterator<Item = Result<Command, CsvError>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            to_command(line, row)
        })
}

fn to_command(line: usize, row: InputRow) -> Result<Command, CsvError> {
    let missing = |field| CsvError::MissingField {
        line,
        op: row.op.clone(),
        field,
    };
    let parse_amount = |text: &str| {
        text.parse::<Amount>()
            .map_err(|source| CsvError::InvalidAmount { line, source })
    };

    if row.account.is_empty() {
        return Err(missing("account"));
    }

    match row.op.as_str() {
        "open" => Ok(Command::Open {
            display_name: row.account.clone(),
            opening_balance: row.amount.as_deref().map(parse_amount).transpose()?,
        }),
        "deposit" => {
            let amount = row.amount.as_deref().ok_or_else(|| missing("amount"))?;
            Ok(Command::Deposit {
                account: AccountId::new(row.account.as_str()),
                amount: parse_amount(amount)?,
            })
        }
        "withdraw" => {
            let amount = row.amount.as_deref().ok_or_else(|| missing("amount"))?;
            Ok(Command::Withdraw {
                account: AccountId::new(row.account.as_str()),
                amount: parse_amount(amount)?,
            })
        }
        "transfer" => {
            let to = row
                .counterparty
                .as_deref()
                .ok_or_else(|| missing("counterparty"))?;
            let amount = row.amount.as_deref().ok_or_else(|| missing("amount"))?;
            Ok(Command::Transfer {
                from: AccountId::new(row.account.as_str()),
                to: AccountId::new(to),
                amount: parse_amount(amount)?,
            })
        }
        other => Err(CsvError::UnrecognizedOp {
            line,
            op: other.to_string(),
        }),
    }
}

/// Write accounts in csv format
pub fn write_accounts<'a, W: io::Write>(
    writer: W,
    accounts: impl IntoIterator<Item = &'a Account>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for account in accounts {
        let row = OutputRow {
            account: account.id().as_str(),
            name: account.display_name(),
            balance: account.balance().to_string(),
        };
        writer.serialize(&row)?;
    }

    writer.flush()?;
    Ok(())
}
