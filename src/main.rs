use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use ledger::csv::{read_commands_from_path, write_accounts};
use ledger::{Amount, Ledger, LedgerConfig, LedgerSnapshot};
use miette::{IntoDiagnostic, Result};
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Commands CSV file (`op,account,counterparty,amount`)
    input: PathBuf,

    /// Balance credited to accounts opened without an explicit amount
    #[arg(long, env = "LEDGER_OPENING_BALANCE")]
    opening_balance: Option<Amount>,

    /// Start from a JSON snapshot instead of an empty ledger
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Write the final ledger state to this JSON snapshot
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.opening_balance {
        Some(amount) => LedgerConfig::new(amount).into_diagnostic()?,
        None => LedgerConfig::default(),
    };

    let ledger = match &cli.restore {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            let snapshot: LedgerSnapshot =
                serde_json::from_reader(BufReader::new(file)).into_diagnostic()?;
            Ledger::restore(snapshot, config).into_diagnostic()?
        }
        None => Ledger::with_config(config),
    };

    let commands = read_commands_from_path(&cli.input).into_diagnostic()?;
    let (cmd_sender, cmd_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if cmd_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(cmd_receiver)).await;

    write_accounts(io::stdout().lock(), &ledger.accounts()).into_diagnostic()?;

    if let Some(path) = &cli.snapshot {
        let mut writer = BufWriter::new(File::create(path).into_diagnostic()?);
        serde_json::to_writer_pretty(&mut writer, &ledger.snapshot()).into_diagnostic()?;
        writer.flush().into_diagnostic()?;
    }

    Ok(())
}
