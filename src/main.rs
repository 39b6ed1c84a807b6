use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

mod bank;
mod error;
mod ledger;
mod pin;
mod shell;
mod store;

use bank::Bank;
use ledger::TransactionLog;
use shell::Shell;
use store::AccountStore;

#[derive(Debug, Parser)]
#[command(about = "Interactive console for a small PIN protected bank")]
struct Args {
    #[arg(
        long,
        env = "BANK_ACCOUNTS_FILE",
        default_value = "accounts.csv",
        help = "Path to the account snapshot"
    )]
    accounts: PathBuf,
    #[arg(
        long,
        env = "BANK_TRANSACTIONS_FILE",
        default_value = "transactions.txt",
        help = "Path to the transaction log"
    )]
    transactions: PathBuf,
    #[arg(long, default_value_t = Level::WARN, help = "Diagnostic log level, written to stderr")]
    log_level: Level,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let bank = Bank::new(
        AccountStore::open(&args.accounts),
        TransactionLog::new(&args.transactions),
    );
    let stdin = std::io::stdin();
    let mut shell = Shell::new(bank, stdin.lock(), std::io::stdout());
    match shell.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
