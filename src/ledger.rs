use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Local;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::store::format_amount;

const SEPARATOR: &str = " | ";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One line of the transaction log:
/// `<timestamp> | <account_number> | <label> | <amount>`
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub timestamp: String,
    pub account: String,
    pub label: String,
    pub amount: Decimal,
}

impl TransactionRecord {
    pub fn now(account: &str, label: &str, amount: Decimal) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            account: account.to_string(),
            label: label.to_string(),
            amount,
        }
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.timestamp,
            self.account,
            self.label,
            format_amount(self.amount),
            sep = SEPARATOR
        )
    }
}

impl FromStr for TransactionRecord {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedRecord(line.to_string());
        let (timestamp, rest) = line.split_once(SEPARATOR).ok_or_else(malformed)?;
        let (account, rest) = rest.split_once(SEPARATOR).ok_or_else(malformed)?;
        // Labels may embed an account number, so the amount is taken from the end
        let (label, amount) = rest.rsplit_once(SEPARATOR).ok_or_else(malformed)?;
        let amount = amount.trim();
        let amount = Decimal::from_str(amount)
            .or_else(|_| Decimal::from_scientific(amount))
            .map_err(|_| malformed())?;
        Ok(Self {
            timestamp: timestamp.to_string(),
            account: account.to_string(),
            label: label.to_string(),
            amount,
        })
    }
}

/// Append-only plain text log of every state-changing event.
pub struct TransactionLog {
    path: PathBuf,
}

impl TransactionLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&mut self, account: &str, label: &str, amount: Decimal) -> Result<()> {
        let record = TransactionRecord::now(account, label, amount);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", record)?;
        file.flush()?;
        tracing::debug!(account, label, amount = %amount, "logged transaction");
        Ok(())
    }

    /// All records whose account field is exactly `account`, oldest first.
    /// A log that does not exist yet has no records.
    pub fn history(&self, account: &str) -> Result<Vec<TransactionRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<TransactionRecord>() {
                Ok(record) if record.account == account => records.push(record),
                Ok(_) => {}
                Err(err) => tracing::debug!(error = %err, "skipping log line"),
            }
        }
        Ok(records)
    }
}

/// Account numbers end up as a field of a log line, so they must not contain
/// the field separator or a line break.
pub fn is_loggable_field(value: &str) -> bool {
    !value.contains('|') && !value.contains(['\n', '\r'])
}
