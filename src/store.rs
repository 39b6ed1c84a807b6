use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pin::{hash_pin, verify_pin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub number: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    pub pin_hash: String,
}

impl Account {
    pub fn new(number: String, name: String, balance: Decimal, pin: &str) -> Self {
        Self {
            number,
            name,
            balance,
            pin_hash: hash_pin(pin),
        }
    }

    pub fn check_pin(&self, pin: &str) -> bool {
        verify_pin(pin, &self.pin_hash)
    }
}

/// Renders an amount with at least one fractional digit, e.g. `150.0` or `12.25`
pub fn format_amount(amount: Decimal) -> String {
    let amount = amount.normalize();
    if amount.scale() == 0 {
        format!("{}.0", amount)
    } else {
        amount.to_string()
    }
}

/// Ordered collection of accounts backed by a CSV snapshot.
///
/// Every save rewrites the whole snapshot. A store without a path never
/// touches the filesystem.
pub struct AccountStore {
    path: Option<PathBuf>,
    accounts: Vec<Account>,
}

impl AccountStore {
    /// Load the snapshot at `path`. A missing or unreadable snapshot yields an
    /// empty store rather than an error.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let accounts = if path.exists() {
            match load(&path) {
                Ok(accounts) => {
                    tracing::debug!(path = %path.display(), count = accounts.len(), "loaded accounts");
                    accounts
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "snapshot unreadable, starting empty");
                    Vec::new()
                }
            }
        } else {
            tracing::debug!(path = %path.display(), "no snapshot found, starting empty");
            Vec::new()
        };
        Self {
            path: Some(path),
            accounts,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            accounts: Vec::new(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut writer = csv::Writer::from_path(path)?;
        for account in &self.accounts {
            writer.serialize(account)?;
        }
        writer.flush()?;
        tracing::debug!(path = %path.display(), count = self.accounts.len(), "saved accounts");
        Ok(())
    }

    pub fn find(&self, number: &str) -> Option<&Account> {
        self.accounts.iter().find(|acc| acc.number == number)
    }

    pub fn find_mut(&mut self, number: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|acc| acc.number == number)
    }

    pub fn insert(&mut self, account: Account) {
        self.accounts.push(account);
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }
}

fn load(path: &Path) -> Result<Vec<Account>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut accounts = Vec::new();
    for res in reader.deserialize::<Account>() {
        accounts.push(res?);
    }
    Ok(accounts)
}
