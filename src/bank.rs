use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::ledger::{is_loggable_field, TransactionLog, TransactionRecord};
use crate::pin::is_valid_pin;
use crate::store::{Account, AccountStore};

/// Account operations. Each successful mutation saves the full snapshot and
/// appends to the transaction log. Failures of either are reported but never
/// undo the balance change.
pub struct Bank {
    store: AccountStore,
    log: TransactionLog,
}

impl Bank {
    pub fn new(store: AccountStore, log: TransactionLog) -> Self {
        tracing::info!(accounts = store.accounts().len(), "bank ready");
        Self { store, log }
    }

    #[cfg(test)]
    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn exists(&self, number: &str) -> bool {
        self.store.find(number).is_some()
    }

    /// Checks credentials without touching the account
    pub fn verify(&mut self, number: &str, pin: &str) -> Result<()> {
        self.authenticate(number, pin).map(|_| ())
    }

    pub fn create_account(
        &mut self,
        number: &str,
        name: &str,
        initial_balance: Decimal,
        pin: &str,
    ) -> Result<()> {
        if !is_loggable_field(number) {
            return Err(Error::InvalidAccountNumber);
        }
        if !is_valid_pin(pin) {
            return Err(Error::InvalidPin);
        }
        if initial_balance < Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }
        if self.exists(number) {
            return Err(Error::DuplicateAccount(number.to_string()));
        }

        self.store.insert(Account::new(
            number.to_string(),
            name.to_string(),
            initial_balance,
            pin,
        ));
        self.save();
        self.record(number, "Account Created", initial_balance);
        tracing::info!(account = number, "account created");
        Ok(())
    }

    /// Returns the new balance
    pub fn deposit(&mut self, number: &str, pin: &str, amount: Decimal) -> Result<Decimal> {
        let account = self.authenticate(number, pin)?;
        check_amount(amount)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(Error::BalanceOverflow)?;
        let balance = account.balance;

        self.save();
        self.record(number, "Deposit", amount);
        Ok(balance)
    }

    /// Returns the new balance
    pub fn withdraw(&mut self, number: &str, pin: &str, amount: Decimal) -> Result<Decimal> {
        let account = self.authenticate(number, pin)?;
        check_amount(amount)?;
        if amount > account.balance {
            return Err(Error::InsufficientBalance);
        }
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance)?;
        let balance = account.balance;

        self.save();
        self.record(number, "Withdraw", amount);
        Ok(balance)
    }

    /// Returns the holder's name and current balance
    pub fn check_balance(&mut self, number: &str, pin: &str) -> Result<(String, Decimal)> {
        let account = self.authenticate(number, pin)?;
        Ok((account.name.clone(), account.balance))
    }

    /// Only the sender is authenticated. The receiver cannot refuse a transfer.
    pub fn transfer(
        &mut self,
        sender: &str,
        pin: &str,
        receiver: &str,
        amount: Decimal,
    ) -> Result<()> {
        let sender_balance = self.authenticate(sender, pin)?.balance;
        if !self.exists(receiver) {
            return Err(Error::ReceiverNotFound(receiver.to_string()));
        }
        check_amount(amount)?;
        if amount > sender_balance {
            return Err(Error::InsufficientFunds);
        }

        // Both sides are computed before either is written. A transfer to
        // oneself leaves the balance as it is.
        if sender != receiver {
            let debited = sender_balance
                .checked_sub(amount)
                .ok_or(Error::InsufficientFunds)?;
            let credited = self
                .store
                .find(receiver)
                .and_then(|acc| acc.balance.checked_add(amount))
                .ok_or(Error::BalanceOverflow)?;
            if let Some(account) = self.store.find_mut(sender) {
                account.balance = debited;
            }
            if let Some(account) = self.store.find_mut(receiver) {
                account.balance = credited;
            }
        }

        self.save();
        self.record(sender, &format!("Transfer to {}", receiver), amount);
        self.record(receiver, &format!("Received from {}", sender), amount);
        tracing::info!(sender, receiver, amount = %amount, "transfer completed");
        Ok(())
    }

    pub fn history(&mut self, number: &str, pin: &str) -> Result<Vec<TransactionRecord>> {
        self.authenticate(number, pin)?;
        self.log.history(number)
    }

    /// Flush the store, reporting rather than propagating failures
    pub fn save(&self) {
        if let Err(err) = self.store.save() {
            tracing::error!(error = %err, "failed to save accounts");
            eprintln!("Error saving accounts: {}", err);
        }
    }

    fn record(&mut self, number: &str, label: &str, amount: Decimal) {
        if let Err(err) = self.log.append(number, label, amount) {
            tracing::error!(account = number, error = %err, "failed to log transaction");
            eprintln!("Error logging transaction: {}", err);
        }
    }

    fn authenticate(&mut self, number: &str, pin: &str) -> Result<&mut Account> {
        let account = self
            .store
            .find_mut(number)
            .ok_or_else(|| Error::AccountNotFound(number.to_string()))?;
        if !account.check_pin(pin) {
            tracing::warn!(account = number, "authentication failed");
            return Err(Error::IncorrectPin);
        }
        Ok(account)
    }
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}
