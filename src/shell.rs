use std::io::{self, BufRead, ErrorKind, Write};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::bank::Bank;
use crate::error::Error;
use crate::store::format_amount;

const MENU: &str = "\n--- BANK MANAGEMENT SYSTEM ---
1. Create Account
2. Deposit
3. Withdraw
4. Check Balance
5. Fund Transfer
6. View Transaction History
7. Exit";

/// Line based console driving a [`Bank`]. Reads from any `BufRead` and writes
/// prompts and results to any `Write`.
pub struct Shell<R, W> {
    bank: Bank,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(bank: Bank, input: R, output: W) -> Self {
        Self {
            bank,
            input,
            output,
        }
    }

    /// Loop over menu choices until Exit or end of input. The store is saved
    /// before returning.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            match self.step() {
                Ok(true) => continue,
                Ok(false) => break,
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                    tracing::debug!("input closed");
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        self.bank.save();
        Ok(())
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (Bank, W) {
        (self.bank, self.output)
    }

    /// Returns false once the user chose to exit
    fn step(&mut self) -> io::Result<bool> {
        writeln!(self.output, "{}", MENU)?;
        let choice = self.prompt("Choose option: ")?;
        match choice.trim().parse::<u8>() {
            Ok(1) => self.create_account()?,
            Ok(2) => self.deposit()?,
            Ok(3) => self.withdraw()?,
            Ok(4) => self.check_balance()?,
            Ok(5) => self.transfer()?,
            Ok(6) => self.history()?,
            Ok(7) => return Ok(false),
            _ => writeln!(self.output, "Invalid choice.")?,
        }
        Ok(true)
    }

    fn create_account(&mut self) -> io::Result<()> {
        let number = self.prompt("Enter account number: ")?;
        let name = self.prompt("Enter name: ")?;
        let Some(balance) = self.prompt_amount("Enter initial balance: ")? else {
            return Ok(());
        };
        let pin = self.prompt("Set 4-digit PIN: ")?;

        match self.bank.create_account(&number, &name, balance, &pin) {
            Ok(()) => writeln!(self.output, "Account created successfully!"),
            Err(err) => writeln!(self.output, "{}", err),
        }
    }

    fn deposit(&mut self) -> io::Result<()> {
        let Some((number, pin)) = self.login("Enter account number: ")? else {
            return Ok(());
        };
        let Some(amount) = self.prompt_amount("Enter amount to deposit: ")? else {
            return Ok(());
        };
        match self.bank.deposit(&number, &pin, amount) {
            Ok(_) => writeln!(self.output, "Deposit successful."),
            Err(err) => writeln!(self.output, "{}", err),
        }
    }

    fn withdraw(&mut self) -> io::Result<()> {
        let Some((number, pin)) = self.login("Enter account number: ")? else {
            return Ok(());
        };
        let Some(amount) = self.prompt_amount("Enter amount to withdraw: ")? else {
            return Ok(());
        };
        match self.bank.withdraw(&number, &pin, amount) {
            Ok(_) => writeln!(self.output, "Withdrawal successful."),
            Err(err) => writeln!(self.output, "{}", err),
        }
    }

    fn check_balance(&mut self) -> io::Result<()> {
        let Some((number, pin)) = self.login("Enter account number: ")? else {
            return Ok(());
        };
        match self.bank.check_balance(&number, &pin) {
            Ok((name, balance)) => {
                writeln!(self.output, "Account Holder: {}", name)?;
                writeln!(self.output, "Balance: {}", format_amount(balance))
            }
            Err(err) => writeln!(self.output, "{}", err),
        }
    }

    fn transfer(&mut self) -> io::Result<()> {
        let Some((sender, pin)) = self.login("Enter sender account number: ")? else {
            return Ok(());
        };
        let receiver = self.prompt("Enter receiver account number: ")?;
        if !self.bank.exists(&receiver) {
            return writeln!(self.output, "{}", Error::ReceiverNotFound(receiver));
        }
        let Some(amount) = self.prompt_amount("Enter amount to transfer: ")? else {
            return Ok(());
        };
        match self.bank.transfer(&sender, &pin, &receiver, amount) {
            Ok(()) => writeln!(self.output, "Transfer successful."),
            Err(err) => writeln!(self.output, "{}", err),
        }
    }

    fn history(&mut self) -> io::Result<()> {
        let Some((number, pin)) = self.login("Enter account number: ")? else {
            return Ok(());
        };
        match self.bank.history(&number, &pin) {
            Ok(records) if records.is_empty() => {
                writeln!(self.output, "No transactions found for this account.")
            }
            Ok(records) => {
                for record in records {
                    writeln!(self.output, "{}", record)?;
                }
                Ok(())
            }
            Err(Error::Io(err)) => {
                tracing::error!(error = %err, "failed to read transaction log");
                writeln!(self.output, "Error reading transaction file.")
            }
            Err(err) => writeln!(self.output, "{}", err),
        }
    }

    /// Asks for an account number, then its PIN once the account is known to
    /// exist. Prints the failure and returns None if either step fails.
    fn login(&mut self, label: &str) -> io::Result<Option<(String, String)>> {
        let number = self.prompt(label)?;
        if !self.bank.exists(&number) {
            writeln!(self.output, "{}", Error::AccountNotFound(number))?;
            return Ok(None);
        }
        let pin = self.prompt("Enter PIN: ")?;
        if let Err(err) = self.bank.verify(&number, &pin) {
            writeln!(self.output, "{}", err)?;
            return Ok(None);
        }
        Ok(Some((number, pin)))
    }

    fn prompt_amount(&mut self, label: &str) -> io::Result<Option<Decimal>> {
        let raw = self.prompt(label)?;
        match Decimal::from_str(raw.trim()) {
            Ok(amount) => Ok(Some(amount)),
            Err(_) => {
                writeln!(self.output, "Invalid amount.")?;
                Ok(None)
            }
        }
    }

    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(ErrorKind::UnexpectedEof, "input closed"));
        }
        // Text fields keep surrounding spaces; only the line ending goes
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionLog;
    use crate::store::AccountStore;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run(script: &str) -> (Bank, String) {
        let dir = tempdir().unwrap();
        let log = TransactionLog::new(dir.path().join("transactions.txt"));
        let bank = Bank::new(AccountStore::in_memory(), log);
        let mut shell = Shell::new(bank, Cursor::new(script.to_string()), Vec::new());
        shell.run().unwrap();
        let (bank, output) = shell.into_parts();
        (bank, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_create_and_check_balance() {
        let script = "1\nA1\nAlice Smith\n100\n1234\n4\nA1\n1234\n7\n";
        let (bank, output) = run(script);

        assert!(output.contains("Account created successfully!"));
        assert!(output.contains("Account Holder: Alice Smith"));
        assert!(output.contains("Balance: 100.0"));
        assert_eq!(bank.store().accounts().len(), 1);
    }

    #[test]
    fn test_invalid_choice_redisplays_menu() {
        let (_, output) = run("9\nabc\n7\n");
        assert_eq!(output.matches("Invalid choice.").count(), 2);
        assert_eq!(output.matches("--- BANK MANAGEMENT SYSTEM ---").count(), 3);
    }

    #[test]
    fn test_bad_pin_on_create() {
        let (bank, output) = run("1\nA1\nAlice\n100\n12a4\n7\n");
        assert!(output.contains("PIN must be exactly 4 digits."));
        assert!(bank.store().accounts().is_empty());
    }

    #[test]
    fn test_deposit_withdraw_flow() {
        let script = "1\nA1\nAlice\n100\n1234\n\
                      2\nA1\n1234\n50\n\
                      3\nA1\n1234\n200\n\
                      3\nA1\n1234\n25.5\n\
                      7\n";
        let (bank, output) = run(script);

        assert!(output.contains("Deposit successful."));
        assert!(output.contains("Insufficient balance."));
        assert!(output.contains("Withdrawal successful."));
        assert_eq!(
            bank.store().find("A1").unwrap().balance,
            Decimal::new(1245, 1)
        );
    }

    #[test]
    fn test_unknown_account_skips_pin_prompt() {
        let (_, output) = run("2\nNOPE\n7\n");
        assert!(output.contains("Account not found."));
        assert!(!output.contains("Enter PIN: "));
    }

    #[test]
    fn test_wrong_pin_skips_amount_prompt() {
        let script = "1\nA1\nAlice\n100\n1234\n2\nA1\n4321\n7\n";
        let (bank, output) = run(script);
        assert!(output.contains("Incorrect PIN."));
        assert!(!output.contains("Enter amount to deposit: "));
        assert_eq!(bank.store().find("A1").unwrap().balance, Decimal::new(100, 0));
    }

    #[test]
    fn test_invalid_amount() {
        let script = "1\nA1\nAlice\n100\n1234\n2\nA1\n1234\nten\n7\n";
        let (bank, output) = run(script);
        assert!(output.contains("Invalid amount."));
        assert_eq!(bank.store().find("A1").unwrap().balance, Decimal::new(100, 0));
    }

    #[test]
    fn test_transfer_and_history() {
        let script = "1\nA1\nAlice\n100\n1234\n\
                      1\nB1\nBob\n0\n5678\n\
                      5\nA1\n1234\nC1\n\
                      5\nA1\n1234\nB1\n500\n\
                      5\nA1\n1234\nB1\n30\n\
                      6\nB1\n5678\n\
                      7\n";
        let (bank, output) = run(script);

        assert!(output.contains("Receiver account not found."));
        assert!(output.contains("Insufficient funds in sender account."));
        assert!(output.contains("Transfer successful."));
        assert!(output.contains(" | B1 | Account Created | 0.0"));
        assert!(output.contains(" | B1 | Received from A1 | 30.0"));
        assert!(!output.contains(" | A1 | Transfer to B1"));
        assert_eq!(bank.store().find("B1").unwrap().balance, Decimal::new(30, 0));
    }

    #[test]
    fn test_end_of_input_exits_cleanly() {
        let (bank, output) = run("1\nA1\nAlice\n");
        assert!(output.ends_with("Enter initial balance: "));
        assert!(bank.store().accounts().is_empty());
    }

    #[test]
    fn test_text_fields_keep_spaces() {
        let script = "1\n A1 \n  Alice  \n 100 \n1234\r\n4\n A1 \n1234\n4\nA1\n7\n";
        let (bank, output) = run(script);

        let account = bank.store().find(" A1 ").expect("Account exists");
        assert_eq!(account.name, "  Alice  ");
        assert_eq!(account.balance, Decimal::new(100, 0));
        assert!(output.contains("Account Holder:   Alice  "));
        assert!(output.contains("Account not found."));
    }
}
