use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("PIN must be exactly 4 digits.")]
    InvalidPin,
    #[error("Amount must be positive.")]
    InvalidAmount,
    #[error("Account number must not contain '|' or line breaks.")]
    InvalidAccountNumber,
    #[error("Amount would exceed the maximum balance.")]
    BalanceOverflow,
    #[error("Insufficient balance.")]
    InsufficientBalance,
    #[error("Insufficient funds in sender account.")]
    InsufficientFunds,
    #[error("Account {0} already exists.")]
    DuplicateAccount(String),
    #[error("Account not found.")]
    AccountNotFound(String),
    #[error("Receiver account not found.")]
    ReceiverNotFound(String),
    #[error("Incorrect PIN.")]
    IncorrectPin,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] csv::Error),
    #[error("Malformed transaction record: {0}")]
    MalformedRecord(String),
}
