use crate::crypto::hash::Hash256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Blockchain already exists")]
    ChainExists,

    #[error("No existing blockchain found, create one first")]
    ChainNotFound,

    #[error("Block {0} referenced by the chain is missing from the store")]
    MissingBlock(Hash256),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Invalid block hash")]
    InvalidBlockHash,
}

impl LedgerError {
    /// Precondition failures leave the store untouched and are reported to
    /// the operator rather than treated as store faults.
    pub fn is_precondition(&self) -> bool {
        matches!(self, LedgerError::ChainExists | LedgerError::ChainNotFound)
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Storage(format!("Encoding error: {}", err))
    }
}

impl From<sled::transaction::TransactionError<LedgerError>> for LedgerError {
    fn from(err: sled::transaction::TransactionError<LedgerError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(e) => LedgerError::Database(e),
        }
    }
}
