use alloy::primitives::{B256, U256};
use thiserror::Error;

use crate::types::BridgeDirection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction {0} is already tracked")]
    DuplicateKey(B256),

    #[error("stored row for {tx_hash} is unreadable: {reason}")]
    CorruptRow { tx_hash: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error kinds surfaced by the bridge core. Structured fields are kept so
/// callers can match on them instead of parsing messages.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("trying to deposit {requested}, but balance is {balance}")]
    InsufficientBalance { balance: U256, requested: U256 },

    #[error("gas limit too low, gas limit: {gas_limit}, gas used: {gas_used}")]
    GasLimitTooLow { gas_limit: u64, gas_used: u64 },

    #[error("transaction {tx_hash} still pending after {attempts} receipt checks")]
    ReceiptTimeout { tx_hash: B256, attempts: u32 },

    #[error("waiting for receipt of {tx_hash} was cancelled")]
    ReceiptCancelled { tx_hash: B256 },

    #[error("transaction {0} not found on chain")]
    TransactionNotFound(B256),

    #[error("unsupported token {symbol} for {direction:?}")]
    UnknownToken { symbol: String, direction: BridgeDirection },

    #[error("token {0} has no destination-chain counterpart")]
    UnmappedToken(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("direction {0:?} is not supported")]
    UnsupportedDirection(BridgeDirection),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
