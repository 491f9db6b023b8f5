//! Keeper error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preflight error: {0}")]
    Preflight(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] veil_ledger::LedgerError),

    #[error("Price feed error: {0}")]
    Feed(#[from] crate::feed::FeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type KeeperResult<T> = Result<T, KeeperError>;
