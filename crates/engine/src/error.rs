//! The module contains the error the engine can throw.
//!
//! Every variant belongs to one coarse [`ErrorKind`], which is what callers
//! (the HTTP layer, the admin CLI) branch on:
//!
//! - [`InsufficientFunds`] thrown when an outflow would make the cash ledger
//!   balance negative.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`ConflictingState`] thrown when an operation is not allowed in the
//!   current state of an item (e.g. advancing a dormant obligation).
//!
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ConflictingState`]: EngineError::ConflictingState
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Conflicting state: {0}")]
    ConflictingState(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any write: bad amount, missing field, invalid enum.
    Validation,
    InsufficientFunds,
    NotFound,
    ConflictingState,
    /// The store failed. Every operation is safe to retry.
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_) | Self::InvalidInput(_) | Self::InvalidId(_) => {
                ErrorKind::Validation
            }
            Self::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_) | Self::ConflictingState(_) => ErrorKind::ConflictingState,
            Self::Database(_) => ErrorKind::Storage,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::ConflictingState(a), Self::ConflictingState(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
