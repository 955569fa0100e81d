//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`AccountCreation`] thrown when a chart-of-accounts node cannot be created.
//! - [`UnmappedRecord`] thrown when a source record produces no valid journal lines.
//! - [`UnbalancedEntry`] thrown when debits and credits of an entry differ.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`AccountCreation`]: EngineError::AccountCreation
//!  [`UnmappedRecord`]: EngineError::UnmappedRecord
//!  [`UnbalancedEntry`]: EngineError::UnbalancedEntry
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Account creation failed: {0}")]
    AccountCreation(String),
    #[error("Unmapped record: {0}")]
    UnmappedRecord(String),
    #[error("Unbalanced entry: {0}")]
    UnbalancedEntry(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AccountCreation(a), Self::AccountCreation(b)) => a == b,
            (Self::UnmappedRecord(a), Self::UnmappedRecord(b)) => a == b,
            (Self::UnbalancedEntry(a), Self::UnbalancedEntry(b)) => a == b,
            (Self::InvalidRange(a), Self::InvalidRange(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
