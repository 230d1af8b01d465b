//! The module contains the errors the ledger can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a request field is rejected, before any write.
//! - [`PermissionDenied`] thrown when the actor may not perform the action.
//! - [`KeyNotFound`] thrown when a bar, account, item or transaction is missing.
//! - [`Integrity`] thrown when a transaction would not satisfy its kind's
//!   operation/data cardinality.
//!
//!  [`Validation`]: LedgerError::Validation
//!  [`PermissionDenied`]: LedgerError::PermissionDenied
//!  [`KeyNotFound`]: LedgerError::KeyNotFound
//!  [`Integrity`]: LedgerError::Integrity
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid field \"{field}\": {message}")]
    Validation { field: String, message: String },
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Integrity violation: {0}")]
    Integrity(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl LedgerError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Validation {
                    field: a,
                    message: m,
                },
                Self::Validation {
                    field: b,
                    message: n,
                },
            ) => a == b && m == n,
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Integrity(a), Self::Integrity(b)) => a == b,
            (Self::Config(a), Self::Config(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
