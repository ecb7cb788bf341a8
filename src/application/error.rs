use thiserror::Error;

use crate::domain::AmountOverflow;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Storage error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// HTTP status code equivalent of this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::TransactionNotFound(_) => 404,
            AppError::Persistence(_) => 500,
        }
    }
}
