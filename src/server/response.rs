use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::application::{AppError, SyncData, TransactionOutcome};
use crate::domain::{total, BalanceSummary, Cents, LedgerStats, Transaction};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: BalanceSummary,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub success: bool,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub success: bool,
    pub transaction: Transaction,
    #[serde(with = "total")]
    pub balance: Cents,
    #[serde(with = "total")]
    pub monthly_spend: Cents,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTransactionResponse {
    pub success: bool,
    pub deleted_transaction: Transaction,
    #[serde(with = "total")]
    pub balance: Cents,
    #[serde(with = "total")]
    pub monthly_spend: Cents,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub data: SyncData,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: LedgerStats,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            path: None,
            method: None,
        }
    }
}

impl From<TransactionOutcome> for TransactionResponse {
    fn from(outcome: TransactionOutcome) -> Self {
        Self {
            success: true,
            transaction: outcome.transaction,
            balance: outcome.balance,
            monthly_spend: outcome.monthly_spend,
        }
    }
}

impl From<TransactionOutcome> for DeletedTransactionResponse {
    fn from(outcome: TransactionOutcome) -> Self {
        Self {
            success: true,
            deleted_transaction: outcome.transaction,
            balance: outcome.balance,
            monthly_spend: outcome.monthly_spend,
        }
    }
}

/// Handler error carrying an [`AppError`] to the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self.0 {
            AppError::Persistence(err) => {
                let detail = format!("{:#}", err);
                error!(error = %detail, "Request failed");
                format!("Server error: {}", err)
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
