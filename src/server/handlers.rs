use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::application::AppError;
use crate::domain::{NewTransaction, TransactionUpdate};

use super::{
    ApiError, AppState, BalanceResponse, DeletedTransactionResponse, ErrorResponse,
    HealthResponse, StatsResponse, SyncResponse, TransactionResponse, TransactionsResponse,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBalanceRequest {
    pub balance: Option<Value>,
    pub monthly_spend: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub amount: Option<Value>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub details: Option<String>,
    pub category: Option<String>,
    pub account_id: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    pub amount: Option<Value>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub details: Option<String>,
    pub category: Option<String>,
    pub account_id: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
}

/// A JSON number, or a string holding one. Non-finite values are rejected.
fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn sync(State(state): State<AppState>) -> ApiResult<SyncResponse> {
    let data = state.ledger.sync().await?;
    Ok(Json(SyncResponse {
        success: true,
        data,
    }))
}

pub async fn get_balance(State(state): State<AppState>) -> ApiResult<BalanceResponse> {
    let summary = state.ledger.get_balance().await?;
    Ok(Json(BalanceResponse {
        success: true,
        summary,
    }))
}

pub async fn update_balance(
    State(state): State<AppState>,
    payload: Result<Json<UpdateBalanceRequest>, JsonRejection>,
) -> ApiResult<BalanceResponse> {
    let Json(req) = payload?;

    let balance = req
        .balance
        .as_ref()
        .and_then(numeric)
        .ok_or_else(|| AppError::validation("Invalid balance format"))?;
    // An unusable monthly spend is ignored rather than rejected.
    let monthly_spend = req.monthly_spend.as_ref().and_then(numeric);

    let summary = state.ledger.update_balance(balance, monthly_spend).await?;
    Ok(Json(BalanceResponse {
        success: true,
        summary,
    }))
}

pub async fn list_transactions(State(state): State<AppState>) -> ApiResult<TransactionsResponse> {
    let transactions = state.ledger.get_transactions().await?;
    Ok(Json(TransactionsResponse {
        success: true,
        transactions,
    }))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> ApiResult<TransactionResponse> {
    let Json(req) = payload?;

    let amount = req
        .amount
        .as_ref()
        .and_then(numeric)
        .ok_or_else(|| AppError::validation("Invalid amount format"))?;
    let date = req
        .date
        .filter(|date| !date.is_empty())
        .ok_or_else(|| AppError::validation("Date is required"))?;
    let description = req
        .description
        .filter(|description| !description.is_empty())
        .unwrap_or_else(|| (if amount > 0.0 { "Top-up" } else { "Expense" }).to_string());

    let input = NewTransaction {
        id: None,
        amount,
        date,
        description: Some(description),
        details: req.details,
        category: req.category,
        account_id: req.account_id,
        tx_type: req.tx_type,
    };

    let outcome = state.ledger.add_transaction(input).await?;
    Ok(Json(outcome.into()))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTransactionRequest>, JsonRejection>,
) -> ApiResult<TransactionResponse> {
    let Json(req) = payload?;

    let amount = match req.amount.as_ref() {
        Some(value) => {
            Some(numeric(value).ok_or_else(|| AppError::validation("Invalid amount format"))?)
        }
        None => None,
    };
    let update = TransactionUpdate {
        amount,
        date: req.date,
        description: req.description,
        details: req.details,
        category: req.category,
        account_id: req.account_id,
        tx_type: req.tx_type,
    };

    match state.ledger.update_transaction(&id, update).await? {
        Some(outcome) => Ok(Json(outcome.into())),
        None => Err(AppError::TransactionNotFound(id).into()),
    }
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedTransactionResponse> {
    match state.ledger.delete_transaction(&id).await? {
        Some(outcome) => Ok(Json(outcome.into())),
        None => Err(AppError::TransactionNotFound(id).into()),
    }
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<StatsResponse> {
    let stats = state.ledger.get_stats().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "OK",
        timestamp: timestamp(),
    })
}

pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    let body = ErrorResponse {
        path: Some(uri.path().to_string()),
        method: Some(method.to_string()),
        ..ErrorResponse::new("Route not found")
    };
    (StatusCode::NOT_FOUND, Json(body))
}
