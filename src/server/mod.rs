//! HTTP adapter exposing the ledger as a JSON API under `/api`.

mod handlers;
mod response;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    response::Response,
    routing::{get, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::application::LedgerService;

pub use response::*;

/// Shared handler state. The ledger service is built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    pub fn new(ledger: LedgerService) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }
}

/// Build the API router. Unknown paths and methods answer with a JSON 404.
/// Any origin may call the API, so a browser client can be served elsewhere.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sync", get(handlers::sync).fallback(handlers::not_found))
        .route(
            "/api/balance",
            get(handlers::get_balance)
                .put(handlers::update_balance)
                .fallback(handlers::not_found),
        )
        .route(
            "/api/transactions",
            get(handlers::list_transactions)
                .post(handlers::create_transaction)
                .fallback(handlers::not_found),
        )
        .route(
            "/api/transactions/{id}",
            put(handlers::update_transaction)
                .delete(handlers::delete_transaction)
                .fallback(handlers::not_found),
        )
        .route("/api/stats", get(handlers::stats).fallback(handlers::not_found))
        .route("/api/health", get(handlers::health).fallback(handlers::not_found))
        .fallback(handlers::not_found)
        .layer(from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    debug!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

/// Serve the API on `listen` until Ctrl-C.
pub async fn serve(ledger: LedgerService, listen: &str) -> Result<()> {
    let app = router(AppState::new(ledger));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}
