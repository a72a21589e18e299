//! HTTP server hosting the inbound webhook and the daily-summary trigger.

mod summary;
mod webhook;


use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tasky_core::traits::{Agent, Sender, Transcriber};
use tasky_store::Store;
use tracing::info;

/// Shared state for request handlers.
///
/// Collaborators are trait objects so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub sender: Arc<dyn Sender>,
    pub agent: Arc<dyn Agent>,
    /// Absent when voice transcription is not configured.
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub verify_token: String,
    pub app_secret: String,
    pub summary_template: Option<String>,
}

/// Build the axum router with shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(webhook::verify_webhook).post(webhook::handle_webhook),
        )
        .route("/daily-summary", post(summary::send_daily_summary))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// Start the server and block until it exits.
pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;
    Ok(())
}
