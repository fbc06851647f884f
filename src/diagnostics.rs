//! Debug HTTP endpoint exposing live crawl counters.

use axum::{extract::Extension, routing::get, Json, Router};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::metrics::{CrawlMetrics, MetricsSnapshot};

/// `GET /debug/stats` returns the current metrics snapshot as JSON.
pub async fn stats_handler(
    Extension(metrics): Extension<Arc<CrawlMetrics>>,
) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

pub fn router(metrics: Arc<CrawlMetrics>) -> Router {
    Router::new()
        .route("/debug/stats", get(stats_handler))
        .layer(Extension(metrics))
}

/// Serve diagnostics on `addr` in the background.
///
/// A bind or serve failure is logged and never affects the crawl.
pub fn spawn_diagnostics(addr: String, metrics: Arc<CrawlMetrics>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(addr = %addr, error = %e, "diagnostics endpoint unavailable");
                return;
            }
        };
        tracing::info!(addr = %addr, "diagnostics listening on /debug/stats");

        if let Err(e) = axum::serve(listener, router(metrics)).await {
            tracing::error!(error = %e, "diagnostics server stopped");
        }
    })
}
