//! GET /health - uptime, counters and spool backlog.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::SecondsFormat;
use tracing::warn;

use crate::models::HealthResponse;
use crate::state::AppState;

pub const BRIDGE_NAME: &str = "posnet-bridge";

/// Build the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let spool_files = state.spool.pending().await.unwrap_or_else(|e| {
        warn!("cannot count spool files: {}", e);
        0
    });

    Json(HealthResponse {
        ok: true,
        bridge: BRIDGE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        started_at: state
            .stats
            .started_at()
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.stats.uptime_secs(),
        counters: state.stats.counters(),
        spool_files,
        last_error: state.stats.last_error(),
        mode: "spool",
    })
}
