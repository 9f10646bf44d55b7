// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Read-only status feed for any dashboard sitting in front of the scanner.
// All endpoints live under `/api/v1/`. The scanner has no control surface, so
// nothing here mutates state and no authentication layer is mounted.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/signals", get(all_signals))
        .route("/api/v1/signals/:symbol", get(symbol_signals))
        .route("/api/v1/alerts", get(alerts))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Full state snapshot
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Signals
// =============================================================================

/// Latest rule verdicts for every scanned symbol, newest bar only.
async fn all_signals(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reports = state.reports.read();
    let mut out: Vec<serde_json::Value> = reports
        .values()
        .map(|report| {
            serde_json::json!({
                "symbol": report.symbol,
                "interval": report.interval,
                "scanned_at": report.scanned_at,
                "latest": report.latest(),
            })
        })
        .collect();
    out.sort_by_key(|v| v["symbol"].as_str().map(str::to_owned));
    Json(out)
}

/// Full scan report (indicator tail included) for one symbol.
async fn symbol_signals(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let symbol = symbol.to_uppercase();
    let reports = state.reports.read();
    match reports.get(&symbol) {
        Some(report) => Json(report.clone()).into_response(),
        None => {
            let body = serde_json::json!({
                "symbol": symbol,
                "message": "no scan data for symbol",
            });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
    }
}

// =============================================================================
// Alerts
// =============================================================================

async fn alerts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent_alerts.read().clone())
}
