//! HTTP route handlers

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use stepflow_core::executor::{ExecutionResult, Plan};

use crate::commands::validate::{build_report, ValidationReport};
use crate::http::{models::*, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/execute", post(execute_handler))
        .route("/api/v1/validate", post(validate_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// POST /api/v1/execute - run a plan to completion
async fn execute_handler(
    State(state): State<AppState>,
    Json(plan): Json<Plan>,
) -> Result<Json<ExecutionResult>, HttpServerError> {
    state.with_stats(|s| s.increment_request("/api/v1/execute"));

    match state.engine.execute(plan).await {
        Ok(result) => {
            state.with_stats(|s| s.increment_runs());
            Ok(Json(result))
        }
        Err(e) => {
            state.with_stats(|s| s.increment_error());
            Err(e.into())
        }
    }
}

/// POST /api/v1/validate - waves, unreachable steps and issues, without running
async fn validate_handler(
    State(state): State<AppState>,
    Json(plan): Json<Plan>,
) -> Result<Json<ValidationReport>, HttpServerError> {
    state.with_stats(|s| s.increment_request("/api/v1/validate"));

    build_report(&plan).map(Json).map_err(|e| {
        state.with_stats(|s| s.increment_error());
        e.into()
    })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (uptime_seconds, runs_total) = match state.stats.read() {
        Ok(stats) => (stats.uptime_seconds(), stats.runs_total),
        Err(_) => (0.0, 0),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds,
        runs_total,
    })
}
