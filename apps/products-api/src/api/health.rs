//! Health check endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use axum_helpers::{health_router, run_health_checks, HealthCheckFuture};
use serde_json::Value;

use crate::state::AppState;

/// `GET /ready`: 200 while the product store answers, 503 otherwise.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store = state.config.store.kind().to_string();
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        store.as_str(),
        Box::pin(async {
            state
                .products
                .check_store()
                .await
                .map_err(|e| e.to_string())
        }),
    )];

    match run_health_checks(checks).await {
        Ok(response) | Err(response) => response,
    }
}

/// `/health` (liveness) and `/ready` (store readiness)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state.clone())
        .merge(health_router(state.config.app))
}
