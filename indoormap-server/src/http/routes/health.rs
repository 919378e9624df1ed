//! Health check endpoint
//!
//! Reports whether the building and issue stores answer. Either store
//! failing turns the response into a 503 so load balancers stop routing.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::db::repos::DbError;
use crate::state::AppState;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Up,
    Down,
}

impl StoreStatus {
    fn from_ping(store: &'static str, result: Result<(), DbError>) -> Self {
        match result {
            Ok(()) => Self::Up,
            Err(e) => {
                tracing::warn!(store, error = %e, "health check failed");
                Self::Down
            }
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub buildings: StoreStatus,
    pub issues: StoreStatus,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let buildings = StoreStatus::from_ping("buildings", state.buildings.ping().await);
    let issues = StoreStatus::from_ping("issues", state.issues.ping().await);

    let healthy = buildings == StoreStatus::Up && issues == StoreStatus::Up;
    let (code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            buildings,
            issues,
        }),
    )
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
