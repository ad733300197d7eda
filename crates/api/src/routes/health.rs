//! Liveness check, mounted at `/health` outside `/api/v1`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// Serving, but the database did not answer.
    Degraded,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Guest sessions held in memory, including idle ones not yet evicted.
    pub active_sessions: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match memora_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    Json(HealthResponse {
        status: if db_healthy {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        active_sessions: state.sessions.len(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
