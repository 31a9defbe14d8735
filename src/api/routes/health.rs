//! Liveness endpoint

use crate::api::server::AppState;
use crate::store::MarketRepository;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn health_check<S: MarketRepository>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.store.backend(),
        timestamp: Utc::now(),
    })
}
