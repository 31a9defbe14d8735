//! Market API endpoints

use super::{check, parse_body, ApiJson, ApiPath};
use crate::api::server::AppState;
use crate::error::ApiError;
use crate::store::MarketRepository;
use crate::types::{Market, MarketFilter, MarketPatch, MarketResult, NewMarket};
use crate::validation::{validate_market_patch, validate_new_market};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Body of a resolve request
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub result: MarketResult,
}

/// List markets, newest first
pub async fn list_markets<S: MarketRepository>(
    State(state): State<AppState<S>>,
    Query(mut filter): Query<MarketFilter>,
) -> Result<Json<Vec<Market>>, ApiError> {
    filter.limit.get_or_insert(state.config.default_page_limit);
    let markets = state.store.list_markets(filter).await?;
    Ok(Json(markets))
}

pub async fn get_market<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Market>, ApiError> {
    let market = state
        .store
        .get_market(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Market not found".to_string()))?;
    Ok(Json(market))
}

pub async fn create_market<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<Market>), ApiError> {
    let new_market: NewMarket = parse_body(body)?;
    check(&new_market, validate_new_market)?;

    let market = state.store.create_market(new_market).await?;
    info!("Market {} created: {}", market.id, market.title);
    Ok((StatusCode::CREATED, Json(market)))
}

pub async fn update_market<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Market>, ApiError> {
    let patch: MarketPatch = parse_body(body)?;
    check(&patch, validate_market_patch)?;

    let market = state
        .store
        .update_market(id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Market not found".to_string()))?;
    Ok(Json(market))
}

/// Record the final outcome. Payouts happen in the market contract.
pub async fn resolve_market<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Market>, ApiError> {
    let request: ResolveRequest = parse_body(body)?;
    let market = state.store.resolve_market(id, request.result).await?;
    info!("Market {} resolved: {}", id, request.result);
    Ok(Json(market))
}

/// Markets created by a user
pub async fn list_user_markets<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Vec<Market>>, ApiError> {
    Ok(Json(state.store.get_user_markets(user_id).await?))
}
