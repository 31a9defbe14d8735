//! Bet API endpoints

use super::{check, parse_body, ApiJson, ApiPath};
use crate::api::server::AppState;
use crate::error::ApiError;
use crate::store::MarketRepository;
use crate::types::{Bet, NewBet};
use crate::validation::validate_new_bet;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Query parameters for a user's bets
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBetsQuery {
    pub market_id: Option<i64>,
}

pub async fn list_market_bets<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(market_id): ApiPath<i64>,
) -> Result<Json<Vec<Bet>>, ApiError> {
    Ok(Json(state.store.get_market_bets(market_id).await?))
}

/// Place a bet; the market id in the path wins over any in the body
pub async fn place_bet<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(market_id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<Bet>), ApiError> {
    let mut new_bet: NewBet = parse_body(body)?;
    new_bet.market_id = market_id;
    check(&new_bet, validate_new_bet)?;

    let bet = state.store.place_bet(new_bet).await?;
    info!(
        "Bet {} placed: {} {} on market {}",
        bet.id, bet.amount, bet.position, bet.market_id
    );
    Ok((StatusCode::CREATED, Json(bet)))
}

pub async fn list_user_bets<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(user_id): ApiPath<i64>,
    Query(query): Query<UserBetsQuery>,
) -> Result<Json<Vec<Bet>>, ApiError> {
    Ok(Json(state.store.get_user_bets(user_id, query.market_id).await?))
}
