//! User API endpoints

use super::{check, parse_body, ApiJson, ApiPath};
use crate::api::server::AppState;
use crate::error::ApiError;
use crate::store::MarketRepository;
use crate::types::{NewUser, User};
use crate::validation::validate_new_user;
use crate::wallet::is_wallet_address;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Body of a wallet update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWalletRequest {
    pub wallet_address: String,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

pub async fn list_users<S: MarketRepository>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.list_users().await?))
}

pub async fn get_user<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state.store.get_user(id).await?.ok_or_else(user_not_found)?;
    Ok(Json(user))
}

pub async fn get_user_by_wallet<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(address): ApiPath<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .store
        .get_user_by_wallet(&address)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user))
}

/// Register a user on first wallet link
pub async fn create_user<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let new_user: NewUser = parse_body(body)?;
    check(&new_user, validate_new_user)?;

    let user = state.store.create_user(new_user).await?;
    info!("User {} registered", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user_wallet<S: MarketRepository>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<User>, ApiError> {
    let request: UpdateWalletRequest = parse_body(body)?;
    if !is_wallet_address(&request.wallet_address) {
        return Err(ApiError::invalid_fields(vec![crate::error::FieldError::new(
            "walletAddress",
            "Invalid wallet address",
        )]));
    }

    let user = state
        .store
        .update_user_wallet(id, &request.wallet_address)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user))
}
