//! JSON client for the Market Registry API

use super::error::{ClientError, ClientResult};
use crate::types::{
    Bet, Market, MarketFilter, MarketPatch, MarketResult, NewBet, NewMarket, NewUser, User,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Thin typed wrapper over the REST endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::from_network_error(&e))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_network_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_network_error(&e))?;

        if !status.is_success() {
            debug!("API error {}: {}", status, body);
            return Err(ClientError::from_response(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(method, path).json(body)).await
    }

    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        self.get("/api/health").await
    }

    // Markets

    pub async fn list_markets(&self, filter: &MarketFilter) -> ClientResult<Vec<Market>> {
        self.send(self.request(Method::GET, "/api/markets").query(filter))
            .await
    }

    pub async fn get_market(&self, id: i64) -> ClientResult<Market> {
        self.get(&format!("/api/markets/{}", id)).await
    }

    pub async fn create_market(&self, market: &NewMarket) -> ClientResult<Market> {
        self.write(Method::POST, "/api/markets", market).await
    }

    pub async fn update_market(&self, id: i64, patch: &MarketPatch) -> ClientResult<Market> {
        self.write(Method::PATCH, &format!("/api/markets/{}", id), patch)
            .await
    }

    pub async fn resolve_market(&self, id: i64, result: MarketResult) -> ClientResult<Market> {
        self.write(
            Method::POST,
            &format!("/api/markets/{}/resolve", id),
            &json!({ "result": result }),
        )
        .await
    }

    // Bets

    pub async fn market_bets(&self, market_id: i64) -> ClientResult<Vec<Bet>> {
        self.get(&format!("/api/markets/{}/bets", market_id)).await
    }

    pub async fn place_bet(&self, market_id: i64, bet: &NewBet) -> ClientResult<Bet> {
        self.write(Method::POST, &format!("/api/markets/{}/bets", market_id), bet)
            .await
    }

    pub async fn user_bets(&self, user_id: i64, market_id: Option<i64>) -> ClientResult<Vec<Bet>> {
        let mut request = self.request(Method::GET, &format!("/api/users/{}/bets", user_id));
        if let Some(market_id) = market_id {
            request = request.query(&[("marketId", market_id)]);
        }
        self.send(request).await
    }

    // Users

    pub async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.get("/api/users").await
    }

    pub async fn get_user(&self, id: i64) -> ClientResult<User> {
        self.get(&format!("/api/users/{}", id)).await
    }

    pub async fn user_by_wallet(&self, address: &str) -> ClientResult<User> {
        self.get(&format!("/api/users/wallet/{}", address)).await
    }

    pub async fn user_markets(&self, user_id: i64) -> ClientResult<Vec<Market>> {
        self.get(&format!("/api/users/{}/markets", user_id)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> ClientResult<User> {
        self.write(Method::POST, "/api/users", user).await
    }

    pub async fn update_user_wallet(&self, id: i64, address: &str) -> ClientResult<User> {
        self.write(
            Method::PATCH,
            &format!("/api/users/{}", id),
            &json!({ "walletAddress": address }),
        )
        .await
    }
}
