//! Axum server setup and configuration

use crate::api::routes;
use crate::store::MarketRepository;
use crate::Config;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState<S> {
    pub store: Arc<S>,
    pub config: Arc<Config>,
}

impl<S> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}

// Manual impl: the repository itself need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

/// Create the Axum application with all routes
pub fn create_app<S: MarketRepository>(state: AppState<S>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/health", get(routes::health::health_check::<S>))
        // Market routes
        .route(
            "/markets",
            get(routes::markets::list_markets::<S>).post(routes::markets::create_market::<S>),
        )
        .route(
            "/markets/:id",
            get(routes::markets::get_market::<S>).patch(routes::markets::update_market::<S>),
        )
        .route("/markets/:id/resolve", post(routes::markets::resolve_market::<S>))
        // Bet routes
        .route(
            "/markets/:id/bets",
            get(routes::bets::list_market_bets::<S>).post(routes::bets::place_bet::<S>),
        )
        // User routes
        .route(
            "/users",
            get(routes::users::list_users::<S>).post(routes::users::create_user::<S>),
        )
        .route(
            "/users/wallet/:address",
            get(routes::users::get_user_by_wallet::<S>),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user::<S>).patch(routes::users::update_user_wallet::<S>),
        )
        .route("/users/:id/bets", get(routes::bets::list_user_bets::<S>))
        .route("/users/:id/markets", get(routes::markets::list_user_markets::<S>));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ONCHAIN_MESSAGE;
    use crate::store::{MemStorage, OnchainStub};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn memory_app() -> Router {
        create_app(AppState::new(MemStorage::new(), Config::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(body) => send_raw(app, method, uri, Some("application/json"), body.to_string()).await,
            None => send_raw(app, method, uri, None, String::new()).await,
        }
    }

    async fn send_raw(
        app: &Router,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn seed_user(app: &Router) -> i64 {
        let (status, user) = send(app, "POST", "/api/users", Some(json!({ "walletAddress": WALLET }))).await;
        assert_eq!(status, StatusCode::CREATED);
        user["id"].as_i64().unwrap()
    }

    async fn seed_market(app: &Router, creator_id: i64) -> Value {
        let (status, market) = send(
            app,
            "POST",
            "/api/markets",
            Some(json!({
                "title": "Will X happen?",
                "description": "Resolves yes if X happens before the end date",
                "category": "technology",
                "creatorId": creator_id,
                "endDate": (Utc::now() + Duration::days(7)).to_rfc3339(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        market
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&memory_app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "memory");
    }

    #[tokio::test]
    async fn test_create_market_starts_empty() {
        let app = memory_app();
        let user_id = seed_user(&app).await;
        let market = seed_market(&app, user_id).await;

        assert_eq!(market["totalStaked"], "0");
        assert_eq!(market["participantCount"], 0);
        assert_eq!(market["status"], "active");

        let (status, list) = send(&app, "GET", "/api/markets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bet_updates_aggregates() {
        let app = memory_app();
        let user_id = seed_user(&app).await;
        let market = seed_market(&app, user_id).await;
        let id = market["id"].as_i64().unwrap();

        let (status, bet) = send(
            &app,
            "POST",
            &format!("/api/markets/{}/bets", id),
            Some(json!({ "userId": user_id, "position": "yes", "amount": "1.5" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(bet["marketId"], id);
        assert_eq!(bet["claimed"], false);

        let (_, market) = send(&app, "GET", &format!("/api/markets/{}", id), None).await;
        assert_eq!(market["yesStaked"], "1.5");
        assert_eq!(market["totalStaked"], "1.5");
        assert_eq!(market["participantCount"], 1);

        let (_, bets) = send(&app, "GET", &format!("/api/users/{}/bets?marketId={}", user_id, id), None).await;
        assert_eq!(bets.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_flow() {
        let app = memory_app();
        let user_id = seed_user(&app).await;
        let id = seed_market(&app, user_id).await["id"].as_i64().unwrap();

        let (status, _) = send(&app, "POST", "/api/markets/999/resolve", Some(json!({ "result": "yes" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, market) = send(
            &app,
            "POST",
            &format!("/api/markets/{}/resolve", id),
            Some(json!({ "result": "no" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(market["status"], "resolved");
        assert_eq!(market["result"], "no");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/markets/{}/bets", id),
            Some(json!({ "userId": user_id, "position": "no", "amount": "2" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not accepting"));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = memory_app();
        let user_id = seed_user(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/markets",
            Some(json!({
                "title": "Past market",
                "category": "other",
                "creatorId": user_id,
                "endDate": (Utc::now() - Duration::days(1)).to_rfc3339(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["field"], "endDate");

        let (status, body) = send(&app, "POST", "/api/markets", Some(json!({ "title": 5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");

        let (status, _) = send(
            &app,
            "POST",
            "/api/users",
            Some(json!({ "walletAddress": WALLET.to_lowercase() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_requests_get_json_errors() {
        let app = memory_app();
        let user_id = seed_user(&app).await;
        let market = seed_market(&app, user_id).await;

        let (status, body) =
            send_raw(&app, "POST", "/api/markets", Some("application/json"), "{not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");
        assert_eq!(body["details"][0]["field"], "body");

        let bet = json!({ "userId": user_id, "position": "yes", "amount": "1" }).to_string();
        let uri = format!("/api/markets/{}/bets", market["id"]);
        let (status, body) = send_raw(&app, "POST", &uri, None, bet.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");

        let (status, body) = send_raw(&app, "POST", &uri, Some("text/plain"), bet).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");

        let (status, body) = send(&app, "GET", "/api/markets/not-a-number", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");
        assert_eq!(body["details"][0]["field"], "path");

        let (status, body) = send(&app, "GET", "/api/users/abc/bets", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");
    }

    #[tokio::test]
    async fn test_user_routes() {
        let app = memory_app();
        let user_id = seed_user(&app).await;

        let (status, user) = send(&app, "GET", &format!("/api/users/wallet/{}", WALLET.to_lowercase()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["id"], user_id);
        assert!(user.get("passwordHash").is_none());

        let (status, _) = send(&app, "GET", "/api/users/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/users/wallet/0x0000000000000000000000000000000000000001", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, user) = send(
            &app,
            "PATCH",
            &format!("/api/users/{}", user_id),
            Some(json!({ "walletAddress": "0x1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            user["walletAddress"].as_str().unwrap().to_lowercase(),
            "0x1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d"
        );
    }

    #[tokio::test]
    async fn test_onchain_backend_defers_to_contracts() {
        let app = create_app(AppState::new(OnchainStub::new(), Config::default()));

        let (status, list) = send(&app, "GET", "/api/markets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, json!([]));

        let (status, body) = send(&app, "GET", "/api/markets/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], ONCHAIN_MESSAGE);

        let (status, user) = send(&app, "GET", &format!("/api/users/wallet/{}", WALLET), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["walletAddress"], WALLET);
    }
}
