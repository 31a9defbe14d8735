//! Market Registry REST API
//!
//! JSON endpoints for markets, bets and users under `/api`, served by axum
//! over any [`MarketRepository`](crate::store::MarketRepository).

pub mod routes;
pub mod server;

pub use server::{create_app, AppState};
