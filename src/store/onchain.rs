//! Placeholder store for deployments where markets live in contracts

use super::{lookup_address, MarketRepository, StoreResult};
use crate::error::StoreError;
use crate::types::{
    Bet, BetPatch, Market, MarketFilter, MarketPatch, MarketResult, NewBet, NewMarket, NewUser,
    User,
};
use chrono::Utc;
use tracing::debug;

/// Reads come back empty, market lookups and writes report that the data is
/// on-chain. Clients are expected to go through the contract bindings.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnchainStub;

impl OnchainStub {
    pub fn new() -> Self {
        Self
    }
}

impl MarketRepository for OnchainStub {
    fn backend(&self) -> &'static str {
        "onchain"
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(Vec::new())
    }

    async fn get_user(&self, _id: i64) -> StoreResult<Option<User>> {
        Ok(None)
    }

    async fn get_user_by_username(&self, _username: &str) -> StoreResult<Option<User>> {
        Ok(None)
    }

    /// Every wallet is a user; the record is synthesized on each lookup
    async fn get_user_by_wallet(&self, address: &str) -> StoreResult<Option<User>> {
        Ok(lookup_address(address).map(|wallet| User {
            id: 0,
            username: None,
            password_hash: None,
            wallet_address: Some(wallet),
            created_at: Utc::now(),
        }))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let wallet = user
            .wallet_address
            .as_deref()
            .and_then(lookup_address)
            .ok_or_else(|| StoreError::Invalid("Invalid wallet address".to_string()))?;
        debug!("Wallet {} linked without persistence", wallet);
        Ok(User {
            id: 0,
            username: user.username,
            password_hash: None,
            wallet_address: Some(wallet),
            created_at: Utc::now(),
        })
    }

    async fn update_user_wallet(&self, _id: i64, _address: &str) -> StoreResult<Option<User>> {
        Ok(None)
    }

    async fn create_market(&self, _market: NewMarket) -> StoreResult<Market> {
        Err(StoreError::Onchain)
    }

    async fn get_market(&self, _id: i64) -> StoreResult<Option<Market>> {
        Err(StoreError::Onchain)
    }

    async fn list_markets(&self, _filter: MarketFilter) -> StoreResult<Vec<Market>> {
        Ok(Vec::new())
    }

    async fn get_user_markets(&self, _user_id: i64) -> StoreResult<Vec<Market>> {
        Ok(Vec::new())
    }

    async fn get_active_markets(&self) -> StoreResult<Vec<Market>> {
        Ok(Vec::new())
    }

    async fn update_market(&self, _id: i64, _patch: MarketPatch) -> StoreResult<Option<Market>> {
        Err(StoreError::Onchain)
    }

    async fn resolve_market(&self, _id: i64, _result: MarketResult) -> StoreResult<Market> {
        Err(StoreError::Onchain)
    }

    async fn place_bet(&self, _bet: NewBet) -> StoreResult<Bet> {
        Err(StoreError::Onchain)
    }

    async fn get_market_bets(&self, _market_id: i64) -> StoreResult<Vec<Bet>> {
        Ok(Vec::new())
    }

    async fn get_user_bets(&self, _user_id: i64, _market_id: Option<i64>) -> StoreResult<Vec<Bet>> {
        Ok(Vec::new())
    }

    async fn update_bet(&self, _id: i64, _patch: BetPatch) -> StoreResult<Option<Bet>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ONCHAIN_MESSAGE;
    use crate::store::test_support::WALLET;

    #[tokio::test]
    async fn test_lists_are_empty() {
        let store = OnchainStub::new();
        assert!(store.list_markets(MarketFilter::default()).await.unwrap().is_empty());
        assert!(store.get_market_bets(1).await.unwrap().is_empty());
        assert!(store.get_user_bets(1, None).await.unwrap().is_empty());
        assert!(store.get_active_markets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_market_lookup_points_to_chain() {
        let err = OnchainStub::new().get_market(1).await.unwrap_err();
        assert!(matches!(err, StoreError::Onchain));
        assert_eq!(err.to_string(), ONCHAIN_MESSAGE);
    }

    #[tokio::test]
    async fn test_wallet_lookup_synthesizes_user() {
        let user = OnchainStub::new()
            .get_user_by_wallet(&WALLET.to_lowercase())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.wallet_address.as_deref(), Some(WALLET));
        assert!(OnchainStub::new()
            .get_user_by_wallet("nope")
            .await
            .unwrap()
            .is_none());
    }
}
