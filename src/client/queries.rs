//! Cached reads
//!
//! Id-keyed queries are disabled for id 0 and return `Ok(None)` without a
//! request, the way an unselected market or a disconnected wallet behaves.

use super::{ClientResult, DataClient, QueryKey, MARKETS_KEY, USERS_KEY};
use crate::types::{Bet, Market, MarketFilter, MarketStatus, User};
use serde_json::json;

impl DataClient {
    pub async fn markets(
        &self,
        category: Option<&str>,
        status: Option<MarketStatus>,
    ) -> ClientResult<Vec<Market>> {
        let filter = MarketFilter {
            category: category.map(str::to_string),
            status,
            ..Default::default()
        };
        let key = QueryKey::new(MARKETS_KEY).with_params(&filter);
        self.cache
            .fetch(key, || self.api.list_markets(&filter))
            .await
    }

    pub async fn market(&self, id: i64) -> ClientResult<Option<Market>> {
        if id == 0 {
            return Ok(None);
        }
        let key = QueryKey::new(MARKETS_KEY).with(id);
        self.cache
            .fetch(key, || async { self.api.get_market(id).await.map(Some) })
            .await
    }

    pub async fn user_markets(&self, user_id: i64) -> ClientResult<Option<Vec<Market>>> {
        if user_id == 0 {
            return Ok(None);
        }
        let key = QueryKey::new(USERS_KEY).with(user_id).with("markets");
        self.cache
            .fetch(key, || async { self.api.user_markets(user_id).await.map(Some) })
            .await
    }

    pub async fn market_bets(&self, market_id: i64) -> ClientResult<Option<Vec<Bet>>> {
        if market_id == 0 {
            return Ok(None);
        }
        let key = QueryKey::new(MARKETS_KEY).with(market_id).with("bets");
        self.cache
            .fetch(key, || async { self.api.market_bets(market_id).await.map(Some) })
            .await
    }

    pub async fn user_bets(
        &self,
        user_id: i64,
        market_id: Option<i64>,
    ) -> ClientResult<Option<Vec<Bet>>> {
        if user_id == 0 {
            return Ok(None);
        }
        // A zero market filter means no filter
        let market_id = market_id.filter(|id| *id != 0);
        let key = QueryKey::new(USERS_KEY)
            .with(user_id)
            .with("bets")
            .with_params(&json!({ "marketId": market_id }));
        self.cache
            .fetch(key, || async {
                self.api.user_bets(user_id, market_id).await.map(Some)
            })
            .await
    }

    /// The user linked to a wallet; `None` when the wallet is unknown
    pub async fn user_by_wallet(&self, address: &str) -> ClientResult<Option<User>> {
        if address.is_empty() {
            return Ok(None);
        }
        let key = QueryKey::new(USERS_KEY).with("wallet").with(address);
        self.cache
            .fetch(key, || async {
                match self.api.user_by_wallet(address).await {
                    Ok(user) => Ok(Some(user)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{test_server, ApiClient, QueryCache, Toaster};
    use std::sync::Arc;

    async fn client() -> DataClient {
        let base = test_server::spawn().await;
        DataClient::new(
            ApiClient::new(base).unwrap(),
            Arc::new(QueryCache::default()),
            Arc::new(Toaster::new()),
        )
    }

    #[tokio::test]
    async fn test_disabled_queries_skip_the_network() {
        let client = client().await;
        assert!(client.market(0).await.unwrap().is_none());
        assert!(client.market_bets(0).await.unwrap().is_none());
        assert!(client.user_bets(0, None).await.unwrap().is_none());
        assert!(client.user_markets(0).await.unwrap().is_none());
        assert!(client.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_reads_are_cached() {
        let client = client().await;
        assert!(client.markets(None, None).await.unwrap().is_empty());
        assert!(client
            .markets(Some("sports"), Some(MarketStatus::Active))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(client.cache().len().await, 2);

        let missing = client.market(99).await.unwrap_err();
        assert!(missing.is_not_found());
        assert_eq!(client.cache().len().await, 2);

        let unknown = client
            .user_by_wallet("0x742d35Cc6634C0532925a3b844Bc454e4438f44e")
            .await
            .unwrap();
        assert!(unknown.is_none());
    }
}
