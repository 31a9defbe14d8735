//! Guarded writes with cache invalidation

use super::{ClientError, ClientResult, DataClient, QueryKey, MARKETS_KEY, USERS_KEY};
use crate::types::{Bet, Market, MarketResult, NewBet, NewMarket, NewUser, User};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// One trigger of a mutation at a time: a second trigger while the first is
/// pending fails with [`ClientError::Pending`].
#[derive(Debug)]
pub struct MutationControl {
    name: &'static str,
    pending: AtomicBool,
}

impl MutationControl {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: AtomicBool::new(false),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn begin(&self) -> ClientResult<InFlight<'_>> {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Ignoring duplicate '{}' while one is pending", self.name);
            return Err(ClientError::Pending);
        }
        Ok(InFlight { control: self })
    }
}

/// Clears the pending flag on drop
#[derive(Debug)]
pub struct InFlight<'a> {
    control: &'a MutationControl,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.control.pending.store(false, Ordering::Release);
    }
}

impl DataClient {
    async fn report_failure(&self, title: &str, err: &ClientError) {
        warn!("{} failed: {}", title, err);
        self.toaster.error(title, err.user_message()).await;
    }

    async fn invalidate_market(&self, market_id: i64) {
        self.cache.invalidate(&QueryKey::new(MARKETS_KEY)).await;
        self.cache
            .invalidate(&QueryKey::new(MARKETS_KEY).with(market_id))
            .await;
    }

    pub async fn create_market(&self, market: &NewMarket) -> ClientResult<Market> {
        let _guard = self.create_market_control.begin()?;
        match self.api.create_market(market).await {
            Ok(created) => {
                self.cache.invalidate(&QueryKey::new(MARKETS_KEY)).await;
                info!("Market {} created", created.id);
                self.toaster
                    .success("Market created", format!("\"{}\" is now open", created.title))
                    .await;
                Ok(created)
            }
            Err(e) => {
                self.report_failure("Failed to create market", &e).await;
                Err(e)
            }
        }
    }

    pub async fn place_bet(&self, market_id: i64, bet: &NewBet) -> ClientResult<Bet> {
        let _guard = self.place_bet_control.begin()?;
        match self.api.place_bet(market_id, bet).await {
            Ok(placed) => {
                // Clears the market list, this market and its bet list
                self.invalidate_market(market_id).await;
                self.toaster
                    .success(
                        "Bet placed",
                        format!("{} on {}", placed.amount, placed.position),
                    )
                    .await;
                Ok(placed)
            }
            Err(e) => {
                self.report_failure("Failed to place bet", &e).await;
                Err(e)
            }
        }
    }

    pub async fn resolve_market(&self, market_id: i64, result: MarketResult) -> ClientResult<Market> {
        let _guard = self.resolve_market_control.begin()?;
        match self.api.resolve_market(market_id, result).await {
            Ok(market) => {
                self.invalidate_market(market_id).await;
                self.toaster
                    .success("Market resolved", format!("Outcome: {}", result))
                    .await;
                Ok(market)
            }
            Err(e) => {
                self.report_failure("Failed to resolve market", &e).await;
                Err(e)
            }
        }
    }

    pub async fn create_user(&self, user: &NewUser) -> ClientResult<User> {
        let _guard = self.create_user_control.begin()?;
        match self.api.create_user(user).await {
            Ok(created) => {
                self.cache.invalidate(&QueryKey::new(USERS_KEY)).await;
                Ok(created)
            }
            Err(e) => {
                self.report_failure("Failed to register wallet", &e).await;
                Err(e)
            }
        }
    }

    pub async fn update_user_wallet(&self, user_id: i64, address: &str) -> ClientResult<User> {
        let _guard = self.update_wallet_control.begin()?;
        match self.api.update_user_wallet(user_id, address).await {
            Ok(user) => {
                self.cache.invalidate(&QueryKey::new(USERS_KEY)).await;
                Ok(user)
            }
            Err(e) => {
                self.report_failure("Failed to update wallet", &e).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{test_server, ApiClient, QueryCache, ToastVariant, Toaster};
    use crate::types::Position;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    async fn client() -> DataClient {
        let base = test_server::spawn().await;
        DataClient::new(
            ApiClient::new(base).unwrap(),
            Arc::new(QueryCache::default()),
            Arc::new(Toaster::new()),
        )
    }

    fn new_market(creator_id: i64) -> NewMarket {
        NewMarket {
            title: "Will ETH close above 5000?".to_string(),
            description: "Resolves on the daily close of the end date".to_string(),
            category: "cryptocurrency".to_string(),
            creator_id,
            contract_address: None,
            end_date: Utc::now() + Duration::days(3),
            metadata: None,
        }
    }

    #[test]
    fn test_control_rejects_second_trigger() {
        let control = MutationControl::new("test");
        let guard = control.begin().unwrap();
        assert!(control.is_pending());
        assert_eq!(control.begin().unwrap_err(), ClientError::Pending);
        drop(guard);
        assert!(!control.is_pending());
        assert!(control.begin().is_ok());
    }

    #[tokio::test]
    async fn test_bet_invalidates_market_entries() {
        let client = client().await;
        let user = client
            .create_user(&NewUser {
                wallet_address: Some(WALLET.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let market = client.create_market(&new_market(user.id)).await.unwrap();

        assert_eq!(client.markets(None, None).await.unwrap().len(), 1);
        let cached = client.market(market.id).await.unwrap().unwrap();
        assert_eq!(cached.total_staked, dec!(0));
        client.market_bets(market.id).await.unwrap();
        client.user_bets(user.id, None).await.unwrap();
        assert_eq!(client.cache().len().await, 4);

        client
            .place_bet(
                market.id,
                &NewBet {
                    market_id: market.id,
                    user_id: user.id,
                    position: Position::Yes,
                    amount: dec!(1.5),
                    tx_hash: None,
                    block_number: None,
                },
            )
            .await
            .unwrap();

        // Only the user's bet list survives
        assert_eq!(client.cache().len().await, 1);
        let fresh = client.market(market.id).await.unwrap().unwrap();
        assert_eq!(fresh.total_staked, dec!(1.5));
        assert_eq!(fresh.participant_count, 1);
    }

    #[tokio::test]
    async fn test_failure_raises_destructive_toast() {
        let client = client().await;
        let err = client
            .resolve_market(404, MarketResult::Yes)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let toasts = client.toaster().drain().await;
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].variant, ToastVariant::Destructive);
        assert_eq!(toasts[0].description, "Market not found");
        assert!(!client.resolve_market_control.is_pending());
    }
}
