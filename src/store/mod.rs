//! Market registry storage
//!
//! `MarketRepository` is the seam the HTTP layer is written against. Three
//! backends implement it:
//!
//! - [`MemStorage`]: in-memory tables behind one `RwLock`
//! - [`SqliteStorage`]: the same relational lifecycle persisted with sqlx
//! - [`OnchainStub`]: read-only placeholder for deployments where markets
//!   live in contracts; lists are empty and market lookups report on-chain
//!
//! Relational backends share the rules in this module: bets are only taken on
//! active markets before their end date, aggregates move with every bet, and
//! settlement is one-way out of `active`.

mod memory;
mod onchain;
mod sqlite;

pub use memory::MemStorage;
pub use onchain::OnchainStub;
pub use sqlite::SqliteStorage;

use crate::error::StoreError;
use crate::types::{
    Bet, BetPatch, Market, MarketFilter, MarketPatch, MarketResult, NewBet, NewMarket, NewUser,
    User,
};
use crate::wallet::{hash_password, normalize_address};
use std::future::Future;

pub type StoreResult<T> = Result<T, StoreError>;

/// Page size used when a listing does not ask for one
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Storage contract for users, markets and bets.
///
/// Implementations must make `place_bet` atomic with respect to the parent
/// market's aggregates: concurrent bets never lose an update.
pub trait MarketRepository: Send + Sync + 'static {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    // Users
    fn list_users(&self) -> impl Future<Output = StoreResult<Vec<User>>> + Send;
    fn get_user(&self, id: i64) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    fn get_user_by_wallet(
        &self,
        address: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    fn create_user(&self, user: NewUser) -> impl Future<Output = StoreResult<User>> + Send;
    fn update_user_wallet(
        &self,
        id: i64,
        address: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    // Markets
    fn create_market(&self, market: NewMarket) -> impl Future<Output = StoreResult<Market>> + Send;
    fn get_market(&self, id: i64) -> impl Future<Output = StoreResult<Option<Market>>> + Send;
    fn list_markets(
        &self,
        filter: MarketFilter,
    ) -> impl Future<Output = StoreResult<Vec<Market>>> + Send;
    fn get_user_markets(
        &self,
        user_id: i64,
    ) -> impl Future<Output = StoreResult<Vec<Market>>> + Send;
    fn get_active_markets(&self) -> impl Future<Output = StoreResult<Vec<Market>>> + Send;
    fn update_market(
        &self,
        id: i64,
        patch: MarketPatch,
    ) -> impl Future<Output = StoreResult<Option<Market>>> + Send;
    fn resolve_market(
        &self,
        id: i64,
        result: MarketResult,
    ) -> impl Future<Output = StoreResult<Market>> + Send;

    // Bets
    fn place_bet(&self, bet: NewBet) -> impl Future<Output = StoreResult<Bet>> + Send;
    fn get_market_bets(
        &self,
        market_id: i64,
    ) -> impl Future<Output = StoreResult<Vec<Bet>>> + Send;
    fn get_user_bets(
        &self,
        user_id: i64,
        market_id: Option<i64>,
    ) -> impl Future<Output = StoreResult<Vec<Bet>>> + Send;
    fn update_bet(
        &self,
        id: i64,
        patch: BetPatch,
    ) -> impl Future<Output = StoreResult<Option<Bet>>> + Send;
}

/// A user registration with the wallet normalized and the password hashed
#[derive(Debug, Clone)]
pub(crate) struct UserDraft {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub wallet_address: Option<String>,
}

impl UserDraft {
    pub fn prepare(user: NewUser) -> StoreResult<Self> {
        let wallet_address = user
            .wallet_address
            .as_deref()
            .map(normalize_address)
            .transpose()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let password_hash = user.password.as_deref().map(hash_password).transpose()?;

        Ok(Self {
            username: user.username,
            password_hash,
            wallet_address,
        })
    }
}

/// Normalize a wallet address for lookup; unparseable input matches nothing
pub(crate) fn lookup_address(address: &str) -> Option<String> {
    normalize_address(address).ok()
}

/// Rejection for a bet that would push a market total past `Decimal::MAX`
pub(crate) fn stake_overflow() -> StoreError {
    StoreError::Invalid("Amount is too large".to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Behavior shared by every relational backend, run against each of them

    use super::*;
    use crate::types::{MarketStatus, Position};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    pub const OTHER_WALLET: &str = "0x1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d";

    pub fn new_market(creator_id: i64, title: &str, category: &str) -> NewMarket {
        NewMarket {
            title: title.to_string(),
            description: "A market used in tests".to_string(),
            category: category.to_string(),
            creator_id,
            contract_address: None,
            end_date: Utc::now() + Duration::days(7),
            metadata: None,
        }
    }

    pub fn new_bet(market_id: i64, user_id: i64, position: Position, amount: Decimal) -> NewBet {
        NewBet {
            market_id,
            user_id,
            position,
            amount,
            tx_hash: None,
            block_number: None,
        }
    }

    async fn seed_user<S: MarketRepository>(store: &S) -> User {
        store
            .create_user(NewUser {
                wallet_address: Some(WALLET.to_string()),
                username: Some("predictor".to_string()),
                password: Some("hunter2".to_string()),
            })
            .await
            .unwrap()
    }

    pub async fn market_lifecycle<S: MarketRepository>(store: &S) {
        let user = seed_user(store).await;
        let market = store
            .create_market(new_market(user.id, "Will X happen?", "technology"))
            .await
            .unwrap();
        assert_eq!(market.total_staked, Decimal::ZERO);
        assert_eq!(market.participant_count, 0);
        assert_eq!(market.status, MarketStatus::Active);

        store
            .place_bet(new_bet(market.id, user.id, Position::Yes, dec!(1.5)))
            .await
            .unwrap();
        let market = store.get_market(market.id).await.unwrap().unwrap();
        assert_eq!(market.yes_staked, dec!(1.5));
        assert_eq!(market.total_staked, dec!(1.5));
        assert_eq!(market.participant_count, 1);

        store
            .place_bet(new_bet(market.id, user.id, Position::No, dec!(0.75)))
            .await
            .unwrap();
        let market = store.get_market(market.id).await.unwrap().unwrap();
        assert_eq!(market.yes_staked + market.no_staked, market.total_staked);
        assert_eq!(market.participant_count, 2);

        let bets = store.get_market_bets(market.id).await.unwrap();
        assert_eq!(bets.len(), 2);
        assert!(bets.iter().all(|b| b.payout == Decimal::ZERO && !b.claimed));

        let resolved = store
            .resolve_market(market.id, MarketResult::Yes)
            .await
            .unwrap();
        assert_eq!(resolved.status, MarketStatus::Resolved);
        assert_eq!(resolved.result, Some(MarketResult::Yes));
        assert!(resolved.resolution_date.is_some());

        let again = store.resolve_market(market.id, MarketResult::No).await;
        assert!(matches!(again, Err(StoreError::AlreadySettled(MarketStatus::Resolved))));

        let late = store
            .place_bet(new_bet(market.id, user.id, Position::Yes, dec!(1)))
            .await;
        assert!(matches!(late, Err(StoreError::MarketClosed)));
    }

    pub async fn rejects_bets_after_end_date<S: MarketRepository>(store: &S) {
        let user = seed_user(store).await;
        let mut draft = new_market(user.id, "Already over?", "sports");
        draft.end_date = Utc::now() + Duration::milliseconds(20);
        let market = store.create_market(draft).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        let result = store
            .place_bet(new_bet(market.id, user.id, Position::No, dec!(2)))
            .await;
        assert!(matches!(result, Err(StoreError::MarketClosed)));
        assert!(store.get_active_markets().await.unwrap().is_empty());
    }

    pub async fn missing_references<S: MarketRepository>(store: &S) {
        let user = seed_user(store).await;
        assert!(matches!(
            store.resolve_market(999, MarketResult::Yes).await,
            Err(StoreError::NotFound("Market"))
        ));
        assert!(matches!(
            store
                .place_bet(new_bet(999, user.id, Position::Yes, dec!(1)))
                .await,
            Err(StoreError::NotFound("Market"))
        ));
        assert!(matches!(
            store.create_market(new_market(999, "Orphan market", "other")).await,
            Err(StoreError::NotFound("User"))
        ));
        assert!(store.get_market(999).await.unwrap().is_none());
    }

    pub async fn listing_and_filters<S: MarketRepository>(store: &S) {
        let user = seed_user(store).await;
        let first = store
            .create_market(new_market(user.id, "First market", "technology"))
            .await
            .unwrap();
        let second = store
            .create_market(new_market(user.id, "Second market", "politics"))
            .await
            .unwrap();
        store
            .resolve_market(second.id, MarketResult::Cancelled)
            .await
            .unwrap();

        let all = store.list_markets(MarketFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id, "newest first");

        let tech = store
            .list_markets(MarketFilter {
                category: Some("technology".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(tech.len(), 1);
        assert_eq!(tech[0].id, first.id);

        let cancelled = store
            .list_markets(MarketFilter {
                status: Some(MarketStatus::Cancelled),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);

        let paged = store
            .list_markets(MarketFilter {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, first.id);

        let active = store.get_active_markets().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(store.get_user_markets(user.id).await.unwrap().len(), 2);

        let patched = store
            .update_market(
                first.id,
                MarketPatch {
                    title: Some("First market, renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched.title, "First market, renamed");
        assert!(patched.updated_at >= first.updated_at);
    }

    pub async fn users_and_wallets<S: MarketRepository>(store: &S) {
        let user = seed_user(store).await;
        assert!(user.password_hash.is_some());
        assert_eq!(user.wallet_address.as_deref(), Some(WALLET));

        let by_wallet = store
            .get_user_by_wallet(&WALLET.to_lowercase())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_wallet.id, user.id);
        assert_eq!(
            store
                .get_user_by_username("predictor")
                .await
                .unwrap()
                .map(|u| u.id),
            Some(user.id)
        );

        let duplicate = store
            .create_user(NewUser {
                wallet_address: Some(WALLET.to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate { .. })));

        let moved = store
            .update_user_wallet(user.id, OTHER_WALLET)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            moved.wallet_address.as_deref().map(str::to_lowercase),
            Some(OTHER_WALLET.to_lowercase())
        );
        assert!(store.get_user_by_wallet(WALLET).await.unwrap().is_none());
        assert!(store.update_user_wallet(999, WALLET).await.unwrap().is_none());
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    pub async fn user_bets_and_updates<S: MarketRepository>(store: &S) {
        let user = seed_user(store).await;
        let a = store
            .create_market(new_market(user.id, "Market A", "science"))
            .await
            .unwrap();
        let b = store
            .create_market(new_market(user.id, "Market B", "science"))
            .await
            .unwrap();
        let bet = store
            .place_bet(new_bet(a.id, user.id, Position::Yes, dec!(1)))
            .await
            .unwrap();
        store
            .place_bet(new_bet(b.id, user.id, Position::No, dec!(2)))
            .await
            .unwrap();

        assert_eq!(store.get_user_bets(user.id, None).await.unwrap().len(), 2);
        let only_b = store.get_user_bets(user.id, Some(b.id)).await.unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].amount, dec!(2));

        let updated = store
            .update_bet(
                bet.id,
                BetPatch {
                    claimed: Some(true),
                    tx_hash: Some("0xabc".to_string()),
                    block_number: Some(42),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.claimed);
        assert_eq!(updated.block_number, Some(42));
        assert_eq!(updated.payout, Decimal::ZERO);
    }

    pub async fn rejects_overflowing_stakes<S: MarketRepository>(store: &S) {
        let user = seed_user(store).await;
        let market = store
            .create_market(new_market(user.id, "Whale market", "economy"))
            .await
            .unwrap();

        store
            .place_bet(new_bet(market.id, user.id, Position::Yes, Decimal::MAX))
            .await
            .unwrap();
        let overflow = store
            .place_bet(new_bet(market.id, user.id, Position::No, Decimal::MAX))
            .await;
        assert!(matches!(overflow, Err(StoreError::Invalid(_))));

        let market = store.get_market(market.id).await.unwrap().unwrap();
        assert_eq!(market.total_staked, Decimal::MAX);
        assert_eq!(market.no_staked, Decimal::ZERO);
        assert_eq!(market.participant_count, 1);
        assert_eq!(store.get_market_bets(market.id).await.unwrap().len(), 1);
    }
}
