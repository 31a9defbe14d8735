//! In-memory relational store

use super::{
    lookup_address, stake_overflow, MarketRepository, StoreResult, UserDraft, DEFAULT_PAGE_LIMIT,
};
use crate::error::StoreError;
use crate::types::{
    Bet, BetPatch, Market, MarketFilter, MarketPatch, MarketResult, MarketStatus, NewBet,
    NewMarket, NewUser, User,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
struct Tables {
    users: BTreeMap<i64, User>,
    markets: BTreeMap<i64, Market>,
    bets: BTreeMap<i64, Bet>,
    next_user_id: i64,
    next_market_id: i64,
    next_bet_id: i64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            markets: BTreeMap::new(),
            bets: BTreeMap::new(),
            next_user_id: 1,
            next_market_id: 1,
            next_bet_id: 1,
        }
    }
}

impl Tables {
    fn wallet_taken(&self, wallet: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.wallet_address.as_deref() == Some(wallet))
    }
}

/// Demo store: all tables live behind a single lock, so every write
/// (including bet placement with its aggregate update) is serialized.
#[derive(Debug, Default)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarketRepository for MemStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn get_user_by_wallet(&self, address: &str) -> StoreResult<Option<User>> {
        let Some(address) = lookup_address(address) else {
            return Ok(None);
        };
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.wallet_address.as_deref() == Some(address.as_str()))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let draft = UserDraft::prepare(user)?;
        let mut tables = self.tables.write().await;

        if let Some(wallet) = &draft.wallet_address {
            if tables.wallet_taken(wallet, None) {
                return Err(StoreError::Duplicate {
                    field: "walletAddress",
                });
            }
        }
        if let Some(username) = &draft.username {
            if tables
                .users
                .values()
                .any(|u| u.username.as_ref() == Some(username))
            {
                return Err(StoreError::Duplicate { field: "username" });
            }
        }

        let id = tables.next_user_id;
        tables.next_user_id += 1;
        let user = User {
            id,
            username: draft.username,
            password_hash: draft.password_hash,
            wallet_address: draft.wallet_address,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        debug!("Created user {}", id);
        Ok(user)
    }

    async fn update_user_wallet(&self, id: i64, address: &str) -> StoreResult<Option<User>> {
        let wallet = lookup_address(address)
            .ok_or_else(|| StoreError::Invalid("Invalid wallet address".to_string()))?;
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        if tables.wallet_taken(&wallet, Some(id)) {
            return Err(StoreError::Duplicate {
                field: "walletAddress",
            });
        }

        let user = tables.users.get_mut(&id).map(|u| {
            u.wallet_address = Some(wallet);
            u.clone()
        });
        Ok(user)
    }

    async fn create_market(&self, market: NewMarket) -> StoreResult<Market> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&market.creator_id) {
            return Err(StoreError::NotFound("User"));
        }

        let id = tables.next_market_id;
        tables.next_market_id += 1;
        let now = Utc::now();
        let market = Market {
            id,
            title: market.title,
            description: market.description,
            category: market.category,
            creator_id: market.creator_id,
            contract_address: market.contract_address,
            end_date: market.end_date,
            resolution_date: None,
            status: MarketStatus::Active,
            result: None,
            total_staked: Decimal::ZERO,
            yes_staked: Decimal::ZERO,
            no_staked: Decimal::ZERO,
            participant_count: 0,
            metadata: market.metadata,
            created_at: now,
            updated_at: now,
        };
        tables.markets.insert(id, market.clone());
        debug!("Created market {} '{}'", id, market.title);
        Ok(market)
    }

    async fn get_market(&self, id: i64) -> StoreResult<Option<Market>> {
        Ok(self.tables.read().await.markets.get(&id).cloned())
    }

    async fn list_markets(&self, filter: MarketFilter) -> StoreResult<Vec<Market>> {
        let tables = self.tables.read().await;
        let mut markets: Vec<Market> = tables
            .markets
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        markets.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(markets
            .into_iter()
            .skip(filter.offset.unwrap_or(0))
            .take(filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
            .collect())
    }

    async fn get_user_markets(&self, user_id: i64) -> StoreResult<Vec<Market>> {
        let tables = self.tables.read().await;
        Ok(tables
            .markets
            .values()
            .filter(|m| m.creator_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_active_markets(&self) -> StoreResult<Vec<Market>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        Ok(tables
            .markets
            .values()
            .filter(|m| m.is_accepting_bets(now))
            .cloned()
            .collect())
    }

    async fn update_market(&self, id: i64, patch: MarketPatch) -> StoreResult<Option<Market>> {
        let mut tables = self.tables.write().await;
        Ok(tables.markets.get_mut(&id).map(|market| {
            patch.apply(market);
            market.updated_at = Utc::now();
            market.clone()
        }))
    }

    async fn resolve_market(&self, id: i64, result: MarketResult) -> StoreResult<Market> {
        let mut tables = self.tables.write().await;
        let market = tables
            .markets
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Market"))?;

        if !market.settle(result, Utc::now()) {
            return Err(StoreError::AlreadySettled(market.status));
        }
        debug!("Market {} settled as {}", id, result);
        Ok(market.clone())
    }

    async fn place_bet(&self, bet: NewBet) -> StoreResult<Bet> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&bet.user_id) {
            return Err(StoreError::NotFound("User"));
        }
        let market = tables
            .markets
            .get_mut(&bet.market_id)
            .ok_or(StoreError::NotFound("Market"))?;
        if !market.is_accepting_bets(now) {
            return Err(StoreError::MarketClosed);
        }
        if !market.record_stake(bet.position, bet.amount) {
            return Err(stake_overflow());
        }
        market.updated_at = now;

        let id = tables.next_bet_id;
        tables.next_bet_id += 1;
        let placed = Bet {
            id,
            market_id: bet.market_id,
            user_id: bet.user_id,
            position: bet.position,
            amount: bet.amount,
            tx_hash: bet.tx_hash,
            block_number: bet.block_number,
            claimed: false,
            payout: Decimal::ZERO,
            created_at: now,
        };
        tables.bets.insert(id, placed.clone());
        Ok(placed)
    }

    async fn get_market_bets(&self, market_id: i64) -> StoreResult<Vec<Bet>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bets
            .values()
            .filter(|b| b.market_id == market_id)
            .cloned()
            .collect())
    }

    async fn get_user_bets(&self, user_id: i64, market_id: Option<i64>) -> StoreResult<Vec<Bet>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bets
            .values()
            .filter(|b| b.user_id == user_id && market_id.map_or(true, |m| b.market_id == m))
            .cloned()
            .collect())
    }

    async fn update_bet(&self, id: i64, patch: BetPatch) -> StoreResult<Option<Bet>> {
        let mut tables = self.tables.write().await;
        Ok(tables.bets.get_mut(&id).map(|bet| {
            patch.apply(bet);
            bet.clone()
        }))
    }
}
