//! SQLite-backed relational store

use super::{
    lookup_address, stake_overflow, MarketRepository, StoreResult, UserDraft, DEFAULT_PAGE_LIMIT,
};
use crate::error::StoreError;
use crate::types::{
    Bet, BetPatch, Market, MarketFilter, MarketPatch, MarketResult, MarketStatus, NewBet,
    NewMarket, NewUser, User,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// How long a connection waits on another writer before reporting busy
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Persistent store with the same semantics as [`super::MemStorage`].
///
/// Decimal amounts are stored as TEXT and timestamps as RFC 3339 TEXT.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`, e.g. `sqlite:predictchain.db`
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.initialize().await?;
        info!("SQLite market store ready at {}", path);
        Ok(store)
    }

    /// Private in-memory database; a single connection keeps it alive
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE,
                password_hash TEXT,
                wallet_address TEXT UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS markets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                creator_id INTEGER NOT NULL REFERENCES users(id),
                contract_address TEXT,
                end_date TEXT NOT NULL,
                resolution_date TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                result TEXT,
                total_staked TEXT NOT NULL DEFAULT '0',
                yes_staked TEXT NOT NULL DEFAULT '0',
                no_staked TEXT NOT NULL DEFAULT '0',
                participant_count INTEGER NOT NULL DEFAULT 0,
                metadata TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                market_id INTEGER NOT NULL REFERENCES markets(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                position TEXT NOT NULL,
                amount TEXT NOT NULL,
                tx_hash TEXT,
                block_number INTEGER,
                claimed INTEGER NOT NULL DEFAULT 0,
                payout TEXT NOT NULL DEFAULT '0',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bets_market ON bets(market_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bets_user ON bets(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_markets_category ON markets(category)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Start a transaction that takes the write lock up front, so a
    /// read-then-write sequence never fails on lock upgrade
    async fn begin_write(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn fetch_market(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> StoreResult<Option<Market>> {
        let row = sqlx::query("SELECT * FROM markets WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.as_ref().map(row_to_market).transpose()?)
    }

    async fn write_market(tx: &mut Transaction<'_, Sqlite>, market: &Market) -> StoreResult<()> {
        let metadata = market
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(anyhow::Error::from)?;

        sqlx::query(
            r#"
            UPDATE markets SET
                title = ?, description = ?, category = ?, contract_address = ?,
                end_date = ?, resolution_date = ?, status = ?, result = ?,
                total_staked = ?, yes_staked = ?, no_staked = ?, participant_count = ?,
                metadata = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&market.title)
        .bind(&market.description)
        .bind(&market.category)
        .bind(&market.contract_address)
        .bind(market.end_date.to_rfc3339())
        .bind(market.resolution_date.map(|d| d.to_rfc3339()))
        .bind(market.status.as_str())
        .bind(market.result.map(|r| r.as_str()))
        .bind(market.total_staked.to_string())
        .bind(market.yes_staked.to_string())
        .bind(market.no_staked.to_string())
        .bind(market.participant_count)
        .bind(metadata)
        .bind(market.updated_at.to_rfc3339())
        .bind(market.id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn wallet_taken(&self, wallet: &str, except: i64) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE wallet_address = ? AND id != ?",
        )
        .bind(wallet)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn user_exists(&self, id: i64) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.get("created_at");
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        wallet_address: row.get("wallet_address"),
        created_at: parse_time(&created_at)?,
    })
}

fn row_to_market(row: &SqliteRow) -> Result<Market> {
    let status: String = row.get("status");
    let result: Option<String> = row.get("result");
    let end_date: String = row.get("end_date");
    let resolution_date: Option<String> = row.get("resolution_date");
    let total_staked: String = row.get("total_staked");
    let yes_staked: String = row.get("yes_staked");
    let no_staked: String = row.get("no_staked");
    let metadata: Option<String> = row.get("metadata");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Market {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        creator_id: row.get("creator_id"),
        contract_address: row.get("contract_address"),
        end_date: parse_time(&end_date)?,
        resolution_date: resolution_date.as_deref().map(parse_time).transpose()?,
        status: MarketStatus::from_str(&status).map_err(anyhow::Error::msg)?,
        result: result
            .as_deref()
            .map(MarketResult::from_str)
            .transpose()
            .map_err(anyhow::Error::msg)?,
        total_staked: Decimal::from_str(&total_staked)?,
        yes_staked: Decimal::from_str(&yes_staked)?,
        no_staked: Decimal::from_str(&no_staked)?,
        participant_count: row.get("participant_count"),
        metadata: metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("Invalid market metadata")?,
        created_at: parse_time(&created_at)?,
        updated_at: parse_time(&updated_at)?,
    })
}

fn row_to_bet(row: &SqliteRow) -> Result<Bet> {
    let position: String = row.get("position");
    let amount: String = row.get("amount");
    let payout: String = row.get("payout");
    let created_at: String = row.get("created_at");

    Ok(Bet {
        id: row.get("id"),
        market_id: row.get("market_id"),
        user_id: row.get("user_id"),
        position: position.parse().map_err(anyhow::Error::msg)?,
        amount: Decimal::from_str(&amount)?,
        tx_hash: row.get("tx_hash"),
        block_number: row.get("block_number"),
        claimed: row.get("claimed"),
        payout: Decimal::from_str(&payout)?,
        created_at: parse_time(&created_at)?,
    })
}

fn collect<T>(rows: &[SqliteRow], map: fn(&SqliteRow) -> Result<T>) -> StoreResult<Vec<T>> {
    Ok(rows.iter().map(map).collect::<Result<Vec<_>>>()?)
}

impl MarketRepository for SqliteStorage {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, row_to_user)
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn get_user_by_wallet(&self, address: &str) -> StoreResult<Option<User>> {
        let Some(address) = lookup_address(address) else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT * FROM users WHERE wallet_address = ?")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let draft = UserDraft::prepare(user)?;

        if let Some(wallet) = &draft.wallet_address {
            if self.wallet_taken(wallet, 0).await? {
                return Err(StoreError::Duplicate {
                    field: "walletAddress",
                });
            }
        }
        if let Some(username) = &draft.username {
            if self.get_user_by_username(username).await?.is_some() {
                return Err(StoreError::Duplicate { field: "username" });
            }
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, wallet_address, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&draft.username)
        .bind(&draft.password_hash)
        .bind(&draft.wallet_address)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created user {}", id);
        Ok(User {
            id,
            username: draft.username,
            password_hash: draft.password_hash,
            wallet_address: draft.wallet_address,
            created_at,
        })
    }

    async fn update_user_wallet(&self, id: i64, address: &str) -> StoreResult<Option<User>> {
        let wallet = lookup_address(address)
            .ok_or_else(|| StoreError::Invalid("Invalid wallet address".to_string()))?;

        if !self.user_exists(id).await? {
            return Ok(None);
        }
        if self.wallet_taken(&wallet, id).await? {
            return Err(StoreError::Duplicate {
                field: "walletAddress",
            });
        }

        sqlx::query("UPDATE users SET wallet_address = ? WHERE id = ?")
            .bind(&wallet)
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.get_user(id).await
    }

    async fn create_market(&self, market: NewMarket) -> StoreResult<Market> {
        if !self.user_exists(market.creator_id).await? {
            return Err(StoreError::NotFound("User"));
        }

        let now = Utc::now();
        let metadata = market
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(anyhow::Error::from)?;

        let result = sqlx::query(
            r#"
            INSERT INTO markets (
                title, description, category, creator_id, contract_address, end_date,
                status, metadata, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 'active', ?, ?, ?)
            "#,
        )
        .bind(&market.title)
        .bind(&market.description)
        .bind(&market.category)
        .bind(market.creator_id)
        .bind(&market.contract_address)
        .bind(market.end_date.to_rfc3339())
        .bind(metadata)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created market {} '{}'", id, market.title);
        self.get_market(id)
            .await?
            .ok_or(StoreError::NotFound("Market"))
    }

    async fn get_market(&self, id: i64) -> StoreResult<Option<Market>> {
        let row = sqlx::query("SELECT * FROM markets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_market).transpose()?)
    }

    async fn list_markets(&self, filter: MarketFilter) -> StoreResult<Vec<Market>> {
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;

        let rows = sqlx::query(
            r#"
            SELECT * FROM markets
            WHERE (?1 IS NULL OR category = ?1) AND (?2 IS NULL OR status = ?2)
            ORDER BY id DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(&filter.category)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        collect(&rows, row_to_market)
    }

    async fn get_user_markets(&self, user_id: i64) -> StoreResult<Vec<Market>> {
        let rows = sqlx::query("SELECT * FROM markets WHERE creator_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, row_to_market)
    }

    async fn get_active_markets(&self) -> StoreResult<Vec<Market>> {
        let rows = sqlx::query("SELECT * FROM markets WHERE status = 'active' ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let now = Utc::now();
        Ok(collect(&rows, row_to_market)?
            .into_iter()
            .filter(|m| m.is_accepting_bets(now))
            .collect())
    }

    async fn update_market(&self, id: i64, patch: MarketPatch) -> StoreResult<Option<Market>> {
        let mut tx = self.begin_write().await?;
        let Some(mut market) = Self::fetch_market(&mut tx, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut market);
        market.updated_at = Utc::now();
        Self::write_market(&mut tx, &market).await?;
        tx.commit().await?;
        Ok(Some(market))
    }

    async fn resolve_market(&self, id: i64, result: MarketResult) -> StoreResult<Market> {
        let mut tx = self.begin_write().await?;
        let mut market = Self::fetch_market(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound("Market"))?;

        if !market.settle(result, Utc::now()) {
            return Err(StoreError::AlreadySettled(market.status));
        }
        Self::write_market(&mut tx, &market).await?;
        tx.commit().await?;
        debug!("Market {} settled as {}", id, result);
        Ok(market)
    }

    async fn place_bet(&self, bet: NewBet) -> StoreResult<Bet> {
        if !self.user_exists(bet.user_id).await? {
            return Err(StoreError::NotFound("User"));
        }

        let now = Utc::now();
        let mut tx = self.begin_write().await?;
        let mut market = Self::fetch_market(&mut tx, bet.market_id)
            .await?
            .ok_or(StoreError::NotFound("Market"))?;
        if !market.is_accepting_bets(now) {
            return Err(StoreError::MarketClosed);
        }
        if !market.record_stake(bet.position, bet.amount) {
            return Err(stake_overflow());
        }
        market.updated_at = now;

        let result = sqlx::query(
            r#"
            INSERT INTO bets (market_id, user_id, position, amount, tx_hash, block_number, claimed, payout, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, '0', ?)
            "#,
        )
        .bind(bet.market_id)
        .bind(bet.user_id)
        .bind(bet.position.as_str())
        .bind(bet.amount.to_string())
        .bind(&bet.tx_hash)
        .bind(bet.block_number)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;
        Self::write_market(&mut tx, &market).await?;
        tx.commit().await?;

        Ok(Bet {
            id: result.last_insert_rowid(),
            market_id: bet.market_id,
            user_id: bet.user_id,
            position: bet.position,
            amount: bet.amount,
            tx_hash: bet.tx_hash,
            block_number: bet.block_number,
            claimed: false,
            payout: Decimal::ZERO,
            created_at: now,
        })
    }

    async fn get_market_bets(&self, market_id: i64) -> StoreResult<Vec<Bet>> {
        let rows = sqlx::query("SELECT * FROM bets WHERE market_id = ? ORDER BY id")
            .bind(market_id)
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, row_to_bet)
    }

    async fn get_user_bets(&self, user_id: i64, market_id: Option<i64>) -> StoreResult<Vec<Bet>> {
        let rows = sqlx::query(
            "SELECT * FROM bets WHERE user_id = ?1 AND (?2 IS NULL OR market_id = ?2) ORDER BY id",
        )
        .bind(user_id)
        .bind(market_id)
        .fetch_all(&self.pool)
        .await?;
        collect(&rows, row_to_bet)
    }

    async fn update_bet(&self, id: i64, patch: BetPatch) -> StoreResult<Option<Bet>> {
        let mut tx = self.begin_write().await?;
        let row = sqlx::query("SELECT * FROM bets WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(mut bet) = row.as_ref().map(row_to_bet).transpose()? else {
            return Ok(None);
        };

        patch.apply(&mut bet);
        sqlx::query("UPDATE bets SET claimed = ?, tx_hash = ?, block_number = ? WHERE id = ?")
            .bind(bet.claimed)
            .bind(&bet.tx_hash)
            .bind(bet.block_number)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(bet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support;
    use crate::types::Position;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn store() -> SqliteStorage {
        SqliteStorage::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_market_lifecycle() {
        test_support::market_lifecycle(&store().await).await;
    }

    #[tokio::test]
    async fn test_rejects_bets_after_end_date() {
        test_support::rejects_bets_after_end_date(&store().await).await;
    }

    #[tokio::test]
    async fn test_missing_references() {
        test_support::missing_references(&store().await).await;
    }

    #[tokio::test]
    async fn test_listing_and_filters() {
        test_support::listing_and_filters(&store().await).await;
    }

    #[tokio::test]
    async fn test_users_and_wallets() {
        test_support::users_and_wallets(&store().await).await;
    }

    #[tokio::test]
    async fn test_user_bets_and_updates() {
        test_support::user_bets_and_updates(&store().await).await;
    }

    #[tokio::test]
    async fn test_rejects_overflowing_stakes() {
        test_support::rejects_overflowing_stakes(&store().await).await;
    }

    #[tokio::test]
    async fn test_metadata_round_trips_through_text_column() {
        let store = store().await;
        let user = store
            .create_user(NewUser {
                wallet_address: Some(test_support::WALLET.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut draft = test_support::new_market(user.id, "Metadata market", "other");
        draft.metadata = Some(serde_json::json!({ "source": "oracle", "tags": ["a", "b"] }));
        let market = store.create_market(draft).await.unwrap();

        let loaded = store.get_market(market.id).await.unwrap().unwrap();
        assert_eq!(loaded.metadata.unwrap()["source"], "oracle");
    }

    #[tokio::test]
    async fn test_concurrent_bets_on_file_database() {
        let path = std::env::temp_dir().join(format!(
            "predictchain-bets-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = Arc::new(
            SqliteStorage::new(&format!("sqlite://{}", path.display()))
                .await
                .unwrap(),
        );
        let user = store
            .create_user(NewUser {
                wallet_address: Some(test_support::WALLET.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let market = store
            .create_market(test_support::new_market(user.id, "Crowded market", "economy"))
            .await
            .unwrap();
        let (market_id, user_id) = (market.id, user.id);

        let mut handles = Vec::new();
        for i in 0..40 {
            let store = store.clone();
            let position = if i % 2 == 0 { Position::Yes } else { Position::No };
            handles.push(tokio::spawn(async move {
                store
                    .place_bet(test_support::new_bet(market_id, user_id, position, dec!(1)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let market = store.get_market(market_id).await.unwrap().unwrap();
        assert_eq!(market.total_staked, dec!(40));
        assert_eq!(market.yes_staked, dec!(20));
        assert_eq!(market.participant_count, 40);
        assert_eq!(store.get_market_bets(market_id).await.unwrap().len(), 40);

        drop(store);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
