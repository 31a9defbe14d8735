//! Core entities shared by the registry, the client and the presentation layer

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A registered user, keyed by wallet address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    /// Argon2id hash of the legacy password, never serialized
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A binary-outcome prediction market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub creator_id: i64,
    pub contract_address: Option<String>,
    pub end_date: DateTime<Utc>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub status: MarketStatus,
    pub result: Option<MarketResult>,
    pub total_staked: Decimal,
    pub yes_staked: Decimal,
    pub no_staked: Decimal,
    pub participant_count: i64,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    /// Whether the market still accepts bets at `now`
    pub fn is_accepting_bets(&self, now: DateTime<Utc>) -> bool {
        self.status == MarketStatus::Active && self.end_date > now
    }

    /// Apply a new stake to the aggregate fields. Returns false and leaves
    /// the market untouched if any total would overflow.
    pub fn record_stake(&mut self, position: Position, amount: Decimal) -> bool {
        let side = match position {
            Position::Yes => self.yes_staked,
            Position::No => self.no_staked,
        };
        let (Some(total), Some(side)) = (
            self.total_staked.checked_add(amount),
            side.checked_add(amount),
        ) else {
            return false;
        };

        self.total_staked = total;
        match position {
            Position::Yes => self.yes_staked = side,
            Position::No => self.no_staked = side,
        }
        self.participant_count += 1;
        true
    }

    /// Finalize the outcome. Only an active market can be settled.
    pub fn settle(&mut self, result: MarketResult, now: DateTime<Utc>) -> bool {
        if self.status != MarketStatus::Active {
            return false;
        }
        self.status = result.settled_status();
        self.result = Some(result);
        self.resolution_date = Some(now);
        self.updated_at = now;
        true
    }
}

/// A user's staked position on a market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: i64,
    pub market_id: i64,
    pub user_id: i64,
    pub position: Position,
    pub amount: Decimal,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
    pub claimed: bool,
    pub payout: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Market lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Active,
    Resolved,
    Cancelled,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Active => "active",
            MarketStatus::Resolved => "resolved",
            MarketStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(MarketStatus::Active),
            "resolved" => Ok(MarketStatus::Resolved),
            "cancelled" => Ok(MarketStatus::Cancelled),
            other => Err(format!("unknown market status '{}'", other)),
        }
    }
}

/// Final outcome of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketResult {
    Yes,
    No,
    Cancelled,
}

impl MarketResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketResult::Yes => "yes",
            MarketResult::No => "no",
            MarketResult::Cancelled => "cancelled",
        }
    }

    /// Status a market moves to when settled with this result
    pub fn settled_status(&self) -> MarketStatus {
        match self {
            MarketResult::Cancelled => MarketStatus::Cancelled,
            MarketResult::Yes | MarketResult::No => MarketStatus::Resolved,
        }
    }

    /// The winning side, if any
    pub fn winning_position(&self) -> Option<Position> {
        match self {
            MarketResult::Yes => Some(Position::Yes),
            MarketResult::No => Some(Position::No),
            MarketResult::Cancelled => None,
        }
    }
}

impl fmt::Display for MarketResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(MarketResult::Yes),
            "no" => Ok(MarketResult::No),
            "cancelled" => Ok(MarketResult::Cancelled),
            other => Err(format!("unknown market result '{}'", other)),
        }
    }
}

/// Side of a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Yes,
    No,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Yes => "yes",
            Position::No => "no",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Yes => write!(f, "YES"),
            Position::No => write!(f, "NO"),
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(Position::Yes),
            "no" => Ok(Position::No),
            other => Err(format!("unknown position '{}'", other)),
        }
    }
}

/// Payload for registering a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub wallet_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Payload for creating a market
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarket {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub creator_id: i64,
    #[serde(default)]
    pub contract_address: Option<String>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Editable descriptive fields of a market
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl MarketPatch {
    pub fn apply(self, market: &mut Market) {
        if let Some(title) = self.title {
            market.title = title;
        }
        if let Some(description) = self.description {
            market.description = description;
        }
        if let Some(category) = self.category {
            market.category = category;
        }
        if let Some(address) = self.contract_address {
            market.contract_address = Some(address);
        }
        if let Some(end_date) = self.end_date {
            market.end_date = end_date;
        }
        if let Some(metadata) = self.metadata {
            market.metadata = Some(metadata);
        }
    }
}

/// Payload for placing a bet; the market comes from the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBet {
    #[serde(default)]
    pub market_id: i64,
    pub user_id: i64,
    pub position: Position,
    pub amount: Decimal,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<i64>,
}

/// Fields of a bet that may change after placement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetPatch {
    pub claimed: Option<bool>,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
}

impl BetPatch {
    pub fn apply(self, bet: &mut Bet) {
        if let Some(claimed) = self.claimed {
            bet.claimed = claimed;
        }
        if let Some(tx_hash) = self.tx_hash {
            bet.tx_hash = Some(tx_hash);
        }
        if let Some(block_number) = self.block_number {
            bet.block_number = Some(block_number);
        }
    }
}

/// Market listing filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MarketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl MarketFilter {
    pub fn matches(&self, market: &Market) -> bool {
        if let Some(category) = &self.category {
            if &market.category != category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if market.status != status {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sample_market() -> Market {
        let now = Utc::now();
        Market {
            id: 1,
            title: "Will X happen?".to_string(),
            description: "Some description".to_string(),
            category: "technology".to_string(),
            creator_id: 1,
            contract_address: None,
            end_date: now + Duration::days(3),
            resolution_date: None,
            status: MarketStatus::Active,
            result: None,
            total_staked: Decimal::ZERO,
            yes_staked: Decimal::ZERO,
            no_staked: Decimal::ZERO,
            participant_count: 0,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_record_stake_keeps_totals_balanced() {
        let mut market = sample_market();
        assert!(market.record_stake(Position::Yes, dec!(1.5)));
        assert!(market.record_stake(Position::No, dec!(0.25)));
        assert!(market.record_stake(Position::Yes, dec!(3)));

        assert_eq!(market.yes_staked, dec!(4.5));
        assert_eq!(market.no_staked, dec!(0.25));
        assert_eq!(market.yes_staked + market.no_staked, market.total_staked);
        assert_eq!(market.participant_count, 3);
    }

    #[test]
    fn test_record_stake_refuses_overflow() {
        let mut market = sample_market();
        assert!(market.record_stake(Position::No, Decimal::MAX));
        let before = market.clone();

        assert!(!market.record_stake(Position::Yes, Decimal::MAX));
        assert!(!market.record_stake(Position::No, dec!(1)));
        assert_eq!(market, before);
        assert_eq!(market.participant_count, 1);
    }

    #[test]
    fn test_settle_is_one_way() {
        let mut market = sample_market();
        assert!(market.settle(MarketResult::Yes, Utc::now()));
        assert_eq!(market.status, MarketStatus::Resolved);
        assert!(market.resolution_date.is_some());

        assert!(!market.settle(MarketResult::No, Utc::now()));
        assert_eq!(market.result, Some(MarketResult::Yes));
    }

    #[test]
    fn test_cancelled_result_cancels_market() {
        let mut market = sample_market();
        market.settle(MarketResult::Cancelled, Utc::now());
        assert_eq!(market.status, MarketStatus::Cancelled);
        assert_eq!(MarketResult::Cancelled.winning_position(), None);
    }

    #[test]
    fn test_market_serializes_decimals_as_strings() {
        let json = serde_json::to_value(sample_market()).unwrap();
        assert_eq!(json["totalStaked"], "0");
        assert_eq!(json["participantCount"], 0);
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            username: Some("alice".to_string()),
            password_hash: Some("secret".to_string()),
            wallet_address: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }
}
