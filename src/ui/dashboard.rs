//! Dashboard aggregates and market cards

use super::display::{days_left_label, format_eth, market_split, status_badge, Split};
use super::forms::category_label;
use crate::types::{Market, MarketStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Header tiles over a market list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_markets: usize,
    pub total_volume: Decimal,
    pub active_markets: usize,
    pub participants: i64,
}

impl DashboardStats {
    pub fn from_markets(markets: &[Market]) -> Self {
        Self {
            total_markets: markets.len(),
            total_volume: markets.iter().map(|m| m.total_staked).sum(),
            active_markets: markets
                .iter()
                .filter(|m| m.status == MarketStatus::Active)
                .count(),
            participants: markets.iter().map(|m| m.participant_count).sum(),
        }
    }

    pub fn volume_label(&self) -> String {
        format_eth(self.total_volume)
    }
}

/// Highest-volume markets, largest first
pub fn featured_markets(markets: &[Market], count: usize) -> Vec<&Market> {
    let mut sorted: Vec<&Market> = markets.iter().collect();
    sorted.sort_by(|a, b| b.total_staked.cmp(&a.total_staked));
    sorted.truncate(count);
    sorted
}

/// Everything a market card shows
#[derive(Debug, Clone, PartialEq)]
pub struct MarketCardView {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub badge: &'static str,
    pub split: Split,
    pub volume: String,
    pub participants: i64,
    pub time_left: String,
    pub accepting_bets: bool,
}

impl MarketCardView {
    pub fn new(market: &Market, now: DateTime<Utc>) -> Self {
        let category = category_label(&market.category)
            .map(str::to_string)
            .unwrap_or_else(|| market.category.clone());

        Self {
            id: market.id,
            title: market.title.clone(),
            category,
            badge: status_badge(market.status, market.result),
            split: market_split(market),
            volume: format_eth(market.total_staked),
            participants: market.participant_count,
            time_left: days_left_label(market.end_date, now),
            accepting_bets: market.is_accepting_bets(now),
        }
    }
}
