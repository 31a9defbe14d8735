//! Derived display values for market and proposal cards

use crate::types::{Market, MarketResult, MarketStatus};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const HOUR_MS: i64 = 60 * 60 * 1000;

/// Whole days until `end`, rounded up. Zero or negative once ended.
pub fn days_left(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (end - now).num_milliseconds();
    if ms > 0 {
        (ms + DAY_MS - 1) / DAY_MS
    } else {
        ms / DAY_MS
    }
}

/// "Nd left" or "Ended"
pub fn days_left_label(end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = days_left(end, now);
    if days > 0 {
        format!("{}d left", days)
    } else {
        "Ended".to_string()
    }
}

/// Proposal countdown: days while at least one remains, then hours
pub fn time_remaining(end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (end - now).num_milliseconds();
    if diff <= 0 {
        return "Ended".to_string();
    }

    let days = diff / DAY_MS;
    let hours = (diff % DAY_MS) / HOUR_MS;
    if days > 0 {
        format!("{} day{} left", days, plural(days))
    } else {
        format!("{} hour{} left", hours, plural(hours))
    }
}

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Percentage pair that always sums to 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub first: u32,
    pub second: u32,
}

impl Split {
    pub const EVEN: Split = Split { first: 50, second: 50 };

    fn from_ratio(part: f64, total: f64) -> Self {
        if total <= 0.0 {
            return Self::EVEN;
        }
        let first = ((part * 100.0) / total).round().clamp(0.0, 100.0) as u32;
        Split {
            first,
            second: 100 - first,
        }
    }
}

/// YES/NO share of the staked pool. An empty pool shows 50/50.
pub fn stake_split(yes: Decimal, no: Decimal) -> Split {
    let total = yes + no;
    if total <= Decimal::ZERO {
        return Split::EVEN;
    }
    Split::from_ratio(yes.to_f64().unwrap_or(0.0), total.to_f64().unwrap_or(0.0))
}

pub fn market_split(market: &Market) -> Split {
    stake_split(market.yes_staked, market.no_staked)
}

/// FOR/AGAINST share of cast votes. No votes shows 50/50.
pub fn vote_split(votes_for: u128, votes_against: u128) -> Split {
    Split::from_ratio(votes_for as f64, votes_for as f64 + votes_against as f64)
}

pub fn quorum_met(votes_for: u128, votes_against: u128, quorum: u128) -> bool {
    votes_for.saturating_add(votes_against) >= quorum
}

/// Badge text shown on a market card
pub fn status_badge(status: MarketStatus, result: Option<MarketResult>) -> &'static str {
    match (status, result) {
        (MarketStatus::Active, _) => "Active",
        (MarketStatus::Cancelled, _) | (_, Some(MarketResult::Cancelled)) => "Cancelled",
        (_, Some(MarketResult::Yes)) => "YES Won",
        (_, Some(MarketResult::No)) => "NO Won",
        (MarketStatus::Resolved, None) => "Resolved",
    }
}

/// ETH amount with up to four decimals and no trailing zeros
pub fn format_eth(amount: Decimal) -> String {
    format!("{} ETH", amount.round_dp(4).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_days_left_rounds_up() {
        let now = now();
        assert_eq!(days_left(now + Duration::hours(1), now), 1);
        assert_eq!(days_left(now + Duration::days(3), now), 3);
        assert_eq!(days_left(now + Duration::days(3) + Duration::minutes(1), now), 4);
        assert_eq!(days_left_label(now + Duration::days(2), now), "2d left");
        assert_eq!(days_left_label(now, now), "Ended");
        assert_eq!(days_left_label(now - Duration::days(5), now), "Ended");
    }

    #[test]
    fn test_time_remaining() {
        let now = now();
        assert_eq!(time_remaining(now + Duration::days(2) + Duration::hours(5), now), "2 days left");
        assert_eq!(time_remaining(now + Duration::days(1) + Duration::hours(5), now), "1 day left");
        assert_eq!(time_remaining(now + Duration::hours(5), now), "5 hours left");
        assert_eq!(time_remaining(now + Duration::minutes(90), now), "1 hour left");
        assert_eq!(time_remaining(now - Duration::hours(1), now), "Ended");
    }

    #[test]
    fn test_stake_split() {
        assert_eq!(stake_split(dec!(1), dec!(3)), Split { first: 25, second: 75 });
        assert_eq!(stake_split(dec!(2), dec!(1)), Split { first: 67, second: 33 });
        assert_eq!(stake_split(Decimal::ZERO, Decimal::ZERO), Split::EVEN);
        assert_eq!(stake_split(dec!(5), Decimal::ZERO), Split { first: 100, second: 0 });
    }

    #[test]
    fn test_vote_split_and_quorum() {
        assert_eq!(vote_split(300, 100), Split { first: 75, second: 25 });
        assert_eq!(vote_split(0, 0), Split::EVEN);
        assert!(quorum_met(60, 40, 100));
        assert!(!quorum_met(60, 39, 100));
    }

    #[test]
    fn test_status_badge() {
        assert_eq!(status_badge(MarketStatus::Active, None), "Active");
        assert_eq!(status_badge(MarketStatus::Resolved, Some(MarketResult::Yes)), "YES Won");
        assert_eq!(status_badge(MarketStatus::Resolved, Some(MarketResult::No)), "NO Won");
        assert_eq!(status_badge(MarketStatus::Cancelled, Some(MarketResult::Cancelled)), "Cancelled");
        assert_eq!(status_badge(MarketStatus::Resolved, None), "Resolved");
    }

    #[test]
    fn test_format_eth() {
        assert_eq!(format_eth(dec!(1.50000)), "1.5 ETH");
        assert_eq!(format_eth(dec!(0.123456)), "0.1235 ETH");
        assert_eq!(format_eth(Decimal::ZERO), "0 ETH");
    }
}
