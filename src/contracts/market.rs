//! Market factory and per-market bindings

use super::abi::{IPredictionMarket, IPredictionMarketFactory};
use super::{
    from_wei, require_present, to_u64, to_wei, Binding, ContractError, ContractResult,
    ContractTransport, TxHandle,
};
use crate::types::{MarketResult, Position};
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub trait MarketFactory {
    fn create_market(
        &self,
        title: &str,
        description: &str,
        category: &str,
        end_time: DateTime<Utc>,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn all_markets(&self) -> impl Future<Output = ContractResult<Vec<Address>>> + Send;
    fn market_count(&self) -> impl Future<Output = ContractResult<u64>> + Send;
}

pub trait MarketContract {
    /// Stake `amount` ETH on one side
    fn place_bet(
        &self,
        position: Position,
        amount: Decimal,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn resolve_market(
        &self,
        result: MarketResult,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn claim_winnings(&self) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn claim_refund(&self) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn is_betting_active(&self) -> impl Future<Output = ContractResult<bool>> + Send;
    fn time_until_betting_ends(&self) -> impl Future<Output = ContractResult<Duration>> + Send;
    fn snapshot(&self) -> impl Future<Output = ContractResult<MarketSnapshot>> + Send;
}

/// Status code stored by a market contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMarketStatus {
    Active,
    Closed,
    ResolvedYes,
    ResolvedNo,
    Cancelled,
    Unknown(u8),
}

impl From<u8> for ChainMarketStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => ChainMarketStatus::Active,
            1 => ChainMarketStatus::Closed,
            2 => ChainMarketStatus::ResolvedYes,
            3 => ChainMarketStatus::ResolvedNo,
            4 => ChainMarketStatus::Cancelled,
            other => ChainMarketStatus::Unknown(other),
        }
    }
}

/// Outcome code passed to `resolveMarket`
fn outcome_code(result: MarketResult) -> u8 {
    match result {
        MarketResult::Yes => 1,
        MarketResult::No => 2,
        MarketResult::Cancelled => 3,
    }
}

/// Mirrored state of one market contract
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub address: Address,
    pub title: String,
    pub description: String,
    pub category: String,
    pub end_time: DateTime<Utc>,
    pub status: ChainMarketStatus,
    pub total_amount: Decimal,
    pub yes_amount: Decimal,
    pub no_amount: Decimal,
}

fn timestamp(seconds: U256) -> ContractResult<DateTime<Utc>> {
    let secs = i64::try_from(to_u64(seconds)).unwrap_or(i64::MAX);
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ContractError::Decode(format!("invalid timestamp {}", seconds)))
}

pub struct FactoryContract<T> {
    binding: Binding<T>,
}

impl<T: ContractTransport> FactoryContract<T> {
    pub fn new(transport: Arc<T>, address: Option<Address>) -> ContractResult<Self> {
        Ok(Self {
            binding: Binding::configured(transport, address, "PredictionMarketFactory")?,
        })
    }

    pub fn address(&self) -> Address {
        self.binding.address()
    }
}

impl<T: ContractTransport> MarketFactory for FactoryContract<T> {
    async fn create_market(
        &self,
        title: &str,
        description: &str,
        category: &str,
        end_time: DateTime<Utc>,
    ) -> ContractResult<TxHandle> {
        require_present("Title", title)?;
        require_present("Description", description)?;
        require_present("Category", category)?;
        if end_time.timestamp() <= 0 {
            return Err(ContractError::invalid("End time is required"));
        }

        let call = IPredictionMarketFactory::createMarketCall {
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            endTime: U256::from(end_time.timestamp() as u64),
        };
        self.binding.write(call, U256::ZERO).await
    }

    async fn all_markets(&self) -> ContractResult<Vec<Address>> {
        self.binding
            .read(IPredictionMarketFactory::getAllMarketsCall {})
            .await
    }

    async fn market_count(&self) -> ContractResult<u64> {
        let count = self
            .binding
            .read(IPredictionMarketFactory::getMarketCountCall {})
            .await?;
        Ok(to_u64(count))
    }
}

pub struct PredictionMarketContract<T> {
    binding: Binding<T>,
}

impl<T: ContractTransport> PredictionMarketContract<T> {
    pub fn new(transport: Arc<T>, address: Address) -> ContractResult<Self> {
        if address == Address::ZERO {
            return Err(ContractError::invalid("Market address is required"));
        }
        Ok(Self {
            binding: Binding::new(transport, address),
        })
    }

    pub fn address(&self) -> Address {
        self.binding.address()
    }
}

impl<T: ContractTransport> MarketContract for PredictionMarketContract<T> {
    async fn place_bet(&self, position: Position, amount: Decimal) -> ContractResult<TxHandle> {
        let value = to_wei(amount)?;
        let call = IPredictionMarket::placeBetCall {
            isYes: position == Position::Yes,
        };
        self.binding.write(call, value).await
    }

    async fn resolve_market(&self, result: MarketResult) -> ContractResult<TxHandle> {
        let call = IPredictionMarket::resolveMarketCall {
            outcome: outcome_code(result),
        };
        self.binding.write(call, U256::ZERO).await
    }

    async fn claim_winnings(&self) -> ContractResult<TxHandle> {
        self.binding
            .write(IPredictionMarket::claimWinningsCall {}, U256::ZERO)
            .await
    }

    async fn claim_refund(&self) -> ContractResult<TxHandle> {
        self.binding
            .write(IPredictionMarket::claimRefundCall {}, U256::ZERO)
            .await
    }

    async fn is_betting_active(&self) -> ContractResult<bool> {
        self.binding
            .read(IPredictionMarket::isBettingActiveCall {})
            .await
    }

    async fn time_until_betting_ends(&self) -> ContractResult<Duration> {
        let seconds = self
            .binding
            .read(IPredictionMarket::getTimeUntilBettingEndsCall {})
            .await?;
        Ok(Duration::from_secs(to_u64(seconds)))
    }

    async fn snapshot(&self) -> ContractResult<MarketSnapshot> {
        let b = &self.binding;
        let (title, description, category, end_time, status, total, yes, no) = futures::try_join!(
            b.read(IPredictionMarket::titleCall {}),
            b.read(IPredictionMarket::descriptionCall {}),
            b.read(IPredictionMarket::categoryCall {}),
            b.read(IPredictionMarket::endTimeCall {}),
            b.read(IPredictionMarket::statusCall {}),
            b.read(IPredictionMarket::totalAmountCall {}),
            b.read(IPredictionMarket::totalYesAmountCall {}),
            b.read(IPredictionMarket::totalNoAmountCall {}),
        )?;

        Ok(MarketSnapshot {
            address: b.address(),
            title,
            description,
            category,
            end_time: timestamp(end_time)?,
            status: ChainMarketStatus::from(status),
            total_amount: from_wei(total)?,
            yes_amount: from_wei(yes)?,
            no_amount: from_wei(no)?,
        })
    }
}
