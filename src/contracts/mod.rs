//! Contract-binding layer
//!
//! One typed capability trait per deployed contract, implemented over any
//! [`ContractTransport`]. Bindings only check presence and positivity before
//! encoding a call; custody, payouts and quorum are enforced on-chain.

pub mod abi;
mod dao;
mod error;
mod market;
mod rewards;
mod transport;

pub use dao::{Dao, DaoContract, Proposal, ProposalStatus, ProposalType, VoteChoice};
pub use error::{ContractError, ContractResult, USER_REJECTED_CODE};
pub use market::{
    ChainMarketStatus, FactoryContract, MarketContract, MarketFactory, MarketSnapshot,
    PredictionMarketContract,
};
pub use rewards::{
    NftRewardContract, NftRewards, OnchainProfile, OnchainUserStats, ProfileContract,
    UserProfileContract,
};
pub use transport::{ContractTransport, RpcTransport, TxHandle};

use crate::config::ContractAddresses;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// Convert a positive ETH amount to wei, dropping sub-wei digits
pub fn to_wei(amount: Decimal) -> ContractResult<U256> {
    if amount <= Decimal::ZERO {
        return Err(ContractError::invalid("Amount must be greater than zero"));
    }
    let wei = amount
        .checked_mul(Decimal::from(WEI_PER_ETH))
        .and_then(|w| w.trunc().to_u128())
        .ok_or_else(|| ContractError::invalid("Amount is too large"))?;
    Ok(U256::from(wei))
}

/// Convert wei to ETH for display
pub fn from_wei(wei: U256) -> ContractResult<Decimal> {
    let raw = u128::try_from(wei).map_err(|_| ContractError::Decode("amount overflow".to_string()))?;
    let raw = i128::try_from(raw).map_err(|_| ContractError::Decode("amount overflow".to_string()))?;
    Decimal::try_from_i128_with_scale(raw, 18)
        .map(|d| d.normalize())
        .map_err(|e| ContractError::Decode(e.to_string()))
}

/// Saturating `U256` to `u64` for counters
pub(crate) fn to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// A contract address paired with the transport used to reach it
pub(crate) struct Binding<T> {
    transport: Arc<T>,
    address: Address,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            address: self.address,
        }
    }
}

impl<T: ContractTransport> Binding<T> {
    pub fn new(transport: Arc<T>, address: Address) -> Self {
        Self { transport, address }
    }

    /// Bind to a configured address; a missing entry means no deployment
    pub fn configured(
        transport: Arc<T>,
        address: Option<Address>,
        name: &'static str,
    ) -> ContractResult<Self> {
        match address {
            Some(address) if address != Address::ZERO => Ok(Self::new(transport, address)),
            _ => Err(ContractError::NotDeployed(name)),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn read<C>(&self, call: C) -> ContractResult<C::Return>
    where
        C: SolCall + Send,
        C::Return: Send,
    {
        let data = self
            .transport
            .call(self.address, Bytes::from(call.abi_encode()))
            .await?;
        Ok(C::abi_decode_returns(&data)?)
    }

    pub async fn write<C>(&self, call: C, value: U256) -> ContractResult<TxHandle>
    where
        C: SolCall + Send,
    {
        debug!("{} -> {}", C::SIGNATURE, self.address);
        self.transport
            .send(self.address, Bytes::from(call.abi_encode()), value)
            .await
    }
}

/// Every configured binding over one transport
pub struct Contracts<T> {
    transport: Arc<T>,
    addresses: ContractAddresses,
}

impl<T: ContractTransport> Contracts<T> {
    pub fn new(transport: Arc<T>, addresses: ContractAddresses) -> Self {
        Self {
            transport,
            addresses,
        }
    }

    pub fn factory(&self) -> ContractResult<FactoryContract<T>> {
        FactoryContract::new(self.transport.clone(), self.addresses.market_factory)
    }

    /// A deployed market; its address comes from the factory
    pub fn market(&self, address: Address) -> ContractResult<PredictionMarketContract<T>> {
        PredictionMarketContract::new(self.transport.clone(), address)
    }

    pub fn dao(&self) -> ContractResult<DaoContract<T>> {
        DaoContract::new(self.transport.clone(), self.addresses.dao)
    }

    pub fn nft_rewards(&self) -> ContractResult<NftRewardContract<T>> {
        NftRewardContract::new(self.transport.clone(), self.addresses.nft_reward)
    }

    pub fn user_profile(&self) -> ContractResult<ProfileContract<T>> {
        ProfileContract::new(self.transport.clone(), self.addresses.user_profile)
    }
}

/// Reject empty strings before they reach a contract
pub(crate) fn require_present(field: &str, value: &str) -> ContractResult<()> {
    if value.trim().is_empty() {
        return Err(ContractError::invalid(format!("{} is required", field)));
    }
    Ok(())
}
