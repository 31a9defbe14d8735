//! NFT reward and user profile bindings

use super::abi::{INFTReward, IUserProfile};
use super::{
    from_wei, require_present, to_u64, Binding, ContractError, ContractResult, ContractTransport,
    TxHandle,
};
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;

pub trait NftRewards {
    fn award_milestone(
        &self,
        user: Address,
        milestone: u8,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn check_and_award_milestones(
        &self,
        user: Address,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn total_supply(&self) -> impl Future<Output = ContractResult<u64>> + Send;
    /// Milestone ids earned by `user`
    fn user_milestones(&self, user: Address) -> impl Future<Output = ContractResult<Vec<u8>>> + Send;
}

pub trait UserProfileContract {
    fn create_profile(
        &self,
        username: &str,
        bio: &str,
        avatar_uri: &str,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn update_profile(
        &self,
        username: &str,
        bio: &str,
        avatar_uri: &str,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    /// `None` when the address never created a profile
    fn profile(&self, user: Address)
        -> impl Future<Output = ContractResult<Option<OnchainProfile>>> + Send;
    fn user_stats(&self, user: Address) -> impl Future<Output = ContractResult<OnchainUserStats>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnchainProfile {
    pub username: String,
    pub bio: String,
    pub avatar_uri: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnchainUserStats {
    pub total_predictions: u64,
    pub correct_predictions: u64,
    pub total_earnings: Decimal,
    pub reputation: u64,
    pub level: u64,
}

impl OnchainUserStats {
    /// Share of correct predictions, 0-100
    pub fn accuracy(&self) -> u64 {
        if self.total_predictions == 0 {
            return 0;
        }
        self.correct_predictions * 100 / self.total_predictions
    }
}

fn require_wallet(user: Address) -> ContractResult<()> {
    if user == Address::ZERO {
        return Err(ContractError::WalletNotConnected);
    }
    Ok(())
}

pub struct NftRewardContract<T> {
    binding: Binding<T>,
}

impl<T: ContractTransport> NftRewardContract<T> {
    pub fn new(transport: Arc<T>, address: Option<Address>) -> ContractResult<Self> {
        Ok(Self {
            binding: Binding::configured(transport, address, "NFTReward")?,
        })
    }
}

impl<T: ContractTransport> NftRewards for NftRewardContract<T> {
    async fn award_milestone(&self, user: Address, milestone: u8) -> ContractResult<TxHandle> {
        require_wallet(user)?;
        self.binding
            .write(INFTReward::awardMilestoneCall { user, milestone }, U256::ZERO)
            .await
    }

    async fn check_and_award_milestones(&self, user: Address) -> ContractResult<TxHandle> {
        require_wallet(user)?;
        self.binding
            .write(INFTReward::checkAndAwardMilestonesCall { user }, U256::ZERO)
            .await
    }

    async fn total_supply(&self) -> ContractResult<u64> {
        let supply = self.binding.read(INFTReward::totalSupplyCall {}).await?;
        Ok(to_u64(supply))
    }

    async fn user_milestones(&self, user: Address) -> ContractResult<Vec<u8>> {
        require_wallet(user)?;
        self.binding
            .read(INFTReward::getUserMilestonesCall { user })
            .await
    }
}

pub struct ProfileContract<T> {
    binding: Binding<T>,
}

impl<T: ContractTransport> ProfileContract<T> {
    pub fn new(transport: Arc<T>, address: Option<Address>) -> ContractResult<Self> {
        Ok(Self {
            binding: Binding::configured(transport, address, "UserProfile")?,
        })
    }
}

impl<T: ContractTransport> UserProfileContract for ProfileContract<T> {
    async fn create_profile(
        &self,
        username: &str,
        bio: &str,
        avatar_uri: &str,
    ) -> ContractResult<TxHandle> {
        require_present("Username", username)?;
        let call = IUserProfile::createProfileCall {
            username: username.to_string(),
            bio: bio.to_string(),
            avatarUri: avatar_uri.to_string(),
        };
        self.binding.write(call, U256::ZERO).await
    }

    async fn update_profile(
        &self,
        username: &str,
        bio: &str,
        avatar_uri: &str,
    ) -> ContractResult<TxHandle> {
        require_present("Username", username)?;
        let call = IUserProfile::updateProfileCall {
            username: username.to_string(),
            bio: bio.to_string(),
            avatarUri: avatar_uri.to_string(),
        };
        self.binding.write(call, U256::ZERO).await
    }

    async fn profile(&self, user: Address) -> ContractResult<Option<OnchainProfile>> {
        require_wallet(user)?;
        let raw = self
            .binding
            .read(IUserProfile::getProfileCall { user })
            .await?;
        if !raw.exists {
            return Ok(None);
        }
        let created_secs = i64::try_from(to_u64(raw.createdAt)).unwrap_or(i64::MAX);
        Ok(Some(OnchainProfile {
            username: raw.username,
            bio: raw.bio,
            avatar_uri: raw.avatarUri,
            created_at: DateTime::from_timestamp(created_secs, 0).filter(|_| created_secs > 0),
        }))
    }

    async fn user_stats(&self, user: Address) -> ContractResult<OnchainUserStats> {
        require_wallet(user)?;
        let raw = self
            .binding
            .read(IUserProfile::getUserStatsCall { user })
            .await?;
        Ok(OnchainUserStats {
            total_predictions: to_u64(raw.totalPredictions),
            correct_predictions: to_u64(raw.correctPredictions),
            total_earnings: from_wei(raw.totalEarnings)?,
            reputation: to_u64(raw.reputation),
            level: to_u64(raw.level),
        })
    }
}
