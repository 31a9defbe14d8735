//! Governance bindings

use super::abi::IPredictionDAO;
use super::{require_present, to_u64, Binding, ContractError, ContractResult, ContractTransport, TxHandle};
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalType {
    PlatformUpgrade,
    ParameterChange,
    TreasuryAllocation,
    MarketApproval,
}

impl ProposalType {
    pub const ALL: [ProposalType; 4] = [
        ProposalType::PlatformUpgrade,
        ProposalType::ParameterChange,
        ProposalType::TreasuryAllocation,
        ProposalType::MarketApproval,
    ];

    pub fn code(&self) -> u8 {
        match self {
            ProposalType::PlatformUpgrade => 0,
            ProposalType::ParameterChange => 1,
            ProposalType::TreasuryAllocation => 2,
            ProposalType::MarketApproval => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalType::PlatformUpgrade => "PLATFORM_UPGRADE",
            ProposalType::ParameterChange => "PARAMETER_CHANGE",
            ProposalType::TreasuryAllocation => "TREASURY_ALLOCATION",
            ProposalType::MarketApproval => "MARKET_APPROVAL",
        }
    }

    /// Human label, e.g. "Treasury Allocation"
    pub fn label(&self) -> &'static str {
        match self {
            ProposalType::PlatformUpgrade => "Platform Upgrade",
            ProposalType::ParameterChange => "Parameter Change",
            ProposalType::TreasuryAllocation => "Treasury Allocation",
            ProposalType::MarketApproval => "Market Approval",
        }
    }
}

impl FromStr for ProposalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown proposal type '{}'", s))
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Executed,
}

impl ProposalStatus {
    fn from_code(code: u8) -> ContractResult<Self> {
        match code {
            0 => Ok(ProposalStatus::Active),
            1 => Ok(ProposalStatus::Passed),
            2 => Ok(ProposalStatus::Rejected),
            3 => Ok(ProposalStatus::Executed),
            other => Err(ContractError::Decode(format!("unknown proposal status {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Active => "active",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Executed => "executed",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ballot choice; encoded on-chain as FOR = 0, AGAINST = 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    For,
    Against,
}

impl VoteChoice {
    pub fn code(&self) -> u8 {
        match self {
            VoteChoice::For => 0,
            VoteChoice::Against => 1,
        }
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "for" | "yes" => Ok(VoteChoice::For),
            "against" | "no" => Ok(VoteChoice::Against),
            other => Err(format!("unknown vote choice '{}'", other)),
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChoice::For => f.write_str("FOR"),
            VoteChoice::Against => f.write_str("AGAINST"),
        }
    }
}

/// A governance proposal as stored by the DAO contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub title: String,
    pub description: String,
    pub kind: ProposalType,
    pub votes_for: u128,
    pub votes_against: u128,
    pub end_time: DateTime<Utc>,
    pub status: ProposalStatus,
}

fn to_u128(value: U256) -> u128 {
    u128::try_from(value).unwrap_or(u128::MAX)
}

impl TryFrom<IPredictionDAO::Proposal> for Proposal {
    type Error = ContractError;

    fn try_from(raw: IPredictionDAO::Proposal) -> ContractResult<Self> {
        let kind = ProposalType::from_code(raw.proposalType).ok_or_else(|| {
            ContractError::Decode(format!("unknown proposal type {}", raw.proposalType))
        })?;
        let end_secs = i64::try_from(to_u64(raw.endTime)).unwrap_or(i64::MAX);
        let end_time = DateTime::from_timestamp(end_secs, 0)
            .ok_or_else(|| ContractError::Decode("invalid proposal end time".to_string()))?;

        Ok(Proposal {
            id: to_u64(raw.id),
            proposer: raw.proposer,
            title: raw.title,
            description: raw.description,
            kind,
            votes_for: to_u128(raw.votesFor),
            votes_against: to_u128(raw.votesAgainst),
            end_time,
            status: ProposalStatus::from_code(raw.status)?,
        })
    }
}

pub trait Dao {
    fn create_proposal(
        &self,
        title: &str,
        description: &str,
        kind: ProposalType,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn vote(
        &self,
        proposal_id: u64,
        choice: VoteChoice,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn execute_proposal(&self, proposal_id: u64) -> impl Future<Output = ContractResult<TxHandle>> + Send;
    fn active_proposals(&self) -> impl Future<Output = ContractResult<Vec<Proposal>>> + Send;
    fn proposal_counter(&self) -> impl Future<Output = ContractResult<u64>> + Send;
    fn voting_power(&self, user: Address) -> impl Future<Output = ContractResult<u128>> + Send;
    fn quorum(&self) -> impl Future<Output = ContractResult<u128>> + Send;
}

pub struct DaoContract<T> {
    binding: Binding<T>,
}

impl<T: ContractTransport> DaoContract<T> {
    pub fn new(transport: Arc<T>, address: Option<Address>) -> ContractResult<Self> {
        Ok(Self {
            binding: Binding::configured(transport, address, "PredictionDAO")?,
        })
    }
}

impl<T: ContractTransport> Dao for DaoContract<T> {
    async fn create_proposal(
        &self,
        title: &str,
        description: &str,
        kind: ProposalType,
    ) -> ContractResult<TxHandle> {
        require_present("Title", title)?;
        require_present("Description", description)?;
        let call = IPredictionDAO::createProposalCall {
            title: title.to_string(),
            description: description.to_string(),
            proposalType: kind.code(),
        };
        self.binding.write(call, U256::ZERO).await
    }

    async fn vote(&self, proposal_id: u64, choice: VoteChoice) -> ContractResult<TxHandle> {
        let call = IPredictionDAO::voteCall {
            proposalId: U256::from(proposal_id),
            choice: choice.code(),
        };
        self.binding.write(call, U256::ZERO).await
    }

    async fn execute_proposal(&self, proposal_id: u64) -> ContractResult<TxHandle> {
        let call = IPredictionDAO::executeProposalCall {
            proposalId: U256::from(proposal_id),
        };
        self.binding.write(call, U256::ZERO).await
    }

    async fn active_proposals(&self) -> ContractResult<Vec<Proposal>> {
        self.binding
            .read(IPredictionDAO::getActiveProposalsCall {})
            .await?
            .into_iter()
            .map(Proposal::try_from)
            .collect()
    }

    async fn proposal_counter(&self) -> ContractResult<u64> {
        let count = self
            .binding
            .read(IPredictionDAO::proposalCounterCall {})
            .await?;
        Ok(to_u64(count))
    }

    async fn voting_power(&self, user: Address) -> ContractResult<u128> {
        if user == Address::ZERO {
            return Err(ContractError::WalletNotConnected);
        }
        let power = self
            .binding
            .read(IPredictionDAO::votingPowerCall { user })
            .await?;
        Ok(to_u128(power))
    }

    async fn quorum(&self) -> ContractResult<u128> {
        let quorum = self.binding.read(IPredictionDAO::quorumCall {}).await?;
        Ok(to_u128(quorum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::transport::fake::FakeTransport;
    use alloy::sol_types::{SolCall, SolValue};

    fn dao(transport: &Arc<FakeTransport>) -> DaoContract<FakeTransport> {
        DaoContract::new(transport.clone(), Some(Address::with_last_byte(0xda))).unwrap()
    }

    #[test]
    fn test_proposal_type_parse() {
        assert_eq!(
            "treasury-allocation".parse::<ProposalType>().unwrap(),
            ProposalType::TreasuryAllocation
        );
        assert_eq!(ProposalType::from_code(3), Some(ProposalType::MarketApproval));
        assert!(ProposalType::from_code(9).is_none());
    }

    #[tokio::test]
    async fn test_vote_encodes_choice() {
        let transport = Arc::new(FakeTransport::default());
        dao(&transport).vote(2, VoteChoice::Against).await.unwrap();
        dao(&transport).vote(3, VoteChoice::For).await.unwrap();

        let sent = transport.sent();
        let against = IPredictionDAO::voteCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(against.proposalId, U256::from(2));
        assert_eq!(against.choice, 1);
        let favor = IPredictionDAO::voteCall::abi_decode(&sent[1].data).unwrap();
        assert_eq!(favor.choice, 0);
    }

    #[tokio::test]
    async fn test_active_proposals_decode() {
        let transport = Arc::new(FakeTransport::default());
        let raw = IPredictionDAO::Proposal {
            id: U256::from(1),
            proposer: Address::with_last_byte(9),
            title: "Reduce Platform Fee to 2%".to_string(),
            description: "Lower the platform fee from 2.5% to 2%".to_string(),
            proposalType: 1,
            votesFor: U256::from(8900),
            votesAgainst: U256::from(11200),
            endTime: U256::from(1_900_000_000u64),
            status: 0,
        };
        transport.respond(
            IPredictionDAO::getActiveProposalsCall::SELECTOR,
            (vec![raw],).abi_encode_params(),
        );

        let proposals = dao(&transport).active_proposals().await.unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].kind, ProposalType::ParameterChange);
        assert_eq!(proposals[0].votes_against, 11200);
        assert_eq!(proposals[0].status, ProposalStatus::Active);
    }

    #[tokio::test]
    async fn test_voting_power_needs_wallet() {
        let transport = Arc::new(FakeTransport::default());
        let err = dao(&transport).voting_power(Address::ZERO).await.unwrap_err();
        assert_eq!(err, ContractError::WalletNotConnected);
    }
}
