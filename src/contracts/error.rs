//! Wallet and contract error classification

use thiserror::Error;

/// EIP-1193 code for a request the user rejected in their wallet
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("Transaction rejected in wallet")]
    Rejected,

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("{0} contract is not deployed on this network")]
    NotDeployed(&'static str),

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("{0}")]
    InvalidInput(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Could not decode contract response: {0}")]
    Decode(String),
}

impl ContractError {
    /// Classify a JSON-RPC error object
    pub fn from_rpc_error(code: i64, message: &str) -> Self {
        let lower = message.to_lowercase();
        if code == USER_REJECTED_CODE || lower.contains("user rejected") || lower.contains("user denied") {
            return ContractError::Rejected;
        }
        // Geth reports reverts as code 3; other nodes only in the message
        if code == 3 || lower.contains("revert") {
            let reason = message
                .split_once("reverted:")
                .map(|(_, reason)| reason.trim().to_string())
                .unwrap_or_else(|| message.to_string());
            return ContractError::Reverted(reason);
        }
        ContractError::Rpc(format!("{} ({})", message, code))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ContractError::InvalidInput(message.into())
    }

    /// Toast text
    pub fn user_message(&self) -> String {
        match self {
            ContractError::Rejected => "You rejected the transaction in your wallet.".to_string(),
            ContractError::Reverted(reason) => format!("Transaction failed: {}", reason),
            ContractError::NotDeployed(name) => format!(
                "The {} contract is not available yet. This is a demo deployment.",
                name
            ),
            ContractError::WalletNotConnected => "Please connect your wallet first.".to_string(),
            ContractError::InvalidInput(msg) => msg.clone(),
            ContractError::Rpc(msg) => format!("Network error: {}. Please try again.", msg),
            ContractError::Decode(_) => "Unexpected response from the contract.".to_string(),
        }
    }
}

impl From<alloy::sol_types::Error> for ContractError {
    fn from(err: alloy::sol_types::Error) -> Self {
        ContractError::Decode(err.to_string())
    }
}

pub type ContractResult<T> = Result<T, ContractError>;
