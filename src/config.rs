//! Configuration management for the PredictChain service and CLI

use alloy::primitives::Address;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which market repository the server runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite,
    Onchain,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "sqlite" | "db" => Ok(StorageBackend::Sqlite),
            "onchain" | "chain" => Ok(StorageBackend::Onchain),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}'", other),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Onchain => "onchain",
        };
        f.write_str(name)
    }
}

/// Deployed contract addresses. A missing entry means that contract is not
/// available on the configured network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAddresses {
    pub market_factory: Option<Address>,
    pub dao: Option<Address>,
    pub nft_reward: Option<Address>,
    pub user_profile: Option<Address>,
}

impl ContractAddresses {
    fn from_env() -> Result<Self> {
        Ok(Self {
            market_factory: address_var("PREDICTION_MARKET_FACTORY_ADDRESS")?,
            dao: address_var("DAO_ADDRESS")?,
            nft_reward: address_var("NFT_REWARD_ADDRESS")?,
            user_profile: address_var("USER_PROFILE_ADDRESS")?,
        })
    }
}

/// Service configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the REST server listens on
    pub bind_addr: String,

    /// Repository implementation behind the REST API
    pub storage_backend: StorageBackend,

    /// SQLite connection string, used by the sqlite backend
    pub database_path: String,

    /// Base URL of the REST API, used by the CLI
    pub api_base_url: String,

    /// Ethereum JSON-RPC endpoint
    pub rpc_url: String,

    /// Connected wallet; sender of contract writes
    pub wallet_address: Option<Address>,

    pub contracts: ContractAddresses,

    /// How long a cached query stays fresh
    pub query_stale_time: Duration,

    /// Page size for market listings without an explicit limit
    pub default_page_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            storage_backend: StorageBackend::Memory,
            database_path: "sqlite:predictchain.db".to_string(),
            api_base_url: "http://localhost:3000".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            wallet_address: None,
            contracts: ContractAddresses::default(),
            query_stale_time: Duration::from_secs(300),
            default_page_limit: crate::store::DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let bind_addr = env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.storage_backend,
        };

        let database_path = env::var("DATABASE_PATH").unwrap_or(defaults.database_path);

        let api_base_url = env::var("API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let rpc_url = env::var("RPC_URL").unwrap_or(defaults.rpc_url);

        let wallet_address = address_var("WALLET_ADDRESS")?;
        let contracts = ContractAddresses::from_env()?;

        let query_stale_time = env::var("QUERY_STALE_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.query_stale_time);

        let default_page_limit = env::var("DEFAULT_PAGE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|limit: &usize| *limit > 0)
            .unwrap_or(defaults.default_page_limit);

        Ok(Self {
            bind_addr,
            storage_backend,
            database_path,
            api_base_url,
            rpc_url,
            wallet_address,
            contracts,
            query_stale_time,
            default_page_limit,
        })
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn address_var(name: &str) -> Result<Option<Address>> {
    non_empty(name)
        .map(|value| {
            Address::from_str(value.trim()).with_context(|| format!("{} is not an address", name))
        })
        .transpose()
}
