//! PredictChain Library
//!
//! Client and companion service for a DAO-governed prediction market:
//!
//! 1. **Market Registry**: REST endpoints for markets, bets and users backed by
//!    a pluggable repository (in-memory, SQLite, or the on-chain placeholder).
//!
//! 2. **Data access**: a cached HTTP client with invalidation on mutation and
//!    toast notifications on failure.
//!
//! 3. **Contract bindings**: typed calls into the market factory, markets,
//!    DAO, NFT rewards and user profile contracts over JSON-RPC.
//!
//! 4. **Presentation**: derived display values, form checks and terminal
//!    rendering.
//!
//! Settlement, custody, payouts and vote tallying happen in the contracts.

pub mod api;
pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod store;
pub mod types;
pub mod ui;
pub mod validation;
pub mod wallet;

pub use client::{ApiClient, ClientError, DataClient};
pub use config::{Config, StorageBackend};
pub use contracts::{ContractError, Contracts, RpcTransport};
pub use error::{ApiError, StoreError};
pub use store::{MarketRepository, MemStorage, OnchainStub, SqliteStorage};
pub use types::{Bet, Market, MarketFilter, MarketResult, MarketStatus, Position, User};
