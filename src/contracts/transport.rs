//! Contract call transport
//!
//! Reads go through `eth_call`. Writes go through `eth_sendTransaction`, so
//! the node or wallet behind the RPC endpoint holds the key and asks the user
//! to confirm. Once sent, a write cannot be cancelled from here.

use super::error::{ContractError, ContractResult};
use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::{json, Value};
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: B256,
}

impl std::fmt::Display for TxHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

pub trait ContractTransport: Send + Sync {
    /// Read-only call; returns the raw ABI-encoded return data
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = ContractResult<Bytes>> + Send;

    /// State-changing call, confirmed by the connected wallet
    fn send(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> impl Future<Output = ContractResult<TxHandle>> + Send;
}

/// Ethereum JSON-RPC transport
pub struct RpcTransport {
    client: reqwest::Client,
    rpc_url: String,
    from: Option<Address>,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(rpc_url: impl Into<String>, from: Option<Address>) -> ContractResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ContractError::Rpc(e.to_string()))?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            from,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &crate::Config) -> ContractResult<Self> {
        Self::new(config.rpc_url.clone(), config.wallet_address)
    }

    pub fn sender(&self) -> Option<Address> {
        self.from
    }

    async fn request(&self, method: &str, params: Value) -> ContractResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ContractError::Rpc(format!("{} failed: {}", method, e)))?;

        let json: Value = resp
            .json()
            .await
            .map_err(|e| ContractError::Rpc(format!("Failed to parse RPC response: {}", e)))?;

        if let Some(error) = json.get("error") {
            let code = error["code"].as_i64().unwrap_or_default();
            let message = error["message"].as_str().unwrap_or("unknown error");
            return Err(ContractError::from_rpc_error(code, message));
        }

        Ok(json["result"].clone())
    }
}

impl ContractTransport for RpcTransport {
    async fn call(&self, to: Address, data: Bytes) -> ContractResult<Bytes> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": format!("{:?}", to), "data": data.to_string() }, "latest"]),
            )
            .await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| ContractError::Decode("eth_call returned no data".to_string()))?;
        Bytes::from_str(hex_str).map_err(|e| ContractError::Decode(e.to_string()))
    }

    async fn send(&self, to: Address, data: Bytes, value: U256) -> ContractResult<TxHandle> {
        let from = self.from.ok_or(ContractError::WalletNotConnected)?;
        debug!("Sending transaction to {} ({} bytes)", to, data.len());

        let result = self
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": format!("{:?}", from),
                    "to": format!("{:?}", to),
                    "data": data.to_string(),
                    "value": format!("{:#x}", value),
                }]),
            )
            .await?;
        let hash = result
            .as_str()
            .and_then(|h| B256::from_str(h).ok())
            .ok_or_else(|| ContractError::Decode("missing transaction hash".to_string()))?;

        info!("Transaction submitted: {}", hash);
        Ok(TxHandle { hash })
    }
}
