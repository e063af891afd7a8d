//! Wallet bridge: an external JSON-RPC signer that owns the user's account.
//!
//! Only the EIP-1193 surface the console needs is used. Keys never reach
//! this process; the bridge signs and broadcasts `eth_sendTransaction`.

use crate::rpc::Endpoint;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Transaction handed to the bridge for signing.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

pub struct WalletBridge {
    endpoint: Endpoint,
}

impl WalletBridge {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, crate::Error> {
        info!(url, "Wallet bridge configured");
        Ok(Self {
            endpoint: Endpoint::new(url, timeout)?,
        })
    }

    /// Ask the bridge for the user's accounts. The first one signs.
    pub async fn request_account(&self) -> Result<String, crate::Error> {
        let accounts: Vec<String> = self
            .endpoint
            .call("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| crate::Error::Wallet(e.to_string()))?;
        accounts
            .into_iter()
            .next()
            .map(|a| a.to_lowercase())
            .ok_or_else(|| crate::Error::Wallet("bridge returned no accounts".into()))
    }

    pub async fn chain_id(&self) -> Result<u64, crate::Error> {
        let quantity: String = self
            .endpoint
            .call("eth_chainId", json!([]))
            .await
            .map_err(|e| crate::Error::Wallet(e.to_string()))?;
        Ok(cryptodevs_types::parse_quantity(&quantity)?)
    }

    /// Sign and broadcast. Returns the transaction hash.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, crate::Error> {
        self.endpoint
            .call("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| crate::Error::Wallet(e.to_string()))
    }
}
