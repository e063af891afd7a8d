//! Typed access to the deployed Crypto Devs contract.

use crate::rpc::{RpcClient, TransactionReceipt};
use crate::wallet::{TransactionRequest, WalletBridge};
use cryptodevs_types::{decode_address, decode_bool, decode_u64, to_quantity, ContractCall};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::metrics::METRICS;

pub struct CryptoDevsContract {
    address: String,
    provider: Arc<RpcClient>,
}

impl CryptoDevsContract {
    pub fn new(address: &str, provider: Arc<RpcClient>) -> Self {
        Self {
            address: address.to_lowercase(),
            provider,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn read(&self, call: ContractCall) -> Result<String, crate::Error> {
        METRICS.reads_total.fetch_add(1, Ordering::Relaxed);
        let result = self.provider.eth_call(&self.address, &call.calldata()).await;
        if let Err(e) = &result {
            METRICS.read_errors.fetch_add(1, Ordering::Relaxed);
            debug!(method = call.signature(), error = %e, "Contract read failed");
        }
        result
    }

    /// Number of tokens minted so far.
    pub async fn token_ids(&self) -> Result<u64, crate::Error> {
        Ok(decode_u64(&self.read(ContractCall::TokenIds).await?)?)
    }

    pub async fn presale_started(&self) -> Result<bool, crate::Error> {
        Ok(decode_bool(&self.read(ContractCall::PresaleStarted).await?)?)
    }

    /// Unix timestamp (seconds) at which the presale ends.
    pub async fn presale_ended(&self) -> Result<u64, crate::Error> {
        Ok(decode_u64(&self.read(ContractCall::PresaleEnded).await?)?)
    }

    pub async fn owner(&self) -> Result<String, crate::Error> {
        Ok(decode_address(&self.read(ContractCall::Owner).await?)?)
    }

    /// Send `call` from `from` through the wallet bridge. Returns the hash.
    pub async fn send(
        &self,
        wallet: &WalletBridge,
        from: &str,
        call: ContractCall,
        value_wei: Option<u128>,
    ) -> Result<String, crate::Error> {
        let tx = TransactionRequest {
            from: from.to_string(),
            to: self.address.clone(),
            data: call.calldata(),
            value: value_wei.map(to_quantity),
        };
        wallet.send_transaction(&tx).await
    }

    /// Poll for the receipt until it lands (one confirmation) or `timeout`.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        poll_every: Duration,
        timeout: Duration,
    ) -> Result<TransactionReceipt, crate::Error> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.provider.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) if receipt.succeeded() => return Ok(receipt),
                Ok(Some(_)) => {
                    return Err(crate::Error::Transaction(format!("{tx_hash} reverted")));
                }
                Ok(None) => debug!(tx_hash, "Receipt pending"),
                Err(e) => warn!(tx_hash, error = %e, "Receipt query failed"),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(crate::Error::Transaction(format!(
                    "{tx_hash} not confirmed within {}s",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(poll_every).await;
        }
    }
}
