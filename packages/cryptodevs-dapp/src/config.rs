//! Service configuration.

use cryptodevs_types::{parse_ether, MetadataTemplate};
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the Crypto Devs service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Read provider for `eth_call` and receipts.
    #[serde(default = "defaults::rpc_url")]
    pub rpc_url: String,

    #[serde(default = "defaults::fallback_rpc_url")]
    pub fallback_rpc_url: String,

    /// Wallet bridge: JSON-RPC signer holding the user's account.
    #[serde(default = "defaults::wallet_url")]
    pub wallet_url: String,

    #[serde(default = "defaults::contract_address")]
    pub contract_address: String,

    #[serde(default = "defaults::chain_id")]
    pub chain_id: u64,

    /// Shown in the wrong-network warning.
    #[serde(default = "defaults::network_name")]
    pub network_name: String,

    #[serde(default = "defaults::mint_price_ether")]
    pub mint_price_ether: String,

    #[serde(default = "defaults::max_supply")]
    pub max_supply: u64,

    #[serde(default = "defaults::poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "defaults::receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    #[serde(default = "defaults::receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    #[serde(default = "defaults::rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Protects the action routes when set. `None` = dev mode.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub metadata: MetadataTemplate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            rpc_url: defaults::rpc_url(),
            fallback_rpc_url: defaults::fallback_rpc_url(),
            wallet_url: defaults::wallet_url(),
            contract_address: defaults::contract_address(),
            chain_id: defaults::chain_id(),
            network_name: defaults::network_name(),
            mint_price_ether: defaults::mint_price_ether(),
            max_supply: defaults::max_supply(),
            poll_interval_secs: defaults::poll_interval_secs(),
            receipt_poll_interval_ms: defaults::receipt_poll_interval_ms(),
            receipt_timeout_secs: defaults::receipt_timeout_secs(),
            rpc_timeout_secs: defaults::rpc_timeout_secs(),
            api_key: None,
            metadata: MetadataTemplate::default(),
        }
    }
}

impl Config {
    /// Mint price in wei. Fails on a malformed `mint_price_ether`.
    pub fn mint_price_wei(&self) -> Result<u128, crate::Error> {
        parse_ether(&self.mint_price_ether)
            .map_err(|e| crate::Error::Config(format!("mint_price_ether: {e}")))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms.max(10))
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs.max(1))
    }

    /// Non-empty API key, if action routes are protected.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

mod defaults {
    pub fn bind_address() -> String {
        "0.0.0.0:3000".into()
    }

    pub fn rpc_url() -> String {
        "https://ethereum-sepolia-rpc.publicnode.com".into()
    }

    pub fn fallback_rpc_url() -> String {
        "https://rpc.sepolia.org".into()
    }

    pub fn wallet_url() -> String {
        "http://127.0.0.1:1248".into()
    }

    pub fn contract_address() -> String {
        "0x0000000000000000000000000000000000000000".into()
    }

    pub fn chain_id() -> u64 {
        11_155_111
    }

    pub fn network_name() -> String {
        "sepolia".into()
    }

    pub fn mint_price_ether() -> String {
        "0.01".into()
    }

    pub fn max_supply() -> u64 {
        20
    }

    pub fn poll_interval_secs() -> u64 {
        5
    }

    pub fn receipt_poll_interval_ms() -> u64 {
        1_000
    }

    pub fn receipt_timeout_secs() -> u64 {
        300
    }

    pub fn rpc_timeout_secs() -> u64 {
        10
    }
}
