//! Response types for the service API.

use serde::Serialize;

/// Response from the health endpoint.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub contract_address: String,
    pub account: Option<String>,
    pub wallet_connected: bool,
    pub uptime_secs: u64,
    pub requests: u64,
    pub active_rpc: String,
    pub failovers: u64,
    pub rpc_status: &'static str,
    /// Chain reported by the read provider, if reachable.
    pub chain_id: Option<u64>,
}
