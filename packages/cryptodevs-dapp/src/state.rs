//! Application state shared across handlers.

use crate::config::Config;
use crate::rpc::RpcClient;
use crate::session::Session;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub provider: Arc<RpcClient>,
    pub session: Arc<Session>,
    /// Artwork shown on the console page (token #1's image).
    pub hero_image: String,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: Config) -> Result<Self, crate::Error> {
        if config.contract_address.eq_ignore_ascii_case(ZERO_ADDRESS) {
            warn!("contract_address is the zero address, set CRYPTODEVS_CONTRACT_ADDRESS");
        }

        let provider = Arc::new(RpcClient::new(
            &config.rpc_url,
            &config.fallback_rpc_url,
            config.rpc_timeout(),
        )?);
        let session = Arc::new(Session::from_config(&config, Arc::clone(&provider))?);
        let hero_image = config.metadata.render("1").image;

        info!(contract = %session.contract_address(), wallet = %config.wallet_url, "Session prepared");

        Ok(Self {
            config,
            provider,
            session,
            hero_image,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        })
    }
}
