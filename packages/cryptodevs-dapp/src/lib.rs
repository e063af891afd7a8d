//! # Crypto Devs dApp
//!
//! Minting console and token metadata service for the Crypto Devs NFT
//! collection. Reads go to a JSON-RPC node with failover; transactions are
//! handed to an external wallet bridge that speaks EIP-1193 JSON-RPC and
//! holds the keys.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin cryptodevs
//! ```
//!
//! ## Endpoints
//! - `GET /` - Minting console for the current phase
//! - `GET /state` - Console state as JSON
//! - `GET /api/{token_id}` - Token metadata
//! - `GET /health` - Health check with RPC status
//! - `GET /metrics` - Prometheus metrics
//! - `POST /connect` - Connect the wallet and start polling
//! - `POST /mint/{kind}` - Presale or public mint
//! - `POST /presale/start` - Owner-only presale start

pub mod config;
pub mod contract;
mod error;
mod handlers;
pub mod metrics;
mod middleware;
mod render;
mod response;
mod router;
pub mod rpc;
pub mod session;
mod state;
pub mod wallet;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::Error;
pub use router::create as create_router;
pub use session::Session;
pub use state::AppState;
