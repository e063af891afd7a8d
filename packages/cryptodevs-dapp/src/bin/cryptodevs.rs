//! Crypto Devs dApp binary.

use cryptodevs_dapp::{create_router, AppState, Config};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Crypto Devs dApp");

    let config: Config = config::Config::builder()
        .add_source(config::File::with_name("cryptodevs").required(false))
        .add_source(
            config::Environment::with_prefix("CRYPTODEVS")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .and_then(|c| c.try_deserialize())
        .unwrap_or_else(|e| {
            // Fall back only when no config exists; parsing errors fail hard.
            let err_str = format!("{e}");
            if err_str.contains("not found") || err_str.contains("missing field") {
                warn!(error = %e, "No config file found, using defaults");
                Config::default()
            } else {
                error!(error = %e, "FATAL: Config error, fix env vars or cryptodevs.toml");
                std::process::exit(1);
            }
        });

    if config.api_key().is_some() {
        info!("API key auth enabled");
    } else {
        warn!("CRYPTODEVS_API_KEY not set, action routes are unprotected (dev mode)");
    }

    info!(
        contract = %config.contract_address,
        rpc = %config.rpc_url,
        wallet = %config.wallet_url,
        chain_id = config.chain_id,
        "Configuration loaded"
    );

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config)?);

    let app = create_router(state.clone());

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping poller...");
    state.session.shutdown();

    let drain_deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let in_flight = state.session.in_flight();
        if in_flight == 0 {
            break;
        }
        if tokio::time::Instant::now() >= drain_deadline {
            warn!(remaining = in_flight, "Drain timeout, abandoning pending reads");
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    info!("dApp shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
