//! HTTP request handlers.

use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::render;
use crate::response::HealthResponse;
use crate::session::ConsoleView;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use cryptodevs_types::{MintKind, TokenMetadata};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Token metadata. Always 200; the id is interpolated, never validated.
pub async fn token_metadata(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
    Path(token_id): Path<String>,
) -> Json<TokenMetadata> {
    METRICS.metadata_requests.fetch_add(1, Ordering::Relaxed);
    state.request_count.fetch_add(1, Ordering::Relaxed);
    debug!(req_id = %req_id.0, token_id = %token_id, "Serving token metadata");
    Json(state.config.metadata.render(&token_id))
}

/// The console page for the current phase.
pub async fn console_page(State(state): State<Arc<AppState>>) -> Html<String> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let view = state.session.view();
    Html(render::page(
        &view,
        state.session.poll_interval().as_secs(),
        &state.hero_image,
    ))
}

/// The same view as JSON.
pub async fn console_state(State(state): State<Arc<AppState>>) -> Json<ConsoleView> {
    Json(state.session.view())
}

/// Open the wallet session in the background and return to the page.
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
) -> Redirect {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    info!(req_id = %req_id.0, "Wallet connection requested");

    let session = Arc::clone(&state.session);
    tokio::spawn(async move {
        if let Err(e) = session.connect().await {
            error!(req_id = %req_id.0, error = %e, "Wallet connection failed");
        }
    });
    Redirect::to("/")
}

/// Submit a presale or public mint. `POST /mint/{kind}`
pub async fn mint(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
    Path(kind): Path<String>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let kind: MintKind = match kind.parse() {
        Ok(k) => k,
        Err(e) => {
            warn!(req_id = %req_id.0, kind = %kind, "Unknown mint kind");
            return crate::Error::from(e).into_response();
        }
    };
    info!(req_id = %req_id.0, kind = %kind, "Mint requested");

    let session = Arc::clone(&state.session);
    tokio::spawn(async move {
        if let Err(e) = session.mint(kind).await {
            error!(req_id = %req_id.0, kind = %kind, error = %e, "Mint failed");
        }
    });
    Redirect::to("/").into_response()
}

/// Owner-only presale start. `POST /presale/start`
pub async fn start_presale(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
) -> Redirect {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    info!(req_id = %req_id.0, "Presale start requested");

    let session = Arc::clone(&state.session);
    tokio::spawn(async move {
        if let Err(e) = session.start_presale().await {
            error!(req_id = %req_id.0, error = %e, "Starting presale failed");
        }
    });
    Redirect::to("/")
}

/// Health check with session and RPC status.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let rpc_status = state.provider.health_check().await.unwrap_or("unavailable");
    let chain_id = state.provider.chain_id().await.ok();
    let wrong_chain = chain_id.is_some_and(|id| id != state.config.chain_id);
    if wrong_chain {
        warn!(expected = state.config.chain_id, actual = ?chain_id, "RPC node is on the wrong chain");
    }
    let status = match rpc_status {
        "unavailable" => "unavailable",
        "degraded" => "degraded",
        _ if wrong_chain => "degraded",
        _ => "ok",
    };

    Json(HealthResponse {
        status,
        contract_address: state.session.contract_address().to_string(),
        account: state.session.account(),
        wallet_connected: state.session.is_connected(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
        active_rpc: state.provider.active_url().to_string(),
        failovers: state.provider.failover_count(),
        rpc_status,
        chain_id,
    })
}

/// Prometheus metrics in text exposition format.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = METRICS.render(state.session.is_connected(), state.session.in_flight());
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        body,
    )
}
