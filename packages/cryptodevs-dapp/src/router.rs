//! HTTP router setup.

use crate::handlers;
use crate::middleware::{api_key_auth, inject_request_id};
use crate::state::AppState;
use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    let actions = Router::new()
        .route("/connect", post(handlers::connect))
        .route("/mint/{kind}", post(handlers::mint))
        .route("/presale/start", post(handlers::start_presale))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            api_key_auth,
        ));

    Router::new()
        .route("/", get(handlers::console_page))
        .route("/state", get(handlers::console_state))
        .route("/api/{token_id}", get(handlers::token_metadata))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(actions)
        .layer(middleware::from_fn(inject_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
        .with_state(state)
}
