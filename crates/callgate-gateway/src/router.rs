//! Axum router wiring.
//!
//! `POST /v1/call` (and `POST /`) carry the RPC envelope; the rest are
//! operational endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let limit = state.cfg().gateway.max_body_bytes;
    Router::new()
        .route("/", post(transport::http::call))
        .route("/v1/call", post(transport::http::call))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}
