//! HTTP adapter (axum).
//!
//! `POST /v1/call` with the JSON envelope as body. Credentials come from the
//! `Authorization` header and the session cookie; nothing else.

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use callgate_core::protocol::ResponseEnvelope;

use crate::app_state::AppState;
use crate::transport::codec::{body_to_str, encode_response, RawCall};

pub async fn call(State(app): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let started = Instant::now();
    let metrics = app.metrics();
    let in_flight = metrics.calls_in_flight.track();

    let resp = match body_to_str(&body) {
        Ok(raw) => {
            let pairs = headers
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v)));
            let call = RawCall::new(raw, pairs);
            app.dispatcher()
                .handle(&call.body, &call.headers, &call.cookies)
                .await
        }
        Err(e) => ResponseEnvelope::from(e),
    };

    drop(in_flight);
    metrics.record_call(resp.code(), started.elapsed());

    into_http(resp)
}

pub fn into_http(resp: ResponseEnvelope) -> Response {
    let (status, body) = encode_response(resp);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
