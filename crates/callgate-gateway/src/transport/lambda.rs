//! Serverless event adapter.
//!
//! Accepts an API-Gateway-style proxy event (`headers`, `body`,
//! `isBase64Encoded`, optional `cookies` array) as JSON and produces the
//! matching proxy response `{statusCode, headers, body}`. It has no runtime
//! dependency, so any function runtime can call it from its handler.

use base64::Engine;
use serde_json::{json, Value};

use callgate_core::error::{GateError, Result};
use callgate_core::protocol::ResponseEnvelope;

use crate::dispatch::Dispatcher;
use crate::transport::codec::{encode_response, parse_cookie_header, RawCall};

pub async fn handle_event(dispatcher: &Dispatcher, event: &Value) -> Value {
    let resp = match decode_event(event) {
        Ok(call) => dispatcher.handle(&call.body, &call.headers, &call.cookies).await,
        Err(e) => ResponseEnvelope::from(e),
    };
    let (status, body) = encode_response(resp);
    proxy_response(status, body)
}

pub fn decode_event(event: &Value) -> Result<RawCall> {
    let pairs: Vec<(&str, &str)> = event
        .get("headers")
        .and_then(Value::as_object)
        .map(|h| {
            h.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
                .collect()
        })
        .unwrap_or_default();

    let body = match event.get("body") {
        None | Some(Value::Null) => "{}".to_string(),
        Some(Value::String(s)) if is_base64(event) => decode_base64_body(s)?,
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(GateError::BadRequest("invalid JSON".into())),
    };

    let mut call = RawCall::new(body, pairs);

    // HTTP API v2 moves cookies out of the headers.
    if let Some(list) = event.get("cookies").and_then(Value::as_array) {
        for c in list.iter().filter_map(Value::as_str) {
            for (k, v) in parse_cookie_header(c) {
                call.cookies.entry(k).or_insert(v);
            }
        }
    }
    Ok(call)
}

fn is_base64(event: &Value) -> bool {
    event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn decode_base64_body(s: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|_| GateError::BadRequest("invalid base64 body".into()))?;
    String::from_utf8(bytes).map_err(|_| GateError::BadRequest("invalid JSON".into()))
}

fn proxy_response(status: u16, body: String) -> Value {
    json!({
        "statusCode": status,
        "headers": { "content-type": "application/json" },
        "body": body,
    })
}
