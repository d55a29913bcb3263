//! Adapter-side normalization shared by every transport.
//!
//! - headers => lower-cased name map
//! - `Cookie` header => cookie map
//! - `ResponseEnvelope` => (status, JSON text)

use callgate_core::error::{GateError, Result};
use callgate_core::protocol::{Cookies, Headers, ResponseEnvelope};

const FALLBACK_BODY: &str = r#"{"error":"internal error","code":"INTERNAL"}"#;

/// Dispatcher input after adapter normalization.
#[derive(Debug, Clone, Default)]
pub struct RawCall {
    pub body: String,
    pub headers: Headers,
    pub cookies: Cookies,
}

impl RawCall {
    /// Build from header pairs; cookies are taken from the `cookie` header.
    pub fn new<'a>(body: impl Into<String>, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let headers = lowercase_headers(headers);
        let cookies = headers
            .get("cookie")
            .map(|c| parse_cookie_header(c))
            .unwrap_or_default();
        Self {
            body: body.into(),
            headers,
            cookies,
        }
    }
}

/// Lower-case header names. Repeated `cookie` headers are joined; for any
/// other repeated header the first value wins.
pub fn lowercase_headers<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Headers {
    let mut out = Headers::new();
    for (name, value) in pairs {
        let name = name.to_ascii_lowercase();
        match out.get_mut(&name) {
            Some(existing) if name == "cookie" => {
                existing.push_str("; ");
                existing.push_str(value);
            }
            Some(_) => {}
            None => {
                out.insert(name, value.to_string());
            }
        }
    }
    out
}

/// Parse `a=1; b="two"`. Malformed pairs are skipped; first occurrence wins.
pub fn parse_cookie_header(raw: &str) -> Cookies {
    let mut out = Cookies::new();
    for part in raw.split(';') {
        let Some((name, value)) = part.split_once('=') else { continue };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        out.entry(name.to_string()).or_insert_with(|| value.to_string());
    }
    out
}

/// Body bytes must be UTF-8; anything else is a malformed request.
pub fn body_to_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| GateError::BadRequest("invalid JSON".into()))
}

/// Split off the status and serialize the body.
pub fn encode_response(resp: ResponseEnvelope) -> (u16, String) {
    let (status, body) = resp.into_wire();
    match serde_json::to_string(&body) {
        Ok(s) => (status, s),
        Err(e) => {
            tracing::warn!(error = %e, "response serialization failed");
            (500, FALLBACK_BODY.to_string())
        }
    }
}
