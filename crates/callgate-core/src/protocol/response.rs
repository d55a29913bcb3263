//! Response envelope.
//!
//! The dispatcher always produces exactly one of these per call. Transport
//! adapters call [`ResponseEnvelope::into_wire`] to split off the outer status.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{ClientCode, GateError};

/// Default status for a handler rejection that did not carry one.
pub const DEFAULT_REJECT_STATUS: u16 = 400;

/// Error object `{error, code, status}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    pub status: u16,
}

impl ErrorBody {
    pub fn new(code: ClientCode, msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: code.as_str().to_string(),
            status: code.status(),
        }
    }

    /// Handler-defined code. Status outside 400..=599 falls back to 400.
    pub fn custom(code: impl Into<String>, msg: impl Into<String>, status: Option<u16>) -> Self {
        let status = status
            .filter(|s| (400..=599).contains(s))
            .unwrap_or(DEFAULT_REJECT_STATUS);
        Self {
            error: msg.into(),
            code: code.into(),
            status,
        }
    }
}

impl From<&GateError> for ErrorBody {
    fn from(e: &GateError) -> Self {
        ErrorBody::new(e.client_code(), e.client_message())
    }
}

impl From<GateError> for ErrorBody {
    fn from(e: GateError) -> Self {
        ErrorBody::from(&e)
    }
}

/// Outcome of one dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// Handler payload, verbatim.
    Success(Value),
    Failure(ErrorBody),
}

impl ResponseEnvelope {
    pub fn error(code: ClientCode, msg: impl Into<String>) -> Self {
        ResponseEnvelope::Failure(ErrorBody::new(code, msg))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success(_))
    }

    /// Outcome label: `OK` or the error code.
    pub fn code(&self) -> &str {
        match self {
            ResponseEnvelope::Success(_) => "OK",
            ResponseEnvelope::Failure(b) => &b.code,
        }
    }

    /// Split into `(outer status, body without status)`.
    ///
    /// A success payload may carry its own top-level `status`; it is consumed
    /// the same way as for errors. Non-integer or out-of-range values are
    /// dropped and the status stays 200.
    pub fn into_wire(self) -> (u16, Value) {
        match self {
            ResponseEnvelope::Failure(b) => (b.status, json!({ "error": b.error, "code": b.code })),
            ResponseEnvelope::Success(Value::Object(mut m)) => {
                let status = take_status(&mut m).unwrap_or(200);
                (status, Value::Object(m))
            }
            ResponseEnvelope::Success(v) => (200, v),
        }
    }
}

impl From<GateError> for ResponseEnvelope {
    fn from(e: GateError) -> Self {
        ResponseEnvelope::Failure(e.into())
    }
}

fn take_status(m: &mut Map<String, Value>) -> Option<u16> {
    let v = m.remove("status")?;
    v.as_u64()
        .and_then(|s| u16::try_from(s).ok())
        .filter(|s| (100..=599).contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_strips_status() {
        let r = ResponseEnvelope::error(ClientCode::AdminOnly, "admin only");
        let (status, body) = r.into_wire();
        assert_eq!(status, 403);
        assert_eq!(body, json!({"error": "admin only", "code": "ADMIN_ONLY"}));
    }

    #[test]
    fn success_payload_status_is_consumed() {
        let r = ResponseEnvelope::Success(json!({"created": true, "status": 201}));
        assert_eq!(r.into_wire(), (201, json!({"created": true})));

        let r = ResponseEnvelope::Success(json!({"status": "weird", "a": 1}));
        assert_eq!(r.into_wire(), (200, json!({"a": 1})));

        let r = ResponseEnvelope::Success(json!([1, 2]));
        assert_eq!(r.into_wire(), (200, json!([1, 2])));
    }

    #[test]
    fn custom_status_is_always_an_error_status() {
        assert_eq!(ErrorBody::custom("NOT_FOUND", "gone", Some(404)).status, 404);
        assert_eq!(ErrorBody::custom("X", "m", None).status, 400);
        assert_eq!(ErrorBody::custom("X", "m", Some(200)).status, 400);
        assert_eq!(ErrorBody::custom("X", "m", Some(9000)).status, 400);
    }

    #[test]
    fn gate_error_maps_to_body() {
        let b = ErrorBody::from(GateError::Internal("db unreachable".into()));
        assert_eq!(b.code, "INTERNAL");
        assert_eq!(b.status, 500);
        assert_eq!(b.error, "db unreachable");
    }
}
