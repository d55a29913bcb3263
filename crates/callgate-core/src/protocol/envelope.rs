//! Request envelope (JSON).
//!
//! Wire shape: `{"func": "<operation>", "args": {...}}`. Unknown top-level
//! fields are ignored so older clients that send extra metadata keep working.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{GateError, Result};

/// Decoded request envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    /// Operation name (non-empty).
    pub operation: String,
    /// Call arguments. Empty when `args` is absent or `null`.
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct WireRequest {
    #[serde(default)]
    func: Option<String>,
    #[serde(default)]
    args: Option<Value>,
}

impl RequestEnvelope {
    /// Parse a raw body. Every failure is a `BadRequest`.
    pub fn parse(raw: &str) -> Result<Self> {
        let wire: WireRequest = serde_json::from_str(raw)
            .map_err(|_| GateError::BadRequest("invalid JSON".into()))?;

        let operation = match wire.func {
            Some(f) if !f.trim().is_empty() => f,
            _ => return Err(GateError::BadRequest("missing operation name".into())),
        };

        let arguments = match wire.args {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(m)) => m,
            Some(_) => return Err(GateError::BadRequest("args must be an object".into())),
        };

        Ok(Self { operation, arguments })
    }
}
