//! Wire envelopes exchanged with transport adapters.
//!
//! Parsing never panics: malformed input is reported as `GateError`
//! so the dispatcher can answer with a client error instead of crashing.

use std::collections::HashMap;

pub mod envelope;
pub mod response;

pub use envelope::RequestEnvelope;
pub use response::{ErrorBody, ResponseEnvelope};

/// Request headers with lower-cased names, as produced by adapters.
pub type Headers = HashMap<String, String>;

/// Cookie name -> value.
pub type Cookies = HashMap<String, String>;
