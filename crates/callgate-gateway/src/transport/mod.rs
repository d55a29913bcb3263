//! Transport adapters.
//!
//! Each adapter normalizes a platform request into `(body, headers, cookies)`,
//! hands it to the dispatcher, and maps the envelope back, using the
//! envelope's `status` as the outer status code.

pub mod codec;
pub mod http;
pub mod lambda;
