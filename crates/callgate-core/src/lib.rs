//! callgate core: transport-agnostic envelopes, identity vocabulary and errors.
//!
//! This crate defines the wire-level contracts and error surface shared by the
//! gateway, handlers, and adapters. It carries no transport or runtime
//! dependencies so it can be reused by any adapter.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `GateError`/`Result` so a hostile body
//! can never take the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod identity;
pub mod protocol;

/// Shared result type.
pub use error::{ClientCode, GateError, Result};
pub use identity::{Role, SubscriptionState};
