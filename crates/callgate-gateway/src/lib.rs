//! callgate gateway library entry.
//!
//! Wires the identity resolver, policy table, handler registry and
//! dispatcher into one request pipeline, plus the HTTP and serverless
//! adapters that feed it. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod services;
pub mod transport;
