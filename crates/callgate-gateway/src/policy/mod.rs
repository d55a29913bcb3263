//! Policy layer: per-operation auth, ban, role and subscription gates.
//!
//! Compiles the `policies:` configuration into an immutable table that the
//! dispatcher consults before any handler runs.

pub mod engine;
pub mod rules;

pub use engine::{evaluate_rule, PolicyDecision, PolicyTable};
pub use rules::PolicyRule;
