//! Shared application state for the callgate gateway.
//!
//! Built once at process start from the config, the handler registry, and the
//! external collaborators. Everything inside is immutable except metrics.

use std::sync::Arc;

use callgate_core::error::{GateError, Result};

use crate::auth::{AuthResolver, RevocationSource, SessionStore};
use crate::config::GatewayConfig;
use crate::dispatch::{Dispatcher, HandlerRegistry};
use crate::obs::GatewayMetrics;
use crate::policy::PolicyTable;

const FAIL_FAST_ON_MISMATCH: bool = false; // if changed to true, boot fails.

/// External collaborators the identity layer reads from.
#[derive(Default, Clone)]
pub struct Backends {
    pub sessions: Option<Arc<dyn SessionStore>>,
    pub revocations: Option<Arc<dyn RevocationSource>>,
}

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<GatewayConfig>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Returns Result so main can report startup errors without panicking.
    pub fn new(cfg: GatewayConfig, registry: HandlerRegistry, backends: Backends) -> Result<Self> {
        // 1) Compile policy table
        let policies = PolicyTable::from_config(&cfg)?;

        // 2) policy <-> registry sanity check
        for op in policies.operations() {
            if !registry.contains(op) {
                tracing::warn!(op = %op, "policy refers to unregistered operation");
                if FAIL_FAST_ON_MISMATCH {
                    return Err(GateError::BadRequest(format!(
                        "policy references unregistered operation: {op}"
                    )));
                }
            }
        }
        for op in registry.operations() {
            if policies.rule(op).is_none() {
                tracing::info!(op = %op, "operation is public (no policy rule)");
            }
        }

        // 3) Identity resolver
        let has_sessions = backends.sessions.is_some();
        let resolver = AuthResolver::from_config(&cfg.auth, backends.sessions, backends.revocations)?;
        if cfg.auth.verifiers.is_empty() && !has_sessions {
            tracing::warn!("no bearer verifiers and no session store: every caller is anonymous");
        }

        Ok(Self {
            cfg: Arc::new(cfg),
            dispatcher: Arc::new(Dispatcher::new(registry, policies, resolver)),
            metrics: Arc::new(GatewayMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }
}
