use tracing::Instrument;

use callgate_core::error::GateError;
use callgate_core::protocol::{Cookies, Headers, RequestEnvelope, ResponseEnvelope};

use super::registry::HandlerRegistry;
use crate::auth::AuthResolver;
use crate::policy::{PolicyDecision, PolicyTable};

/// Request pipeline: parse, route, resolve identity, gate, invoke.
///
/// Immutable once built; share one instance behind an `Arc` across every
/// concurrent call. Nothing is cached between calls.
pub struct Dispatcher {
    registry: HandlerRegistry,
    policies: PolicyTable,
    resolver: AuthResolver,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, policies: PolicyTable, resolver: AuthResolver) -> Self {
        Self {
            registry,
            policies,
            resolver,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// Handle one raw call. Always returns exactly one envelope.
    pub async fn handle(&self, raw_body: &str, headers: &Headers, cookies: &Cookies) -> ResponseEnvelope {
        // 1) parse; nothing else runs on a malformed body
        let env = match RequestEnvelope::parse(raw_body) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(error = %e, "envelope rejected");
                return e.into();
            }
        };

        let span = tracing::info_span!("call", op = %env.operation);
        self.handle_envelope(env, headers, cookies).instrument(span).await
    }

    async fn handle_envelope(
        &self,
        env: RequestEnvelope,
        headers: &Headers,
        cookies: &Cookies,
    ) -> ResponseEnvelope {
        // 2) route before identity is used
        if !self.registry.contains(&env.operation) {
            tracing::debug!("unknown operation");
            return GateError::BadRequest(format!("unknown operation: {}", env.operation)).into();
        }

        // 3) identity
        let ctx = self.resolver.resolve(headers, cookies).await;

        // 4) policy gate
        if let PolicyDecision::Reject { code, msg } = self.policies.evaluate(&env.operation, ctx.as_ref()) {
            tracing::info!(
                code = code.as_str(),
                user_id = ctx.as_ref().map(|c| c.user_id()),
                "policy rejected call"
            );
            return ResponseEnvelope::error(code, msg);
        }

        // 5) invoke + 6) normalize
        let resp = self.registry.dispatch(&env.operation, env.arguments, ctx).await;
        tracing::debug!(code = resp.code(), "call finished");
        resp
    }
}
