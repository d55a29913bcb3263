//! Auth context resolution: bearer header first, then session cookie.

use std::sync::Arc;

use chrono::Utc;

use callgate_core::error::Result;
use callgate_core::protocol::{Cookies, Headers};

use super::bearer::VerifierSet;
use super::context::{AuthContext, IdentitySource};
use super::revocation::RevocationSource;
use super::session::SessionStore;
use crate::config::AuthSection;

const BEARER: &str = "bearer ";

/// Turns transport credentials into a verified identity, or `None`.
///
/// Never fails. Immutable after construction and safe to share across
/// concurrent calls.
pub struct AuthResolver {
    verifiers: VerifierSet,
    sessions: Option<Arc<dyn SessionStore>>,
    session_cookie: String,
}

impl AuthResolver {
    pub fn new(
        verifiers: VerifierSet,
        sessions: Option<Arc<dyn SessionStore>>,
        session_cookie: impl Into<String>,
    ) -> Self {
        Self {
            verifiers,
            sessions,
            session_cookie: session_cookie.into(),
        }
    }

    pub fn from_config(
        auth: &AuthSection,
        sessions: Option<Arc<dyn SessionStore>>,
        revocations: Option<Arc<dyn RevocationSource>>,
    ) -> Result<Self> {
        let verifiers = VerifierSet::from_config(auth, revocations)?;
        Ok(Self::new(verifiers, sessions, auth.session_cookie.clone()))
    }

    /// Anonymous-only resolver (no verifiers, no store).
    pub fn anonymous() -> Self {
        Self::new(VerifierSet::new(), None, "sid")
    }

    pub async fn resolve(&self, headers: &Headers, cookies: &Cookies) -> Option<AuthContext> {
        let (ctx, source) = self.resolve_with_source(headers, cookies).await?;
        tracing::debug!(user_id = ctx.user_id(), source = source.as_str(), "identity resolved");
        Some(ctx)
    }

    pub async fn resolve_with_source(
        &self,
        headers: &Headers,
        cookies: &Cookies,
    ) -> Option<(AuthContext, IdentitySource)> {
        // 1) bearer. A verified token wins outright.
        if let Some(token) = bearer_token(headers) {
            if let Some(ctx) = self.verifiers.verify(token).await {
                return Some((ctx, IdentitySource::Bearer));
            }
        }

        // 2) session cookie.
        let sid = cookies.get(&self.session_cookie).filter(|s| !s.is_empty())?;
        let store = self.sessions.as_ref()?;
        let record = match store.lookup_session(sid).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                tracing::debug!("unknown session id");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                return None;
            }
        };

        match record.into_context(sid, Utc::now()) {
            Some(ctx) => Some((ctx, IdentitySource::Session)),
            None => {
                tracing::debug!("session revoked or expired");
                None
            }
        }
    }
}

/// Token from `Authorization: Bearer <token>`; scheme is case-insensitive.
pub fn bearer_token(headers: &Headers) -> Option<&str> {
    let value = headers.get("authorization").or_else(|| {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .map(|(_, v)| v)
    })?;

    let scheme = value.get(..BEARER.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return None;
    }
    let token = value[BEARER.len()..].trim();
    (!token.is_empty()).then_some(token)
}
