use chrono::{DateTime, Utc};
use serde::Serialize;

use callgate_core::identity::{Role, SubscriptionState};

/// Verified caller identity for one call.
///
/// Only the auth module can build one: from the [`VerifiedClaims`] a
/// [`CredentialVerifier`](super::CredentialVerifier) returns, or from a live
/// session record. Fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    user_id: u64,
    role: Role,
    is_banned: bool,
    subscription_state: SubscriptionState,
    provider: String,
    session_id: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Where the identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Bearer,
    Session,
}

impl IdentitySource {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentitySource::Bearer => "bearer",
            IdentitySource::Session => "session",
        }
    }
}

/// Identity fields a verifier vouches for.
///
/// A [`CredentialVerifier`](super::CredentialVerifier) returns these only
/// after the credential passed every check it owns (signature, expiry,
/// revocation). The resolver turns them into an [`AuthContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub user_id: u64,
    pub role: Role,
    pub is_banned: bool,
    pub subscription_state: SubscriptionState,
    pub provider: String,
    pub session_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub(crate) fn from_verified(c: VerifiedClaims) -> Self {
        Self {
            user_id: c.user_id,
            role: c.role,
            is_banned: c.is_banned,
            subscription_state: c.subscription_state,
            provider: c.provider,
            session_id: c.session_id,
            issued_at: c.issued_at,
            expires_at: c.expires_at,
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }
    pub fn role(&self) -> Role {
        self.role
    }
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
    pub fn is_banned(&self) -> bool {
        self.is_banned
    }
    pub fn subscription_state(&self) -> SubscriptionState {
        self.subscription_state
    }
    pub fn provider(&self) -> &str {
        &self.provider
    }
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Duration;

    use super::*;

    /// Context builder for policy/dispatch unit tests.
    pub(crate) fn ctx(role: Role, sub: SubscriptionState, banned: bool) -> AuthContext {
        let now = Utc::now();
        AuthContext::from_verified(VerifiedClaims {
            user_id: 4242,
            role,
            is_banned: banned,
            subscription_state: sub,
            provider: "internal".into(),
            session_id: "s-test".into(),
            issued_at: now,
            expires_at: now + Duration::minutes(5),
        })
    }
}
