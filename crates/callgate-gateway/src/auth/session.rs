//! Session store contract plus an in-memory implementation.
//!
//! Production deployments back `SessionStore` with their database or cache;
//! the gateway only ever reads through `lookup_session`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize;

use callgate_core::error::Result;
use callgate_core::identity::{Role, SubscriptionState};

use super::context::{AuthContext, VerifiedClaims};

/// Stored session as returned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionRecord {
    pub user_id: u64,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription_state: SubscriptionState,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub provider: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub revoked: bool,
}

impl SessionRecord {
    /// Live = not revoked and `now` not past `expires_at`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now <= self.expires_at
    }

    /// Map a live record into a context. `None` when the record is dead.
    pub(crate) fn into_context(self, sid: &str, now: DateTime<Utc>) -> Option<AuthContext> {
        if !self.is_live_at(now) {
            return None;
        }
        Some(AuthContext::from_verified(VerifiedClaims {
            user_id: self.user_id,
            role: self.role,
            is_banned: self.is_banned,
            subscription_state: self.subscription_state,
            provider: self.provider,
            session_id: sid.to_string(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }))
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when the session id is unknown.
    async fn lookup_session(&self, sid: &str) -> Result<Option<SessionRecord>>;
}

/// DashMap-backed store for development and tests.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sid: impl Into<String>, record: SessionRecord) {
        self.sessions.insert(sid.into(), record);
    }

    /// Mark a session revoked. Returns false if unknown.
    pub fn revoke(&self, sid: &str) -> bool {
        match self.sessions.get_mut(sid) {
            Some(mut r) => {
                r.revoked = true;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn lookup_session(&self, sid: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.get(sid).map(|r| r.value().clone()))
    }
}
