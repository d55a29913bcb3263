//! Shared fixtures: a gateway with a few gated operations, token minting,
//! and a seeded session store.
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use callgate_core::error::Result;
use callgate_core::identity::{Role, SubscriptionState};
use callgate_core::protocol::{Cookies, Headers};
use callgate_gateway::app_state::{AppState, Backends};
use callgate_gateway::auth::{MemoryRevocations, MemorySessionStore, SessionRecord, SessionStore};
use callgate_gateway::config;
use callgate_gateway::dispatch::{CallArgs, Handler, HandlerDescriptor, HandlerRegistry, Reply};
use callgate_gateway::services;

pub const SECRET: &str = "integration-test-secret";
pub const LIVE_SID: &str = "sess-live";
pub const DEAD_SID: &str = "sess-revoked";
pub const SESSION_USER: u64 = 3001;

pub const CONFIG: &str = r#"
version: 1
gateway:
  listen: "127.0.0.1:0"
  max_body_bytes: 4096
auth:
  session_cookie: sid
  default_provider: internal
  verifiers:
    - provider: internal
      secret: integration-test-secret
policies:
  admin_stats: { requires_auth: true, requires_role: admin }
  premium: { requires_auth: true, requires_subscription: [active, trialing] }
  profile: { requires_auth: true }
"#;

/// Admin-only operation that counts invocations.
pub struct AdminStats {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for AdminStats {
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor::new("admin_stats").accepts_auth()
    }

    async fn call(&self, _args: CallArgs) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::ok(json!({ "users": 12, "revenue": [1, 2, 3], "note": null })))
    }
}

struct Premium;

#[async_trait]
impl Handler for Premium {
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor::new("premium")
    }

    async fn call(&self, _args: CallArgs) -> Result<Reply> {
        Ok(Reply::ok(json!({ "content": "members only" })))
    }
}

/// Legacy-shaped handler: takes a bare `user_id`.
struct Profile;

#[async_trait]
impl Handler for Profile {
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor::new("profile").accepts_user_id().optional("fields")
    }

    async fn call(&self, args: CallArgs) -> Result<Reply> {
        let user_id: u64 = args.require("user_id")?;
        Ok(Reply::ok(json!({ "user_id": user_id, "verified": args.user_id_verified() })))
    }
}

struct Explode;

#[async_trait]
impl Handler for Explode {
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor::new("explode")
    }

    async fn call(&self, _args: CallArgs) -> Result<Reply> {
        panic!("boom");
    }
}

struct Quota;

#[async_trait]
impl Handler for Quota {
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor::new("quota").required("amount")
    }

    async fn call(&self, args: CallArgs) -> Result<Reply> {
        let amount: u64 = args.require("amount")?;
        if amount > 10 {
            return Ok(Reply::reject("QUOTA_EXCEEDED", "over quota").with_status(429));
        }
        Ok(Reply::ok(json!({ "granted": amount, "status": 201 })))
    }
}

pub struct Harness {
    pub state: AppState,
    pub admin_calls: Arc<AtomicUsize>,
    pub sessions: Arc<MemorySessionStore>,
}

pub fn harness() -> Harness {
    let cfg = config::load_from_str(CONFIG).expect("config");
    let admin_calls = Arc::new(AtomicUsize::new(0));

    let mut registry = HandlerRegistry::new();
    services::register_builtins(&mut registry).unwrap();
    registry
        .register(Arc::new(AdminStats {
            calls: Arc::clone(&admin_calls),
        }))
        .unwrap();
    registry.register(Arc::new(Premium)).unwrap();
    registry.register(Arc::new(Profile)).unwrap();
    registry.register(Arc::new(Explode)).unwrap();
    registry.register(Arc::new(Quota)).unwrap();

    let sessions = Arc::new(MemorySessionStore::new());
    let now = Utc::now();
    let record = SessionRecord {
        user_id: SESSION_USER,
        role: Role::User,
        subscription_state: SubscriptionState::Active,
        is_banned: false,
        provider: "cookie".into(),
        issued_at: now - Duration::minutes(1),
        expires_at: now + Duration::hours(1),
        revoked: false,
    };
    sessions.insert(LIVE_SID, record.clone());
    sessions.insert(
        DEAD_SID,
        SessionRecord {
            revoked: true,
            ..record
        },
    );

    let backends = Backends {
        sessions: Some(Arc::clone(&sessions) as Arc<dyn SessionStore>),
        revocations: Some(Arc::new(MemoryRevocations::new())),
    };
    let state = AppState::new(cfg, registry, backends).expect("state");

    Harness {
        state,
        admin_calls,
        sessions,
    }
}

pub struct TokenClaims<'a> {
    pub user_id: u64,
    pub role: &'a str,
    pub subscription: &'a str,
    pub banned: bool,
}

impl Default for TokenClaims<'_> {
    fn default() -> Self {
        Self {
            user_id: 42,
            role: "user",
            subscription: "none",
            banned: false,
        }
    }
}

pub fn token(c: TokenClaims<'_>) -> String {
    token_signed_with(c, SECRET)
}

pub fn token_signed_with(c: TokenClaims<'_>, secret: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": c.user_id.to_string(),
        "iat": now.timestamp(),
        "exp": (now + Duration::minutes(10)).timestamp(),
        "role": c.role,
        "subscription": c.subscription,
        "is_banned": c.banned,
    });
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("internal".into());
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("mint")
}

pub fn bearer(token: &str) -> Headers {
    HashMap::from([("authorization".to_string(), format!("Bearer {token}"))])
}

pub fn cookie(sid: &str) -> Cookies {
    HashMap::from([("sid".to_string(), sid.to_string())])
}

/// Dispatch and return `(status, wire body)`.
pub async fn call(h: &Harness, body: &str, headers: &Headers, cookies: &Cookies) -> (u16, Value) {
    h.state
        .dispatcher()
        .handle(body, headers, cookies)
        .await
        .into_wire()
}
