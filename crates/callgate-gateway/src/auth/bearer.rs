//! Bearer credential verification.
//!
//! One `CredentialVerifier` per identity provider. The token header's `kid`
//! is the provider tag that selects the verifier; the verifier then checks
//! the signature with its own key, so an attacker choosing `kid` only picks
//! which key must have signed the token.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use callgate_core::error::{GateError, Result};
use callgate_core::identity::{Role, SubscriptionState};

use super::context::{AuthContext, VerifiedClaims};
use super::revocation::{generation_ok, RevocationSource};
use crate::config::{AuthSection, VerifierConfig};

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Provider tag this verifier answers for.
    fn provider(&self) -> &str;

    /// `None` on any failure: bad signature, expired, not yet valid, revoked.
    async fn verify(&self, token: &str) -> Option<VerifiedClaims>;
}

/// Claims carried by access tokens.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    subscription: SubscriptionState,
    #[serde(default)]
    is_banned: bool,
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    jti: Option<String>,
    #[serde(default, rename = "gen")]
    generation: Option<u64>,
}

/// JWT verifier backed by `jsonwebtoken`.
pub struct JwtVerifier {
    provider: String,
    key: DecodingKey,
    validation: Validation,
    revocations: Option<Arc<dyn RevocationSource>>,
}

impl JwtVerifier {
    pub fn from_config(
        cfg: &VerifierConfig,
        revocations: Option<Arc<dyn RevocationSource>>,
    ) -> Result<Self> {
        let key = decoding_key(cfg)?;

        let mut validation = Validation::new(cfg.algorithm);
        validation.leeway = cfg.leeway_secs;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = &cfg.issuer {
            validation.set_issuer(&[iss.as_str()]);
        }
        match &cfg.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }

        let revocations = if cfg.check_revocation {
            Some(revocations.ok_or_else(|| {
                GateError::BadRequest(format!(
                    "auth.verifiers[{}]: check_revocation needs a revocation source",
                    cfg.provider
                ))
            })?)
        } else {
            None
        };

        Ok(Self {
            provider: cfg.provider.clone(),
            key,
            validation,
            revocations,
        })
    }
}

fn decoding_key(cfg: &VerifierConfig) -> Result<DecodingKey> {
    if cfg.is_hmac() {
        let secret = match (&cfg.secret, &cfg.secret_env) {
            (Some(s), _) => s.clone(),
            (None, Some(var)) => std::env::var(var).map_err(|_| {
                GateError::BadRequest(format!(
                    "auth.verifiers[{}]: env var {var} is not set",
                    cfg.provider
                ))
            })?,
            (None, None) => String::new(),
        };
        if secret.is_empty() {
            return Err(GateError::BadRequest(format!(
                "auth.verifiers[{}]: empty HMAC secret",
                cfg.provider
            )));
        }
        return Ok(DecodingKey::from_secret(secret.as_bytes()));
    }

    let pem = cfg.public_key_pem.as_deref().unwrap_or_default().as_bytes();
    let key = match cfg.algorithm {
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
        _ => DecodingKey::from_rsa_pem(pem),
    };
    key.map_err(|e| {
        GateError::BadRequest(format!(
            "auth.verifiers[{}]: invalid public_key_pem: {e}",
            cfg.provider
        ))
    })
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn verify(&self, token: &str) -> Option<VerifiedClaims> {
        let data = match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(provider = %self.provider, error = %e, "bearer token rejected");
                return None;
            }
        };
        let c = data.claims;

        let Ok(user_id) = c.sub.parse::<u64>() else {
            tracing::debug!(provider = %self.provider, "bearer sub is not a user id");
            return None;
        };

        if let Some(src) = &self.revocations {
            match src.current_generation(user_id).await {
                Ok(current) if generation_ok(c.generation, current) => {}
                Ok(_) => {
                    tracing::debug!(provider = %self.provider, user_id, "bearer token revoked");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(provider = %self.provider, error = %e, "revocation lookup failed");
                    return None;
                }
            }
        }

        let issued_at = DateTime::<Utc>::from_timestamp(c.iat, 0)?;
        let expires_at = DateTime::<Utc>::from_timestamp(c.exp, 0)?;

        Some(VerifiedClaims {
            user_id,
            role: c.role,
            is_banned: c.is_banned,
            subscription_state: c.subscription,
            provider: self.provider.clone(),
            session_id: c.sid.or(c.jti).unwrap_or_default(),
            issued_at,
            expires_at,
        })
    }
}

/// Verifiers keyed by provider tag.
#[derive(Default)]
pub struct VerifierSet {
    by_provider: HashMap<String, Arc<dyn CredentialVerifier>>,
    default_provider: Option<String>,
}

impl VerifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(
        auth: &AuthSection,
        revocations: Option<Arc<dyn RevocationSource>>,
    ) -> Result<Self> {
        let mut set = Self::new();
        for v in &auth.verifiers {
            let verifier = JwtVerifier::from_config(v, revocations.clone())?;
            set = set.with(Arc::new(verifier));
        }
        set.default_provider = auth.default_provider.clone();
        Ok(set)
    }

    pub fn with(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.by_provider.insert(verifier.provider().to_string(), verifier);
        self
    }

    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.by_provider.is_empty()
    }

    /// Pick the verifier by `kid`, else the default provider, else the only one.
    /// Opaque (non-JWT) tokens carry no `kid` and go to the fallback.
    fn select(&self, token: &str) -> Option<&Arc<dyn CredentialVerifier>> {
        let kid = decode_header(token).ok().and_then(|h| h.kid);
        match kid.as_deref().or(self.default_provider.as_deref()) {
            Some(tag) => self.by_provider.get(tag),
            None if self.by_provider.len() == 1 => self.by_provider.values().next(),
            None => None,
        }
    }

    pub async fn verify(&self, token: &str) -> Option<AuthContext> {
        let Some(verifier) = self.select(token) else {
            tracing::debug!("no verifier for bearer token");
            return None;
        };
        verifier.verify(token).await.map(AuthContext::from_verified)
    }
}
