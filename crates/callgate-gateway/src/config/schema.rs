use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;

use jsonwebtoken::Algorithm;
use serde::Deserialize;

use callgate_core::error::{GateError, Result};
use callgate_core::identity::{Role, SubscriptionState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub auth: AuthSection,

    /// Operation name -> rule. Operations without an entry are public.
    #[serde(default)]
    pub policies: BTreeMap<String, PolicyRuleConfig>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GateError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.auth.validate()?;

        for (op, rule) in &self.policies {
            rule.validate(op)?;
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen.parse::<SocketAddr>().map_err(|_| {
            GateError::BadRequest(format!(
                "gateway.listen must be a valid SocketAddr: {}",
                self.listen
            ))
        })?;
        if !(1024..=8 * 1024 * 1024).contains(&self.max_body_bytes) {
            return Err(GateError::BadRequest(
                "gateway.max_body_bytes must be between 1024 and 8388608".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Provider used for tokens whose header has no `kid`.
    #[serde(default)]
    pub default_provider: Option<String>,

    #[serde(default)]
    pub verifiers: Vec<VerifierConfig>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            session_cookie: default_session_cookie(),
            default_provider: None,
            verifiers: Vec::new(),
        }
    }
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if self.session_cookie.trim().is_empty() {
            return Err(GateError::BadRequest("auth.session_cookie must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for v in &self.verifiers {
            v.validate()?;
            if !seen.insert(v.provider.as_str()) {
                return Err(GateError::BadRequest(format!(
                    "auth.verifiers: duplicate provider: {}",
                    v.provider
                )));
            }
        }

        if let Some(p) = &self.default_provider {
            if !seen.contains(p.as_str()) {
                return Err(GateError::BadRequest(format!(
                    "auth.default_provider refers to unknown verifier: {p}"
                )));
            }
        }
        Ok(())
    }
}

fn default_session_cookie() -> String {
    "sid".into()
}

/// One bearer-credential verifier, keyed by provider tag.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    pub provider: String,

    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,

    /// Inline HMAC secret. Prefer `secret_env` outside of tests.
    #[serde(default)]
    pub secret: Option<String>,

    /// Environment variable holding the HMAC secret.
    #[serde(default)]
    pub secret_env: Option<String>,

    /// PEM public key for RSA/EC/EdDSA algorithms.
    #[serde(default)]
    pub public_key_pem: Option<String>,

    #[serde(default)]
    pub issuer: Option<String>,

    #[serde(default)]
    pub audience: Option<String>,

    #[serde(default)]
    pub leeway_secs: u64,

    /// Compare the token `gen` claim against the revocation source.
    #[serde(default)]
    pub check_revocation: bool,
}

impl VerifierConfig {
    pub fn is_hmac(&self) -> bool {
        matches!(self.algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(GateError::BadRequest("auth.verifiers: provider must not be empty".into()));
        }
        if self.leeway_secs > 300 {
            return Err(GateError::BadRequest(format!(
                "auth.verifiers[{}].leeway_secs must be <= 300",
                self.provider
            )));
        }

        if self.is_hmac() {
            if self.public_key_pem.is_some() {
                return Err(GateError::BadRequest(format!(
                    "auth.verifiers[{}]: public_key_pem is not valid for {:?}",
                    self.provider, self.algorithm
                )));
            }
            match (&self.secret, &self.secret_env) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(GateError::BadRequest(format!(
                        "auth.verifiers[{}]: exactly one of secret/secret_env is required",
                        self.provider
                    )))
                }
            }
        } else if self.public_key_pem.is_none() || self.secret.is_some() || self.secret_env.is_some() {
            return Err(GateError::BadRequest(format!(
                "auth.verifiers[{}]: {:?} requires public_key_pem only",
                self.provider, self.algorithm
            )));
        }
        Ok(())
    }
}

fn default_algorithm() -> Algorithm {
    Algorithm::HS256
}

/// Declarative gate for a single operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRuleConfig {
    #[serde(default)]
    pub requires_auth: bool,

    #[serde(default)]
    pub requires_role: Option<Role>,

    #[serde(default)]
    pub requires_subscription: Option<Vec<SubscriptionState>>,
}

impl PolicyRuleConfig {
    pub fn validate(&self, op: &str) -> Result<()> {
        if op.trim().is_empty() {
            return Err(GateError::BadRequest("policies: operation name must not be empty".into()));
        }
        let gated = self.requires_role.is_some() || self.requires_subscription.is_some();
        if gated && !self.requires_auth {
            return Err(GateError::BadRequest(format!(
                "policies.{op}: requires_role/requires_subscription need requires_auth: true"
            )));
        }
        if matches!(&self.requires_subscription, Some(s) if s.is_empty()) {
            return Err(GateError::BadRequest(format!(
                "policies.{op}.requires_subscription must not be empty"
            )));
        }
        Ok(())
    }
}
