//! Shared error type across callgate crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCode {
    /// Malformed envelope, unknown operation, bad arguments.
    BadRequest,
    /// No verified identity where one is required.
    Unauthorized,
    /// Generic denial raised by a handler.
    Forbidden,
    /// Identity is banned.
    Banned,
    /// Operation is restricted to admins.
    AdminOnly,
    /// Operation is restricted to a non-admin role.
    RoleRequired,
    /// Operation needs an active or trialing subscription.
    SubscriptionRequired,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Unauthorized => "UNAUTHORIZED",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::Banned => "BANNED",
            ClientCode::AdminOnly => "ADMIN_ONLY",
            ClientCode::RoleRequired => "ROLE_REQUIRED",
            ClientCode::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP-style status carried in the response envelope.
    pub fn status(self) -> u16 {
        match self {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => 400,
            ClientCode::Unauthorized => 401,
            ClientCode::Forbidden
            | ClientCode::Banned
            | ClientCode::AdminOnly
            | ClientCode::RoleRequired
            | ClientCode::SubscriptionRequired => 403,
            ClientCode::Internal => 500,
        }
    }

    /// True for the 403 family.
    pub fn is_forbidden(self) -> bool {
        self.status() == 403
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl GateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GateError::BadRequest(_) => ClientCode::BadRequest,
            GateError::Unauthorized => ClientCode::Unauthorized,
            GateError::Forbidden(_) => ClientCode::Forbidden,
            GateError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            GateError::Internal(_) => ClientCode::Internal,
        }
    }

    pub fn status(&self) -> u16 {
        self.client_code().status()
    }

    /// Short human string for the `error` field. Never includes the variant prefix.
    pub fn client_message(&self) -> String {
        match self {
            GateError::BadRequest(m) | GateError::Forbidden(m) | GateError::Internal(m) => {
                m.clone()
            }
            GateError::Unauthorized => "unauthorized".into(),
            GateError::UnsupportedVersion => "unsupported version".into(),
        }
    }
}
