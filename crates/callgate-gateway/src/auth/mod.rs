//! Identity layer: bearer verifiers, session lookup, revocation generations.
//!
//! The resolver is the only producer of [`AuthContext`]; nothing in the
//! request body can influence it.

pub mod bearer;
pub mod context;
pub mod resolver;
pub mod revocation;
pub mod session;

pub use bearer::{CredentialVerifier, JwtVerifier, VerifierSet};
pub use context::{AuthContext, IdentitySource, VerifiedClaims};
pub use resolver::{bearer_token, AuthResolver};
pub use revocation::{MemoryRevocations, RevocationSource};
pub use session::{MemorySessionStore, SessionRecord, SessionStore};
