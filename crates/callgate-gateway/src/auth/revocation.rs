//! Revocation generations.
//!
//! Each user has a monotonically increasing generation. Bumping it (logout
//! everywhere, ban, password change) invalidates every bearer token minted
//! with an older `gen` claim, without any token blacklist.

use async_trait::async_trait;
use dashmap::DashMap;

use callgate_core::error::Result;

#[async_trait]
pub trait RevocationSource: Send + Sync {
    /// `Ok(None)` when the user has never been revoked.
    async fn current_generation(&self, user_id: u64) -> Result<Option<u64>>;
}

#[derive(Default)]
pub struct MemoryRevocations {
    generations: DashMap<u64, u64>,
}

impl MemoryRevocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the user's generation.
    pub fn bump(&self, user_id: u64) -> u64 {
        let mut g = self.generations.entry(user_id).or_insert(0);
        *g += 1;
        *g
    }
}

#[async_trait]
impl RevocationSource for MemoryRevocations {
    async fn current_generation(&self, user_id: u64) -> Result<Option<u64>> {
        Ok(self.generations.get(&user_id).map(|g| *g))
    }
}

/// True when a token minted at `token_gen` is still valid.
pub fn generation_ok(token_gen: Option<u64>, current: Option<u64>) -> bool {
    match current {
        None => true,
        Some(cur) => token_gen.is_some_and(|g| g >= cur),
    }
}
