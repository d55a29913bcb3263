//! Built-in operations registered by every gateway.

pub mod ping;
pub mod whoami;

use std::sync::Arc;

use callgate_core::error::Result;

use crate::dispatch::HandlerRegistry;

pub use ping::PingService;
pub use whoami::WhoAmIService;

/// Register `ping` and `whoami`.
pub fn register_builtins(registry: &mut HandlerRegistry) -> Result<()> {
    registry.register(Arc::new(PingService::new()))?;
    registry.register(Arc::new(WhoAmIService::new()))?;
    Ok(())
}
