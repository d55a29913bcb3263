use async_trait::async_trait;
use serde_json::json;

use callgate_core::error::Result;

use crate::dispatch::{CallArgs, Handler, HandlerDescriptor, Reply};

/// Echo the verified identity back to the caller.
#[derive(Default)]
pub struct WhoAmIService;

impl WhoAmIService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for WhoAmIService {
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor::new("whoami").accepts_auth()
    }

    async fn call(&self, args: CallArgs) -> Result<Reply> {
        let Some(ctx) = args.auth() else {
            return Ok(Reply::ok(json!({ "authenticated": false })));
        };
        Ok(Reply::ok(json!({
            "authenticated": true,
            "user_id": ctx.user_id(),
            "role": ctx.role(),
            "subscription_state": ctx.subscription_state(),
            "provider": ctx.provider(),
            "expires_at": ctx.expires_at().timestamp(),
        })))
    }
}
