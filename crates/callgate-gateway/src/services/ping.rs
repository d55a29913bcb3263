use async_trait::async_trait;
use serde_json::json;

use callgate_core::error::Result;

use crate::dispatch::{CallArgs, Handler, HandlerDescriptor, Reply};

/// Public liveness probe through the full dispatch path.
#[derive(Default)]
pub struct PingService;

impl PingService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for PingService {
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor::new("ping").optional("message")
    }

    async fn call(&self, args: CallArgs) -> Result<Reply> {
        let message: Option<String> = args.get("message")?;
        Ok(Reply::ok(json!({ "pong": true, "message": message })))
    }
}
