use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::{Map, Value};

use callgate_core::error::{ClientCode, GateError, Result};
use callgate_core::protocol::{ErrorBody, ResponseEnvelope};

use super::args::prepare;
use super::descriptor::{Handler, HandlerDescriptor, Reply};
use crate::auth::AuthContext;

struct Entry {
    descriptor: HandlerDescriptor,
    handler: Arc<dyn Handler>,
}

/// Operation name -> handler. Filled at startup, read-only afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Entry>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its descriptor name. Names must be unique.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> Result<()> {
        let descriptor = handler.descriptor();
        descriptor.validate()?;
        let name = descriptor.name();
        if self.handlers.contains_key(name) {
            return Err(GateError::BadRequest(format!("duplicate operation: {name}")));
        }
        self.handlers.insert(name, Entry { descriptor, handler });
        Ok(())
    }

    pub fn with(mut self, handler: Arc<dyn Handler>) -> Result<Self> {
        self.register(handler)?;
        Ok(self)
    }

    pub fn contains(&self, op: &str) -> bool {
        self.handlers.contains_key(op)
    }

    pub fn descriptor(&self, op: &str) -> Option<&HandlerDescriptor> {
        self.handlers.get(op).map(|e| &e.descriptor)
    }

    pub fn operations(&self) -> Vec<&'static str> {
        let mut ops: Vec<_> = self.handlers.keys().copied().collect();
        ops.sort_unstable();
        ops
    }

    /// Inject context, invoke, and normalize. Never panics.
    pub async fn dispatch(
        &self,
        op: &str,
        arguments: Map<String, Value>,
        ctx: Option<AuthContext>,
    ) -> ResponseEnvelope {
        let Some(entry) = self.handlers.get(op) else {
            return GateError::BadRequest(format!("unknown operation: {op}")).into();
        };

        let args = match prepare(&entry.descriptor, arguments, ctx) {
            Ok(a) => a,
            Err(e) => return e.into(),
        };

        let outcome = AssertUnwindSafe(entry.handler.call(args)).catch_unwind().await;
        match outcome {
            Ok(Ok(Reply::Payload(v))) => ResponseEnvelope::Success(v),
            Ok(Ok(Reply::Rejected { error, code, status })) => {
                ResponseEnvelope::Failure(ErrorBody::custom(code, error, status))
            }
            Ok(Err(e)) => {
                if e.client_code() == ClientCode::Internal {
                    tracing::warn!(op, error = %e, "handler failed");
                }
                e.into()
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                tracing::warn!(op, error = %msg, "handler panicked");
                ResponseEnvelope::error(ClientCode::Internal, msg)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}
