//! Handler contract: descriptor, reply, trait.

use async_trait::async_trait;
use serde_json::Value;

use callgate_core::error::{GateError, Result};

use super::args::CallArgs;

/// Reserved argument name for the verified identity.
pub const AUTH_PARAM: &str = "auth";
/// Conventional argument name for the bare caller id.
pub const USER_ID_PARAM: &str = "user_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub required: bool,
}

/// Declared shape of a handler, fixed at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    name: &'static str,
    params: Vec<Param>,
    accepts_auth: bool,
    accepts_user_id: bool,
}

impl HandlerDescriptor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
            accepts_auth: false,
            accepts_user_id: false,
        }
    }

    pub fn required(mut self, name: &'static str) -> Self {
        self.params.push(Param { name, required: true });
        self
    }

    pub fn optional(mut self, name: &'static str) -> Self {
        self.params.push(Param { name, required: false });
        self
    }

    /// Handler receives the verified context (or `None`).
    pub fn accepts_auth(mut self) -> Self {
        self.accepts_auth = true;
        self
    }

    /// Handler takes `user_id`, filled from the identity when the caller omits it.
    ///
    /// A caller may still send its own `user_id`, and that value is passed
    /// through unchanged. Treat the argument as input, not as proof of
    /// identity: check [`CallArgs::user_id_verified`] or take `auth` instead
    /// before acting on another user's data.
    pub fn accepts_user_id(mut self) -> Self {
        self.accepts_user_id = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn params(&self) -> &[Param] {
        &self.params
    }
    pub fn wants_auth(&self) -> bool {
        self.accepts_auth
    }
    pub fn wants_user_id(&self) -> bool {
        self.accepts_user_id
    }

    /// Whether a caller may pass `name`.
    pub fn declares(&self, name: &str) -> bool {
        (self.accepts_user_id && name == USER_ID_PARAM) || self.params.iter().any(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().filter(|p| p.required).map(|p| p.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GateError::BadRequest("handler name must not be empty".into()));
        }
        for (i, p) in self.params.iter().enumerate() {
            if p.name == AUTH_PARAM {
                return Err(GateError::BadRequest(format!(
                    "{}: `{AUTH_PARAM}` is reserved; use accepts_auth()",
                    self.name
                )));
            }
            if self.params[..i].iter().any(|q| q.name == p.name) {
                return Err(GateError::BadRequest(format!(
                    "{}: duplicate param {}",
                    self.name, p.name
                )));
            }
        }
        Ok(())
    }
}

/// What a handler hands back on a normal return.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Success payload, returned verbatim.
    Payload(Value),
    /// Handler-level rejection. Status defaults to 400.
    Rejected {
        error: String,
        code: String,
        status: Option<u16>,
    },
}

impl Reply {
    pub fn ok(payload: Value) -> Self {
        Reply::Payload(payload)
    }

    pub fn reject(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Reply::Rejected {
            error: msg.into(),
            code: code.into(),
            status: None,
        }
    }

    /// Set the status of a rejection. No effect on payloads.
    pub fn with_status(self, status: u16) -> Self {
        match self {
            Reply::Rejected { error, code, .. } => Reply::Rejected {
                error,
                code,
                status: Some(status),
            },
            other => other,
        }
    }
}

/// Business handler bound to one operation.
///
/// `Err` is mapped to the error's client code; a panic becomes `INTERNAL`.
#[async_trait]
pub trait Handler: Send + Sync {
    fn descriptor(&self) -> HandlerDescriptor;
    async fn call(&self, args: CallArgs) -> Result<Reply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_params_and_user_id() {
        let d = HandlerDescriptor::new("viewCart").optional("page").accepts_user_id();
        assert!(d.declares("page"));
        assert!(d.declares(USER_ID_PARAM));
        assert!(!d.declares("role"));
        assert!(!d.declares(AUTH_PARAM));

        let d = HandlerDescriptor::new("getEntry").required("entry_id");
        assert!(!d.declares(USER_ID_PARAM));
        assert_eq!(d.required_params().collect::<Vec<_>>(), vec!["entry_id"]);
    }

    #[test]
    fn validate_rejects_reserved_and_duplicates() {
        assert!(HandlerDescriptor::new("x").required(AUTH_PARAM).validate().is_err());
        assert!(HandlerDescriptor::new("x").required("a").optional("a").validate().is_err());
        assert!(HandlerDescriptor::new("").validate().is_err());
        assert!(HandlerDescriptor::new("x").required("a").accepts_auth().validate().is_ok());
    }

    #[test]
    fn with_status_only_touches_rejections() {
        let r = Reply::reject("NOT_FOUND", "no such entry").with_status(404);
        assert_eq!(
            r,
            Reply::Rejected {
                error: "no such entry".into(),
                code: "NOT_FOUND".into(),
                status: Some(404)
            }
        );
        let p = Reply::ok(Value::Bool(true)).with_status(404);
        assert_eq!(p, Reply::Payload(Value::Bool(true)));
    }
}
