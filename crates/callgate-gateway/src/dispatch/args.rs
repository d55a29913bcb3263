//! Call arguments and context injection.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use callgate_core::error::{GateError, Result};

use super::descriptor::{HandlerDescriptor, AUTH_PARAM, USER_ID_PARAM};
use crate::auth::AuthContext;

/// Arguments handed to a handler after injection and validation.
#[derive(Debug, Clone)]
pub struct CallArgs {
    values: Map<String, Value>,
    auth: Option<AuthContext>,
    user_id_verified: bool,
}

impl CallArgs {
    /// Verified identity. Always `None` for handlers that did not ask for it.
    pub fn auth(&self) -> Option<&AuthContext> {
        self.auth.as_ref()
    }

    /// `user_id` is present and equals the resolved identity. False when the
    /// caller supplied a different id or nobody is signed in.
    pub fn user_id_verified(&self) -> bool {
        self.user_id_verified
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Typed optional argument. Missing and `null` both read as `None`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| GateError::BadRequest(format!("invalid argument {name}: {e}"))),
        }
    }

    pub fn require<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.get(name)?
            .ok_or_else(|| GateError::BadRequest(format!("missing argument: {name}")))
    }
}

/// Build the handler's arguments from the caller's, injecting context.
///
/// The `auth` key belongs to the dispatcher: whatever the caller sent under
/// that name is discarded (or rejected for handlers that never take it).
pub(crate) fn prepare(
    desc: &HandlerDescriptor,
    mut values: Map<String, Value>,
    ctx: Option<AuthContext>,
) -> Result<CallArgs> {
    if values.remove(AUTH_PARAM).is_some() {
        if !desc.wants_auth() {
            return Err(GateError::BadRequest(format!("unexpected argument: {AUTH_PARAM}")));
        }
        tracing::debug!(op = desc.name(), "caller-supplied auth argument discarded");
    }

    let mut user_id_verified = false;
    if desc.wants_user_id() {
        if let Some(c) = &ctx {
            let verified = Value::from(c.user_id());
            match values.get(USER_ID_PARAM) {
                None => {
                    values.insert(USER_ID_PARAM.to_string(), verified);
                    user_id_verified = true;
                }
                Some(v) if *v == verified => user_id_verified = true,
                Some(_) => tracing::debug!(
                    op = desc.name(),
                    user_id = c.user_id(),
                    "caller-supplied user_id differs from resolved identity"
                ),
            }
        }
    }

    if let Some(unknown) = values.keys().find(|k| !desc.declares(k)) {
        return Err(GateError::BadRequest(format!("unexpected argument: {unknown}")));
    }

    if let Some(missing) = desc.required_params().find(|p| !values.contains_key(*p)) {
        return Err(GateError::BadRequest(format!("missing argument: {missing}")));
    }

    Ok(CallArgs {
        values,
        auth: if desc.wants_auth() { ctx } else { None },
        user_id_verified,
    })
}
