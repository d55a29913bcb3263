//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use callgate_core::error::{GateError, Result};

pub use schema::{AuthSection, GatewayConfig, GatewaySection, PolicyRuleConfig, VerifierConfig};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CALLGATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "callgate.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GateError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| GateError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Path from `CALLGATE_CONFIG`, or `callgate.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
