//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{PrivateKey, SdkConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PARITY_SDK_PRIVATE_KEY";

/// Environment variable overriding the RPC endpoint.
pub const RPC_URL_ENV_VAR: &str = "PARITY_SDK_RPC_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides and validate a TOML configuration.
pub fn load_config(path: &Path) -> Result<SdkConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: SdkConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        path = %path.display(),
        endpoint = %config.endpoint,
        chain_id = config.chain_id,
        "Configuration loaded"
    );

    Ok(config)
}

/// Overlay values from the environment. `lookup` is injectable for tests.
pub fn apply_env_overrides<F>(config: &mut SdkConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(RPC_URL_ENV_VAR).filter(|v| !v.is_empty()) {
        config.endpoint = endpoint;
    }
    if let Some(key) = lookup(PRIVATE_KEY_ENV_VAR).filter(|v| !v.is_empty()) {
        config.private_key = Some(PrivateKey::new(key));
    }
}
