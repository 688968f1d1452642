//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, chunk sizes > 0)
//! - Check contract addresses are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SdkConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted by the client

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::SdkConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoint is empty")]
    EmptyEndpoint,

    #[error("endpoint '{0}' is not a valid URL or IPC path")]
    InvalidEndpoint(String),

    #[error("token_address must not be the zero address")]
    ZeroTokenAddress,

    #[error("stake_address must differ from token_address")]
    StakeAddressIsToken,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &SdkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let endpoint = config.endpoint.trim();
    if endpoint.is_empty() {
        errors.push(ValidationError::EmptyEndpoint);
    } else if !is_ipc_path(endpoint) && url::Url::parse(endpoint).is_err() {
        errors.push(ValidationError::InvalidEndpoint(config.endpoint.clone()));
    }

    if config.token_address == Address::ZERO {
        errors.push(ValidationError::ZeroTokenAddress);
    }
    if config.stake_address == Some(config.token_address) {
        errors.push(ValidationError::StakeAddressIsToken);
    }

    if config.chain_id == 0 {
        errors.push(ValidationError::ZeroValue("chain_id"));
    }
    if config.rpc_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("rpc_timeout_secs"));
    }
    if config.confirmation.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("confirmation.timeout_secs"));
    }
    if config.confirmation.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroValue("confirmation.poll_interval_ms"));
    }
    if config.logs.chunk_size == 0 {
        errors.push(ValidationError::ZeroValue("logs.chunk_size"));
    }
    if config.logs.subscription_buffer == 0 {
        errors.push(ValidationError::ZeroValue("logs.subscription_buffer"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_ipc_path(endpoint: &str) -> bool {
    endpoint.ends_with(".ipc")
}
