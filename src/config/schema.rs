//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the SDK.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Root configuration for an SDK client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SdkConfig {
    /// JSON-RPC endpoint (http, ws or IPC path).
    pub endpoint: String,

    /// Chain ID used for EIP-155 signing (e.g. 1337 for a local dev chain).
    pub chain_id: u64,

    /// Address of the token contract.
    pub token_address: Address,

    /// Address of the stake wallet contract. Stake operations are unavailable without it.
    pub stake_address: Option<Address>,

    /// Signing key. Never serialized; usually supplied through the environment.
    #[serde(skip_serializing)]
    pub private_key: Option<PrivateKey>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Mining wait settings.
    pub confirmation: ConfirmationConfig,

    /// Historical and live log settings.
    pub logs: LogConfig,

    /// Contract interface files.
    pub abi: AbiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8545".to_string(),
            chain_id: 1337,
            token_address: Address::ZERO,
            stake_address: None,
            private_key: None,
            rpc_timeout_secs: 10,
            confirmation: ConfirmationConfig::default(),
            logs: LogConfig::default(),
            abi: AbiConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Hex-encoded private key. Redacted in `Debug` output.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Transaction mining wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Maximum time to wait for a transaction to be mined, in seconds.
    pub timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Extra blocks required on top of the inclusion block.
    pub confirmation_blocks: u32,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            poll_interval_ms: 1000,
            confirmation_blocks: 0,
        }
    }
}

/// Log retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Blocks fetched per `eth_getLogs` request.
    pub chunk_size: u64,

    /// Decoded events buffered per live subscription.
    pub subscription_buffer: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5_000,
            subscription_buffer: 256,
        }
    }
}

/// Paths to JSON ABI files. Bundled interfaces are used when unset.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AbiConfig {
    pub token_path: Option<PathBuf>,
    pub stake_path: Option<PathBuf>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
