//! Credentials and transaction signing contexts.
//!
//! # Security
//! - Keys are never logged or serialized
//! - A `TransactContext` is an immutable snapshot; replacing the credential
//!   afterwards does not alter transactions already built from it

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::error::{SdkError, SdkResult};

/// A private signing key with its derived address, bound to one chain.
#[derive(Clone)]
pub struct Credential {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Credential {
    /// Parse a hex-encoded private key (with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> SdkResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| SdkError::InvalidKey(format!("{e}")))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Credential loaded"
        );

        Ok(Self { signer, chain_id })
    }

    /// Address derived from the key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Chain ID this credential signs for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Signed-call context handed to state-changing operations.
#[derive(Debug, Clone)]
pub struct TransactContext {
    credential: Arc<Credential>,
}

impl TransactContext {
    pub(crate) fn new(credential: Arc<Credential>) -> Self {
        Self { credential }
    }

    /// Sender address of transactions built from this context.
    pub fn from(&self) -> Address {
        self.credential.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.credential.chain_id()
    }

    /// Wallet for alloy's signing filler.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.credential.signer().clone())
    }
}
