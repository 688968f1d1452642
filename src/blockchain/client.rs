//! Chain connection: transport session plus replaceable signing credential.
//!
//! # Responsibilities
//! - Dial the JSON-RPC endpoint and verify the chain it serves
//! - Hold the credential and hand out read/transact contexts
//! - Release the shared transport session exactly once

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use arc_swap::ArcSwapOption;

use crate::blockchain::transport::{RpcTransport, Transport};
use crate::blockchain::types::{ChainId, ConfirmationPolicy};
use crate::blockchain::wallet::{Credential, TransactContext};
use crate::error::{SdkError, SdkResult};

/// Shared handle to a chain node. Cheap to clone; clones share the session and credential.
#[derive(Clone)]
pub struct ChainConnection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    transport: Arc<dyn Transport>,
    chain_id: u64,
    policy: ConfirmationPolicy,
    credential: ArcSwapOption<Credential>,
}

impl ChainConnection {
    /// Dial `endpoint` and check that it answers.
    ///
    /// Fails when the node cannot be reached. A chain ID mismatch is only
    /// logged; call [`verify_chain_id`](Self::verify_chain_id) to enforce it.
    pub async fn connect(
        endpoint: &str,
        chain_id: u64,
        rpc_timeout: Duration,
        policy: ConfirmationPolicy,
    ) -> SdkResult<Self> {
        let transport = RpcTransport::dial(endpoint, rpc_timeout)
            .await
            .map_err(|e| SdkError::Connection(e.to_string()))?;
        let connection = Self::with_transport(Arc::new(transport), chain_id, policy);

        match connection.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    endpoint = %endpoint,
                    chain_id = chain_id,
                    "Chain connection established"
                );
            }
            Err(e @ SdkError::Connection(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Chain connection established but chain verification failed"
                );
            }
        }

        Ok(connection)
    }

    /// Build a connection over an existing transport.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        chain_id: u64,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                transport,
                chain_id,
                policy,
                credential: ArcSwapOption::empty(),
            }),
        }
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> SdkResult<()> {
        let actual = self.remote_chain_id().await?;
        if actual.0 != self.inner.chain_id {
            return Err(SdkError::ChainMismatch {
                expected: self.inner.chain_id,
                actual: actual.0,
            });
        }
        Ok(())
    }

    /// Chain ID reported by the node.
    pub async fn remote_chain_id(&self) -> SdkResult<ChainId> {
        Ok(ChainId(self.inner.transport.chain_id().await?))
    }

    /// Configured chain ID.
    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id
    }

    /// Latest block number.
    pub async fn block_number(&self) -> SdkResult<u64> {
        Ok(self.inner.transport.block_number().await?)
    }

    /// Parse and install a signing key. Replaces any previous credential.
    ///
    /// Contexts obtained before the swap keep signing with the old key.
    pub fn set_credential(
        &self,
        private_key_hex: &str,
        chain_id: Option<u64>,
    ) -> SdkResult<Arc<Credential>> {
        let credential = Arc::new(Credential::from_private_key(
            private_key_hex,
            chain_id.unwrap_or(self.inner.chain_id),
        )?);
        let previous = self.inner.credential.swap(Some(credential.clone()));

        if let Some(previous) = previous {
            tracing::info!(
                previous = %previous.address(),
                current = %credential.address(),
                "Credential replaced"
            );
        }
        Ok(credential)
    }

    /// Drop the credential; write paths fail until a new one is set.
    pub fn clear_credential(&self) {
        if self.inner.credential.swap(None).is_some() {
            tracing::info!("Credential cleared");
        }
    }

    /// Current credential, if any.
    pub fn credential(&self) -> Option<Arc<Credential>> {
        self.inner.credential.load_full()
    }

    /// Snapshot of the credential for signing.
    pub fn transact_options(&self) -> SdkResult<TransactContext> {
        self.credential()
            .map(TransactContext::new)
            .ok_or(SdkError::Unauthenticated)
    }

    /// Address of the current credential, zero when unauthenticated.
    pub fn address(&self) -> Address {
        self.credential()
            .map(|c| c.address())
            .unwrap_or(Address::ZERO)
    }

    /// Sender the node recorded for `tx_hash`.
    pub async fn transaction_sender(&self, tx_hash: TxHash) -> SdkResult<Option<Address>> {
        Ok(self.inner.transport.transaction_sender(tx_hash).await?)
    }

    /// Mining wait policy applied by the SDK's own waits.
    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        self.inner.policy
    }

    /// Shared transport session.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.inner.transport.clone()
    }

    /// Release the transport session shared by every facade built on this connection.
    pub fn close(self) {
        self.inner.transport.close();
    }
}

impl std::fmt::Debug for ChainConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnection")
            .field("chain_id", &self.inner.chain_id)
            .field("address", &self.address())
            .field("policy", &self.inner.policy)
            .finish()
    }
}
