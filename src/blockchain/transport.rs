//! Transport boundary between the SDK and a chain node.
//!
//! # Responsibilities
//! - Describe the raw capabilities the SDK consumes (call, submit, receipts, logs)
//! - Provide the alloy-backed JSON-RPC implementation with per-request timeouts
//! - Classify node rejections apart from connectivity failures
//!
//! # Design Decisions
//! - Object-safe async trait so custom transports and in-memory chains plug in
//! - No retries at this layer; resubmitting a write without confirmation is unsafe

use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alloy::eips::BlockId;
use alloy::network::{TransactionBuilder, TransactionResponse};
use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};

use crate::blockchain::types::{MinedReceipt, TransportError};
use crate::blockchain::wallet::TransactContext;

/// Live stream of raw logs. Ends when the underlying connection drops.
pub type LogStream = BoxStream<'static, Log>;

/// Raw log selection: one contract, positional topic sets, optional block bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    /// Position 0 is the event selector. An empty set matches any topic.
    pub topics: Vec<Vec<B256>>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl LogFilter {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            topics: Vec::new(),
            from_block: None,
            to_block: None,
        }
    }

    /// Same filter restricted to `[from, to]`.
    pub fn with_blocks(&self, from: u64, to: u64) -> Self {
        Self {
            from_block: Some(from),
            to_block: Some(to),
            ..self.clone()
        }
    }

    /// Whether a log satisfies this filter.
    pub fn matches(&self, log: &Log) -> bool {
        if log.inner.address != self.address {
            return false;
        }

        let topics = log.inner.data.topics();
        for (i, wanted) in self.topics.iter().enumerate() {
            if wanted.is_empty() {
                continue;
            }
            match topics.get(i) {
                Some(topic) if wanted.contains(topic) => {}
                _ => return false,
            }
        }

        if let Some(block) = log.block_number {
            if self.from_block.is_some_and(|from| block < from) {
                return false;
            }
            if self.to_block.is_some_and(|to| block > to) {
                return false;
            }
        }
        true
    }

    /// Convert into an `eth_getLogs` / `eth_subscribe` filter.
    pub fn to_rpc(&self) -> Filter {
        let mut filter = Filter::new().address(self.address);
        if let Some(from) = self.from_block {
            filter = filter.from_block(from);
        }
        if let Some(to) = self.to_block {
            filter = filter.to_block(to);
        }
        for (i, set) in self.topics.iter().enumerate() {
            if set.is_empty() {
                continue;
            }
            let set = set.clone();
            filter = match i {
                0 => filter.event_signature(set),
                1 => filter.topic1(set),
                2 => filter.topic2(set),
                3 => filter.topic3(set),
                _ => filter,
            };
        }
        filter
    }
}

/// Capabilities the SDK needs from a chain node.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Chain ID reported by the node.
    async fn chain_id(&self) -> Result<u64, TransportError>;

    /// Latest block number.
    async fn block_number(&self) -> Result<u64, TransportError>;

    /// Execute a read-only call (`eth_call`), optionally at a historical block.
    async fn call(&self, to: Address, data: Bytes, block: Option<u64>)
        -> Result<Bytes, TransportError>;

    /// Sign with `ctx` and broadcast. Returns once the node accepted the transaction.
    async fn submit(
        &self,
        ctx: &TransactContext,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, TransportError>;

    /// Receipt of a mined transaction, `None` while pending.
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<MinedReceipt>, TransportError>;

    /// Sender recorded by the node for a transaction.
    async fn transaction_sender(&self, tx_hash: TxHash)
        -> Result<Option<Address>, TransportError>;

    /// Historical logs matching `filter`, in node order.
    async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, TransportError>;

    /// Live logs matching `filter` from now on.
    async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogStream, TransportError>;

    /// Release the session. Later requests fail with [`TransportError::Closed`].
    fn close(&self);
}

/// JSON-RPC transport backed by an alloy provider.
pub struct RpcTransport {
    provider: DynProvider,
    endpoint: String,
    timeout: Duration,
    closed: AtomicBool,
}

impl RpcTransport {
    /// Dial an http(s), ws(s) or IPC endpoint.
    pub async fn dial(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let provider = tokio::time::timeout(timeout, ProviderBuilder::new().connect(endpoint))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|e| TransportError::Connection(format!("failed to dial {endpoint}: {e}")))?;

        tracing::debug!(endpoint = %endpoint, "RPC transport dialed");

        Ok(Self {
            provider: provider.erased(),
            endpoint: endpoint.to_string(),
            timeout,
            closed: AtomicBool::new(false),
        })
    }

    /// Underlying provider, for calls the SDK does not wrap.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    async fn request<T, F>(&self, fut: F) -> Result<T, TransportError>
    where
        F: IntoFuture<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }
}

fn classify(err: RpcError<TransportErrorKind>) -> TransportError {
    match err {
        RpcError::ErrorResp(payload) => TransportError::Rejected(payload.to_string()),
        other => TransportError::Connection(other.to_string()),
    }
}

#[async_trait]
impl Transport for RpcTransport {
    async fn chain_id(&self) -> Result<u64, TransportError> {
        self.request(self.provider.get_chain_id()).await
    }

    async fn block_number(&self) -> Result<u64, TransportError> {
        self.request(self.provider.get_block_number()).await
    }

    async fn call(
        &self,
        to: Address,
        data: Bytes,
        block: Option<u64>,
    ) -> Result<Bytes, TransportError> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        let call = self.provider.call(tx);
        match block {
            Some(number) => self.request(call.block(BlockId::number(number))).await,
            None => self.request(call).await,
        }
    }

    async fn submit(
        &self,
        ctx: &TransactContext,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, TransportError> {
        let signing = ProviderBuilder::new()
            .wallet(ctx.wallet())
            .connect_provider(self.provider.clone());

        let tx = TransactionRequest::default()
            .with_from(ctx.from())
            .with_to(to)
            .with_input(data)
            .with_chain_id(ctx.chain_id());

        let pending = self.request(signing.send_transaction(tx)).await?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<MinedReceipt>, TransportError> {
        let receipt = self
            .request(self.provider.get_transaction_receipt(tx_hash))
            .await?;

        Ok(receipt.and_then(|r| {
            r.block_number.map(|block_number| MinedReceipt {
                tx_hash,
                block_number,
                success: r.status(),
            })
        }))
    }

    async fn transaction_sender(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<Address>, TransportError> {
        let tx = self
            .request(self.provider.get_transaction_by_hash(tx_hash))
            .await?;
        Ok(tx.map(|tx| TransactionResponse::from(&tx)))
    }

    async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, TransportError> {
        let filter = filter.to_rpc();
        self.request(self.provider.get_logs(&filter)).await
    }

    async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogStream, TransportError> {
        let filter = filter.to_rpc();
        let subscription = self.request(self.provider.subscribe_logs(&filter)).await?;
        Ok(subscription.into_stream().boxed())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(endpoint = %self.endpoint, "RPC transport closed");
        }
    }
}

impl std::fmt::Debug for RpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcTransport")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
