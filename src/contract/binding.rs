//! Generic contract binding.
//!
//! # Responsibilities
//! - Encode typed arguments and decode typed results for any schema
//! - Submit state-changing calls under a signing context
//! - Expose historical and live logs as decoded event records
//!
//! # Design Decisions
//! - Read, write and subscribe live on one type; facades pick what they need
//! - Return values are decoded strictly, never coerced into another type

use std::sync::Arc;

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Event, Function};
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::Log;

use crate::blockchain::client::ChainConnection;
use crate::blockchain::transaction::PendingTransaction;
use crate::blockchain::transport::{LogFilter, Transport};
use crate::blockchain::types::BlockRange;
use crate::blockchain::wallet::TransactContext;
use crate::config::schema::LogConfig;
use crate::contract::events::{decode_log, CallFilter, EventRecord};
use crate::contract::logs::{LogDecoder, LogQuery};
use crate::contract::schema::ContractSchema;
use crate::contract::subscription::LogSubscription;
use crate::contract::value::FromSolValue;
use crate::error::{SdkError, SdkResult};
use crate::observability::metrics;

/// A contract at one address, described by a [`ContractSchema`].
#[derive(Clone)]
pub struct ContractBinding {
    address: Address,
    schema: Arc<ContractSchema>,
    connection: ChainConnection,
    log_chunk_size: u64,
    subscription_buffer: usize,
}

impl ContractBinding {
    pub fn new(address: Address, schema: Arc<ContractSchema>, connection: ChainConnection) -> Self {
        let defaults = LogConfig::default();
        Self {
            address,
            schema,
            connection,
            log_chunk_size: defaults.chunk_size,
            subscription_buffer: defaults.subscription_buffer,
        }
    }

    /// Override log chunking and subscription buffering.
    pub fn with_log_config(mut self, config: &LogConfig) -> Self {
        self.log_chunk_size = config.chunk_size.max(1);
        self.subscription_buffer = config.subscription_buffer.max(1);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn schema(&self) -> &ContractSchema {
        &self.schema
    }

    pub fn connection(&self) -> &ChainConnection {
        &self.connection
    }

    fn transport(&self) -> Arc<dyn Transport> {
        self.connection.transport()
    }

    /// ABI-encode a call, selector included.
    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> SdkResult<Bytes> {
        let function = self.schema.function(method)?;
        encode(function, args)
    }

    /// Decode call data produced for `method`. The selector must match.
    pub fn decode_call(&self, method: &str, data: &[u8]) -> SdkResult<Vec<DynSolValue>> {
        let function = self.schema.function(method)?;
        let selector = function.selector();

        match data.get(..4) {
            Some(prefix) if prefix == selector.as_slice() => {}
            _ => {
                return Err(SdkError::decode(
                    method,
                    format!("call data does not start with selector {selector}"),
                ));
            }
        }

        function
            .abi_decode_input(&data[4..])
            .map_err(|e| SdkError::decode(method, e))
    }

    /// Read-only call against the latest state.
    pub async fn call(&self, method: &str, args: &[DynSolValue]) -> SdkResult<Vec<DynSolValue>> {
        self.call_inner(method, args, None).await
    }

    /// Read-only call against the state at `block`.
    pub async fn call_at(
        &self,
        block: u64,
        method: &str,
        args: &[DynSolValue],
    ) -> SdkResult<Vec<DynSolValue>> {
        self.call_inner(method, args, Some(block)).await
    }

    /// Read-only call returning its first output as `T`.
    pub async fn call_one<T: FromSolValue>(
        &self,
        method: &str,
        args: &[DynSolValue],
    ) -> SdkResult<T> {
        let value = self
            .call(method, args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SdkError::decode(method, "call returned no values"))?;
        T::from_sol_value(value).map_err(|reason| SdkError::decode(method, reason))
    }

    async fn call_inner(
        &self,
        method: &str,
        args: &[DynSolValue],
        block: Option<u64>,
    ) -> SdkResult<Vec<DynSolValue>> {
        let function = self.schema.function(method)?;
        let data = encode(function, args)?;

        let result = self.transport().call(self.address, data, block).await;
        metrics::record_call(method, result.is_ok());

        let output = result.map_err(|e| {
            tracing::debug!(
                contract = %self.schema.name(),
                method = %method,
                error = %e,
                "Contract call failed"
            );
            e.into_call_error(method)
        })?;

        function
            .abi_decode_output(&output)
            .map_err(|e| SdkError::decode(method, e))
    }

    /// Sign and submit a state-changing call. Returns once the node accepted it.
    pub async fn transact(
        &self,
        ctx: &TransactContext,
        method: &str,
        args: &[DynSolValue],
    ) -> SdkResult<PendingTransaction> {
        let data = self.encode_call(method, args)?;
        let transport = self.transport();

        let tx_hash = transport
            .submit(ctx, self.address, data)
            .await
            .map_err(|e| {
                tracing::warn!(
                    contract = %self.schema.name(),
                    method = %method,
                    from = %ctx.from(),
                    error = %e,
                    "Transaction submission failed"
                );
                e.into_transact_error(method)
            })?;

        metrics::record_transaction_submitted(method);
        tracing::info!(
            contract = %self.schema.name(),
            method = %method,
            from = %ctx.from(),
            tx_hash = %tx_hash,
            "Transaction submitted"
        );

        Ok(PendingTransaction::new(tx_hash, method, ctx.from(), transport))
    }

    /// Historical `event` logs in `range`. Nothing is fetched until iterated.
    pub fn query_logs(
        &self,
        event: &str,
        filter: &CallFilter,
        range: BlockRange,
    ) -> SdkResult<LogQuery> {
        let (log_filter, decoder) = self.log_source(event, filter)?;
        Ok(LogQuery::new(
            self.transport(),
            log_filter,
            range,
            self.log_chunk_size,
            event,
            decoder,
        ))
    }

    /// Live `event` logs from now on.
    pub async fn subscribe_logs(
        &self,
        event: &str,
        filter: &CallFilter,
    ) -> SdkResult<LogSubscription> {
        self.subscribe_map(event, filter, Ok).await
    }

    /// Live `event` logs converted by `f`. An error from `f` ends the subscription.
    pub async fn subscribe_map<T, F>(
        &self,
        event: &str,
        filter: &CallFilter,
        f: F,
    ) -> SdkResult<LogSubscription<T>>
    where
        T: Send + 'static,
        F: Fn(EventRecord) -> SdkResult<T> + Send + Sync + 'static,
    {
        let (log_filter, decoder) = self.log_source(event, filter)?;
        let logs = self
            .transport()
            .subscribe_logs(&log_filter)
            .await
            .map_err(|e| SdkError::Subscription(format!("cannot subscribe to {event}: {e}")))?;

        let decoder: LogDecoder<T> = Arc::new(move |log: &Log| decoder(log).and_then(&f));
        Ok(LogSubscription::spawn(
            logs,
            decoder,
            self.subscription_buffer,
            event,
        ))
    }

    fn log_source(
        &self,
        event: &str,
        filter: &CallFilter,
    ) -> SdkResult<(LogFilter, LogDecoder<EventRecord>)> {
        let abi_event: Event = self.schema.event(event)?.clone();
        let mut log_filter = LogFilter::new(self.address);
        log_filter.topics = filter.topics(&abi_event)?;

        let address = self.address;
        let decoder: LogDecoder<EventRecord> =
            Arc::new(move |log: &Log| decode_log(&abi_event, address, log));
        Ok((log_filter, decoder))
    }
}

impl std::fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractBinding")
            .field("contract", &self.schema.name())
            .field("address", &self.address)
            .finish()
    }
}

fn encode(function: &Function, args: &[DynSolValue]) -> SdkResult<Bytes> {
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| SdkError::Abi(format!("{}: {e}", function.name)))
}
