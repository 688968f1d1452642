//! Historical log retrieval.
//!
//! # Design Decisions
//! - Lazy: nothing is fetched until the first `next()`
//! - Chunked by block range so large histories stay within node limits
//! - Strict: the first undecodable log ends the sequence with an error
//! - Restartable: every `iter()` starts again from the range's first block

use std::collections::VecDeque;
use std::sync::Arc;

use alloy::rpc::types::Log;
use futures_util::stream::{self, Stream};

use crate::blockchain::transport::{LogFilter, Transport};
use crate::blockchain::types::{BlockRange, BlockTag};
use crate::contract::events::EventRecord;
use crate::error::{SdkError, SdkResult};
use crate::observability::metrics;

/// Turns a raw log into an item of the sequence.
pub(crate) type LogDecoder<T> = Arc<dyn Fn(&Log) -> SdkResult<T> + Send + Sync>;

/// A finite, restartable sequence of decoded logs.
///
/// Chunks are fetched in ascending block order; logs within a chunk keep the
/// order the transport returned them in.
pub struct LogQuery<T = EventRecord> {
    transport: Arc<dyn Transport>,
    filter: LogFilter,
    range: BlockRange,
    chunk_size: u64,
    event: String,
    decoder: LogDecoder<T>,
}

impl<T> Clone for LogQuery<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            filter: self.filter.clone(),
            range: self.range,
            chunk_size: self.chunk_size,
            event: self.event.clone(),
            decoder: self.decoder.clone(),
        }
    }
}

impl<T: 'static> LogQuery<T> {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        filter: LogFilter,
        range: BlockRange,
        chunk_size: u64,
        event: impl Into<String>,
        decoder: LogDecoder<T>,
    ) -> Self {
        Self {
            transport,
            filter,
            range,
            chunk_size: chunk_size.max(1),
            event: event.into(),
            decoder,
        }
    }

    /// Event name this query decodes.
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn range(&self) -> BlockRange {
        self.range
    }

    /// Same query yielding `f(item)`. An error from `f` ends the sequence.
    pub fn map<U, F>(self, f: F) -> LogQuery<U>
    where
        F: Fn(T) -> SdkResult<U> + Send + Sync + 'static,
        U: 'static,
    {
        let inner = self.decoder;
        LogQuery {
            transport: self.transport,
            filter: self.filter,
            range: self.range,
            chunk_size: self.chunk_size,
            event: self.event,
            decoder: Arc::new(move |log: &Log| inner(log).and_then(&f)),
        }
    }

    /// Start a fresh pass over the range.
    pub fn iter(&self) -> LogIter<T> {
        LogIter {
            query: self.clone(),
            next_block: self.range.from,
            end: match self.range.to {
                BlockTag::Number(n) => Some(n),
                BlockTag::Latest => None,
            },
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Drain a fresh pass into a vector.
    pub async fn collect(&self) -> SdkResult<Vec<T>> {
        let mut iter = self.iter();
        let mut items = Vec::new();
        while let Some(item) = iter.next().await {
            items.push(item?);
        }
        Ok(items)
    }
}

impl<T: Send + 'static> LogQuery<T> {
    /// A fresh pass as a [`Stream`].
    pub fn stream(&self) -> impl Stream<Item = SdkResult<T>> + Send + 'static {
        stream::unfold(self.iter(), |mut iter| async move {
            iter.next().await.map(|item| (item, iter))
        })
    }
}

impl<T> std::fmt::Debug for LogQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogQuery")
            .field("event", &self.event)
            .field("address", &self.filter.address)
            .field("range", &self.range)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// One pass over a [`LogQuery`].
pub struct LogIter<T = EventRecord> {
    query: LogQuery<T>,
    next_block: u64,
    /// Resolved upper bound; `None` until the head has been read.
    end: Option<u64>,
    buffer: VecDeque<T>,
    done: bool,
}

impl<T: 'static> LogIter<T> {
    /// Next item, `None` once the range is exhausted or after an error.
    pub async fn next(&mut self) -> Option<SdkResult<T>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }

            let end = match self.end {
                Some(end) => end,
                None => match self.query.transport.block_number().await {
                    Ok(head) => {
                        self.end = Some(head);
                        head
                    }
                    Err(e) => return Some(Err(self.fail(e.into()))),
                },
            };

            if self.next_block > end {
                self.done = true;
                return None;
            }

            let chunk_end = end.min(self.next_block.saturating_add(self.query.chunk_size - 1));
            let filter = self.query.filter.with_blocks(self.next_block, chunk_end);

            let logs = match self.query.transport.fetch_logs(&filter).await {
                Ok(logs) => logs,
                Err(e) => {
                    let err = e.into_call_error("eth_getLogs");
                    return Some(Err(self.fail(err)));
                }
            };

            let decoded: SdkResult<Vec<T>> =
                logs.iter().map(|log| (self.query.decoder)(log)).collect();
            match decoded {
                Ok(items) => {
                    tracing::debug!(
                        event = %self.query.event,
                        from_block = self.next_block,
                        to_block = chunk_end,
                        count = items.len(),
                        "Log chunk fetched"
                    );
                    metrics::record_logs_decoded(&self.query.event, items.len());
                    self.buffer.extend(items);
                }
                Err(e) => return Some(Err(self.fail(e))),
            }

            match chunk_end.checked_add(1) {
                Some(next) => self.next_block = next,
                None => self.done = true,
            }
        }
    }

    fn fail(&mut self, err: SdkError) -> SdkError {
        tracing::warn!(
            event = %self.query.event,
            block = self.next_block,
            error = %err,
            "Log retrieval aborted"
        );
        self.done = true;
        self.buffer.clear();
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use alloy::primitives::{address, Address, Bytes, TxHash, B256};
    use async_trait::async_trait;
    use futures_util::StreamExt;

    use crate::blockchain::transport::LogStream;
    use crate::blockchain::types::{MinedReceipt, TransportError};
    use crate::blockchain::wallet::TransactContext;

    const EMITTER: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    /// One log per block in `blocks`, answering range queries.
    struct LogsAt {
        blocks: Vec<u64>,
        head: u64,
        requests: Mutex<Vec<(u64, u64)>>,
    }

    #[async_trait]
    impl Transport for LogsAt {
        async fn chain_id(&self) -> Result<u64, TransportError> {
            Ok(1337)
        }

        async fn block_number(&self) -> Result<u64, TransportError> {
            Ok(self.head)
        }

        async fn call(&self, _: Address, _: Bytes, _: Option<u64>) -> Result<Bytes, TransportError> {
            Err(TransportError::Closed)
        }

        async fn submit(&self, _: &TransactContext, _: Address, _: Bytes) -> Result<TxHash, TransportError> {
            Err(TransportError::Closed)
        }

        async fn receipt(&self, _: TxHash) -> Result<Option<MinedReceipt>, TransportError> {
            Ok(None)
        }

        async fn transaction_sender(&self, _: TxHash) -> Result<Option<Address>, TransportError> {
            Ok(None)
        }

        async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, TransportError> {
            let from = filter.from_block.unwrap_or(0);
            let to = filter.to_block.unwrap_or(u64::MAX);
            self.requests.lock().unwrap().push((from, to));
            Ok(self
                .blocks
                .iter()
                .filter(|b| (from..=to).contains(*b))
                .map(|b| log_at(*b))
                .collect())
        }

        async fn subscribe_logs(&self, _: &LogFilter) -> Result<LogStream, TransportError> {
            Err(TransportError::Closed)
        }

        fn close(&self) {}
    }

    fn log_at(block: u64) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: EMITTER,
                data: alloy::primitives::LogData::new_unchecked(vec![B256::ZERO], Bytes::new()),
            },
            block_hash: None,
            block_number: Some(block),
            block_timestamp: None,
            transaction_hash: None,
            transaction_index: None,
            log_index: Some(0),
            removed: false,
        }
    }

    fn query(transport: Arc<LogsAt>, range: BlockRange, chunk: u64) -> LogQuery<u64> {
        let decoder: LogDecoder<u64> = Arc::new(|log: &Log| {
            log.block_number
                .ok_or_else(|| SdkError::decode("Test", "no block"))
        });
        LogQuery::new(transport, LogFilter::new(EMITTER), range, chunk, "Test", decoder)
    }

    fn transport(blocks: Vec<u64>, head: u64) -> Arc<LogsAt> {
        Arc::new(LogsAt {
            blocks,
            head,
            requests: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_chunks_cover_range_in_order() {
        let t = transport(vec![1, 4, 5, 9, 10], 10);
        let items = query(t.clone(), BlockRange::between(0, 10), 4)
            .collect()
            .await
            .unwrap();

        assert_eq!(items, vec![1, 4, 5, 9, 10]);
        assert_eq!(*t.requests.lock().unwrap(), vec![(0, 3), (4, 7), (8, 10)]);
    }

    #[tokio::test]
    async fn test_chunk_keeps_transport_order() {
        let t = transport(vec![5, 2, 7], 10);
        let items = query(t, BlockRange::between(0, 10), 20)
            .collect()
            .await
            .unwrap();
        assert_eq!(items, vec![5, 2, 7]);
    }

    #[tokio::test]
    async fn test_latest_resolves_to_head() {
        let t = transport(vec![2, 50], 20);
        let items = query(t, BlockRange::since(0), 100).collect().await.unwrap();
        assert_eq!(items, vec![2]);
    }

    #[tokio::test]
    async fn test_empty_range_yields_nothing() {
        let t = transport(vec![], 10);
        let q = query(t, BlockRange::between(0, 10), 5);
        let mut iter = q.iter();
        assert!(iter.next().await.is_none());
        assert!(iter.next().await.is_none());
    }

    #[tokio::test]
    async fn test_restartable() {
        let t = transport(vec![3, 6], 10);
        let q = query(t, BlockRange::between(0, 10), 5);
        assert_eq!(q.collect().await.unwrap(), vec![3, 6]);
        assert_eq!(q.collect().await.unwrap(), vec![3, 6]);
    }

    #[tokio::test]
    async fn test_decode_failure_is_strict() {
        let t = transport(vec![1, 2, 3], 3);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let q = query(t, BlockRange::between(0, 3), 10).map(move |block| {
            counter.fetch_add(1, Ordering::SeqCst);
            if block == 2 {
                Err(SdkError::decode("Test", "bad log"))
            } else {
                Ok(block)
            }
        });

        let mut iter = q.iter();
        assert!(matches!(iter.next().await, Some(Err(SdkError::Decode { .. }))));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(iter.next().await.is_none());
        assert!(q.collect().await.is_err());
    }

    #[tokio::test]
    async fn test_stream() {
        let t = transport(vec![1, 8], 8);
        let q = query(t, BlockRange::between(0, 8), 3);
        let items: Vec<_> = q.stream().map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![1, 8]);
    }
}
