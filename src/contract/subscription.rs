//! Live log subscriptions.
//!
//! A spawned task pulls raw logs from the transport stream, decodes them and
//! forwards them into a bounded channel. The consumer side owns the task.

use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::blockchain::transport::LogStream;
use crate::contract::events::EventRecord;
use crate::contract::logs::LogDecoder;
use crate::error::{SdkError, SdkResult};
use crate::observability::metrics;

/// Push-based sequence of decoded events observed after subscription time.
///
/// Ends with a single [`SdkError::Subscription`] when the transport drops the
/// stream, or with the decode error when a live log cannot be decoded.
pub struct LogSubscription<T = EventRecord> {
    receiver: mpsc::Receiver<SdkResult<T>>,
    task: JoinHandle<()>,
    event: String,
    cancelled: bool,
}

impl<T: Send + 'static> LogSubscription<T> {
    pub(crate) fn spawn(
        logs: LogStream,
        decoder: LogDecoder<T>,
        buffer: usize,
        event: impl Into<String>,
    ) -> Self {
        let event = event.into();
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let task = tokio::spawn(forward(logs, decoder, sender, event.clone()));

        metrics::record_subscription(true);
        tracing::debug!(event = %event, "Log subscription started");

        Self {
            receiver,
            task,
            event,
            cancelled: false,
        }
    }

    /// Next event. `None` after cancellation or once the stream has ended.
    pub async fn next(&mut self) -> Option<SdkResult<T>> {
        if self.cancelled {
            return None;
        }
        self.receiver.recv().await
    }

    /// Stop delivery and release the transport subscription.
    ///
    /// Events already buffered are discarded.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.task.abort();
        self.receiver.close();
        tracing::debug!(event = %self.event, "Log subscription cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Event name this subscription decodes.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Consume into a [`Stream`]. Dropping the stream cancels the subscription.
    pub fn into_stream(self) -> impl Stream<Item = SdkResult<T>> + Send + 'static {
        stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|item| (item, sub))
        })
    }
}

impl<T> Drop for LogSubscription<T> {
    fn drop(&mut self) {
        self.task.abort();
        metrics::record_subscription(false);
    }
}

impl<T> std::fmt::Debug for LogSubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSubscription")
            .field("event", &self.event)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

async fn forward<T>(
    mut logs: LogStream,
    decoder: LogDecoder<T>,
    sender: mpsc::Sender<SdkResult<T>>,
    event: String,
) {
    while let Some(log) = logs.next().await {
        match decoder(&log) {
            Ok(item) => {
                metrics::record_logs_decoded(&event, 1);
                if sender.send(Ok(item)).await.is_err() {
                    // Receiver gone.
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "Undecodable live log, ending subscription");
                let _ = sender.send(Err(e)).await;
                return;
            }
        }
    }

    tracing::warn!(event = %event, "Log stream closed by transport");
    let _ = sender
        .send(Err(SdkError::Subscription(format!(
            "{event} log stream closed by transport"
        ))))
        .await;
}
