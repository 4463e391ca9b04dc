use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::EngineConfig;
use crate::error::{FlushError, FlushResult, TrackError};
use crate::record::Record;
use crate::retry::RetryState;
use weir_transport::Transport;

/// One stream's accumulated records plus their serialized byte total
#[derive(Default)]
struct Queue {
    records: Vec<String>,
    bytes: usize,
}

struct Inner {
    transport: Arc<dyn Transport>,
    config: EngineConfig,
    // Never held across an await; detachment under this lock is the only
    // synchronization between track and in-flight sends.
    queues: Mutex<HashMap<String, Queue>>,
}

/// Per-stream event buffer with triggered and periodic flushing
///
/// Records accumulate per stream until a trigger fires (record count or
/// serialized byte size) or the periodic ticker forces a flush. A triggered
/// queue is swapped out for an empty one before its batch is handed to the
/// transport, so `track` calls racing an in-flight send land in the fresh
/// queue and are neither lost nor duplicated.
///
/// Must be created and used inside a tokio runtime: construction spawns the
/// ticker task and triggered flushes are spawned fire-and-forget.
pub struct StreamBuffer {
    inner: Arc<Inner>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl StreamBuffer {
    /// Create an engine and start its periodic flush ticker
    pub fn new(transport: Arc<dyn Transport>, config: EngineConfig) -> Self {
        let inner = Arc::new(Inner {
            transport,
            config,
            queues: Mutex::new(HashMap::new()),
        });

        let ticker = {
            let inner = Arc::clone(&inner);
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(inner.config.flush_interval);
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately; consume it so the
                // first forced flush happens one full interval in.
                tick.tick().await;
                loop {
                    tick.tick().await;
                    for (stream, result) in Inner::flush_all(&inner).await {
                        log_outcome(&stream, &result);
                    }
                }
            })
        };

        Self {
            inner,
            ticker: Mutex::new(Some(ticker)),
        }
    }

    /// Accumulate one record for the named stream
    ///
    /// Rejects empty stream names and empty records synchronously, before
    /// touching the buffer. Structured records are serialized here, at track
    /// time. If the append makes the stream's queue reach the count or byte
    /// trigger, the queue is detached and delivered on a spawned task; the
    /// outcome of that delivery is logged, not returned.
    pub fn track(
        &self,
        stream: impl Into<String>,
        record: impl Into<Record>,
    ) -> Result<(), TrackError> {
        let stream = stream.into();
        if stream.is_empty() {
            return Err(TrackError::InvalidStream);
        }
        let record = record.into();
        if record.is_empty() {
            return Err(TrackError::InvalidRecord);
        }
        let wire = record.into_wire()?;

        let triggered = {
            let mut queues = self.inner.queues.lock().unwrap();
            let queue = queues.entry(stream.clone()).or_default();
            queue.bytes += wire.len();
            queue.records.push(wire);

            let full = queue.records.len() >= self.inner.config.max_record_count
                || queue.bytes >= self.inner.config.max_batch_bytes;
            full.then(|| std::mem::take(queue).records)
        };

        if let Some(batch) = triggered {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                let result = Inner::deliver(&inner, &stream, batch).await;
                log_outcome(&stream, &result);
            });
        }

        Ok(())
    }

    /// Flush every stream with at least one accumulated record
    ///
    /// All non-empty queues are detached before any send is dispatched; the
    /// sends then run concurrently. Returns one `(stream, result)` pair per
    /// flushed stream. Streams with empty queues produce nothing.
    pub async fn flush(&self) -> Vec<(String, FlushResult)> {
        Inner::flush_all(&self.inner).await
    }

    /// Flush one stream; `None` when it has nothing buffered
    pub async fn flush_stream(&self, stream: &str) -> Option<FlushResult> {
        let batch = {
            let mut queues = self.inner.queues.lock().unwrap();
            let queue = queues.get_mut(stream)?;
            if queue.records.is_empty() {
                return None;
            }
            std::mem::take(queue).records
        };
        Some(Inner::deliver(&self.inner, stream, batch).await)
    }

    /// Number of records currently buffered for a stream
    pub fn pending(&self, stream: &str) -> usize {
        let queues = self.inner.queues.lock().unwrap();
        queues.get(stream).map_or(0, |q| q.records.len())
    }

    /// Whether no stream has anything buffered
    pub fn is_empty(&self) -> bool {
        let queues = self.inner.queues.lock().unwrap();
        queues.values().all(|q| q.records.is_empty())
    }

    /// Stop the periodic ticker
    ///
    /// In-flight deliveries keep retrying on their own tasks until they
    /// settle; callers wanting a clean drain should `flush().await` first.
    pub fn stop(&self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for StreamBuffer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    /// Detach every non-empty queue, then deliver the batches concurrently
    async fn flush_all(inner: &Arc<Inner>) -> Vec<(String, FlushResult)> {
        let batches: Vec<(String, Vec<String>)> = {
            let mut queues = inner.queues.lock().unwrap();
            queues
                .iter_mut()
                .filter(|(_, queue)| !queue.records.is_empty())
                .map(|(stream, queue)| (stream.clone(), std::mem::take(queue).records))
                .collect()
        };

        let sends = batches.into_iter().map(|(stream, batch)| {
            let inner = Arc::clone(inner);
            async move {
                let result = Inner::deliver(&inner, &stream, batch).await;
                (stream, result)
            }
        });

        futures::future::join_all(sends).await
    }

    /// Deliver one detached batch, retrying transient failures with backoff
    ///
    /// The batch is captured once at detachment; retries re-send the same
    /// records and never look at the live queue.
    async fn deliver(inner: &Arc<Inner>, stream: &str, records: Vec<String>) -> FlushResult {
        let mut retry = RetryState::new(inner.config.retry.clone());
        loop {
            match inner
                .transport
                .send(stream, &records, &inner.config.send_options)
                .await
            {
                Ok(delivery) => {
                    if retry.retries() > 0 {
                        tracing::debug!(
                            stream = stream,
                            retries = retry.retries(),
                            "batch delivered after retry"
                        );
                    }
                    return Ok(delivery);
                }
                Err(err) if err.is_transient() => match retry.next_delay() {
                    Some(delay) => {
                        tracing::warn!(
                            stream = stream,
                            retry = retry.retries(),
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "transient delivery failure, will retry"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(FlushError::RetryExhausted {
                            attempts: retry.retries() + 1,
                            last: err,
                        });
                    }
                },
                Err(err) => return Err(FlushError::Terminal(err)),
            }
        }
    }
}

fn log_outcome(stream: &str, result: &FlushResult) {
    match result {
        Ok(delivery) => {
            tracing::debug!(stream = stream, status = delivery.status, "batch delivered");
        }
        Err(err) => {
            tracing::error!(stream = stream, error = %err, "batch delivery failed");
        }
    }
}
