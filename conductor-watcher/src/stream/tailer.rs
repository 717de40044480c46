use super::ChangeStream;
use crate::{
    algebra::{ChangeEventDispatcher, MetricExt, MetricsRegistry},
    domain::{config::OutboxConfig, outbox::AggregateKey},
};
use conductor_domain::{ConductorError, Unit};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Outcome of one pass over the outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub fetched: usize,
    pub delivered: usize,
    pub deferred: usize,
    pub dropped: usize,
}

/// Feeds outbox records to the dispatcher and acknowledges them.
///
/// A record whose delivery failed with a retryable error stays in the outbox,
/// and later records of the same aggregate wait behind it. After
/// `max_attempts` deliveries it is dropped. Records that cannot succeed on
/// redelivery are acknowledged right away.
pub struct OutboxTailer {
    stream: Arc<dyn ChangeStream>,
    dispatcher: ChangeEventDispatcher,
    batch_size: usize,
    poll_interval: Duration,
    max_attempts: u32,
    attempts: Mutex<HashMap<Uuid, u32>>,
    metrics: MetricsRegistry,
}

impl OutboxTailer {
    pub fn new(
        stream: Arc<dyn ChangeStream>,
        dispatcher: ChangeEventDispatcher,
        config: &OutboxConfig,
    ) -> Self {
        Self {
            stream,
            dispatcher,
            batch_size: config.batch_size.max(1),
            poll_interval: Duration::from_millis(config.poll_interval_millis),
            max_attempts: config.max_delivery_attempts.max(1),
            attempts: Mutex::new(HashMap::new()),
            metrics: MetricsRegistry::default(),
        }
    }

    /// Polls until `token` is cancelled. Failing polls are logged and retried
    /// on the next tick.
    pub async fn run(&self, token: CancellationToken) -> Result<Unit, ConductorError> {
        tracing::info!(
            "Tailing outbox every {}ms in batches of {}",
            self.poll_interval.as_millis(),
            self.batch_size
        );

        loop {
            let drained = tokio::select! {
                _ = token.cancelled() => break,
                drained = self.drain_once() => drained,
            };

            let idle = match drained {
                Ok(summary) => {
                    if summary.fetched > 0 {
                        tracing::debug!("Outbox pass finished: {summary:?}");
                    }
                    summary.delivered + summary.dropped < self.batch_size
                }
                Err(e) => {
                    tracing::error!("Failed to drain outbox: {e}");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        tracing::info!("Outbox tailer cancelled, shutting down");

        Ok(())
    }

    /// Delivers up to one batch of records.
    ///
    /// Aggregates held back during the pass are excluded from later polls, so
    /// the pass keeps reaching unrelated records behind them.
    pub async fn drain_once(&self) -> Result<DrainSummary, ConductorError> {
        let mut summary = DrainSummary::default();
        let mut held: Vec<AggregateKey> = vec![];
        let mut dispatched = 0;

        while dispatched < self.batch_size {
            let records = self.stream.poll(self.batch_size, &held).await?;
            let exhausted = records.len() < self.batch_size;
            summary.fetched += records.len();

            for record in &records {
                let key = record.aggregate_key();
                if held.contains(&key) {
                    tracing::debug!(
                        "Holding back outbox record {} behind an undelivered {} {}",
                        record.id,
                        record.aggregate_type,
                        record.aggregate_id
                    );
                    summary.deferred += 1;
                    continue;
                }

                if dispatched == self.batch_size {
                    break;
                }
                dispatched += 1;

                let event = match record.to_change_event() {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!("Dropping unreadable outbox record {}: {e}", record.id);
                        self.stream.acknowledge(record.id).await?;
                        summary.dropped += 1;
                        continue;
                    }
                };

                let started = Instant::now();
                let errors = self.dispatcher.dispatch(&event).await;
                self.metrics.duration(started.elapsed());
                self.metrics.errored(errors.len() as u64);

                if errors.iter().any(ConductorError::is_retryable) {
                    let attempts = {
                        let mut attempts = self.attempts.lock().await;
                        let count = attempts.entry(record.id).or_insert(0);
                        *count += 1;
                        *count
                    };

                    if attempts < self.max_attempts {
                        tracing::warn!(
                            "Delivery {attempts}/{} of outbox record {} failed, will retry",
                            self.max_attempts,
                            record.id
                        );
                        held.push(key);
                        summary.deferred += 1;
                        continue;
                    }

                    tracing::error!(
                        aggregate_type = %event.aggregate_type,
                        aggregate_id = event.aggregate_id,
                        event_type = %event.event_type,
                        "Giving up on outbox record {} after {attempts} attempts",
                        record.id
                    );
                }

                self.stream.acknowledge(record.id).await?;
                self.attempts.lock().await.remove(&record.id);

                if errors.is_empty() {
                    summary.delivered += 1;
                } else {
                    summary.dropped += 1;
                }
            }

            if exhausted {
                break;
            }
        }

        self.metrics.drained(&summary);

        Ok(summary)
    }
}
