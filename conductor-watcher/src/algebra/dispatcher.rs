use super::EventConsumer;
use conductor_domain::{ChangeEvent, ConductorError, ErrorMeta};
use futures::future::join_all;
use std::sync::Arc;

/// Hands every change event to the consumers interested in it.
#[derive(Clone, Default)]
pub struct ChangeEventDispatcher {
    consumers: Vec<Arc<dyn EventConsumer>>,
}

impl ChangeEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, consumer: Arc<dyn EventConsumer>) -> &mut Self {
        tracing::info!("Registered {} consumer", consumer.name());
        self.consumers.push(consumer);
        self
    }

    /// Runs the matching consumers and returns the errors they raised, after
    /// logging each of them. A failing consumer does not stop the others.
    pub async fn dispatch(&self, event: &ChangeEvent) -> Vec<ConductorError> {
        tracing::debug!(
            aggregate_type = %event.aggregate_type,
            aggregate_id = event.aggregate_id,
            event_type = %event.event_type,
            "Dispatching change event"
        );

        let matching = self
            .consumers
            .iter()
            .filter(|consumer| consumer.accepts(event))
            .collect::<Vec<_>>();

        if matching.is_empty() {
            tracing::debug!(
                "No consumer for {} events of {}",
                event.event_type,
                event.aggregate_type
            );
            return vec![];
        }

        let results = join_all(matching.iter().map(|consumer| async move {
            consumer
                .accept(event)
                .await
                .map_err(|e| (consumer.name().to_string(), e))
        }))
        .await;

        results
            .into_iter()
            .filter_map(Result::err)
            .map(|(consumer, e)| {
                tracing::error!(
                    aggregate_type = %event.aggregate_type,
                    aggregate_id = event.aggregate_id,
                    event_type = %event.event_type,
                    error_key = %e.key(),
                    "Consumer {consumer} failed: {e}"
                );
                e
            })
            .collect()
    }
}
