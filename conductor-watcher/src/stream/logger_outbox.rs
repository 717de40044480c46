use super::ChangeStream;
use crate::domain::outbox::{AggregateKey, OutboxRecord};
use async_trait::async_trait;
use conductor_domain::{ConductorError, Unit};
use uuid::Uuid;

/// Change stream that never yields records, for running without a database.
pub struct LoggerOutbox;

#[async_trait]
impl ChangeStream for LoggerOutbox {
    async fn poll(
        &self,
        limit: usize,
        _held: &[AggregateKey],
    ) -> Result<Vec<OutboxRecord>, ConductorError> {
        tracing::debug!("Polling up to {limit} outbox records, using logger outbox");

        Ok(vec![])
    }

    async fn acknowledge(&self, id: Uuid) -> Result<Unit, ConductorError> {
        tracing::info!("Acknowledging outbox record {id}, using logger outbox");

        Ok(())
    }
}
