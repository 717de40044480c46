use crate::{
    domain::outbox::{AggregateKey, OutboxRecord},
    stream::ChangeStream,
};
use async_trait::async_trait;
use conductor_domain::{Aggregate, ConductorError, EventType, Unit};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Outbox kept in memory, in insertion order.
#[derive(Default)]
pub struct InMemoryOutbox {
    records: Mutex<Vec<OutboxRecord>>,
    acknowledged: Mutex<Vec<Uuid>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, record: OutboxRecord) -> Uuid {
        let id = record.id;
        self.records.lock().await.push(record);
        id
    }

    /// Appends an UPDATE carrying the serialized view of the aggregate.
    pub async fn push_update<T: Serialize>(
        &self,
        aggregate: Aggregate,
        id: i64,
        view: &T,
    ) -> Result<Uuid, ConductorError> {
        let payload = serde_json::to_string(view)?;

        Ok(self
            .push(OutboxRecord::new(
                aggregate.as_ref(),
                id.to_string(),
                EventType::Update.as_ref(),
                Some(payload),
            ))
            .await)
    }

    pub async fn push_delete(&self, aggregate: Aggregate, id: i64) -> Uuid {
        self.push(OutboxRecord::new(
            aggregate.as_ref(),
            id.to_string(),
            EventType::Delete.as_ref(),
            None,
        ))
        .await
    }

    pub async fn pending(&self) -> Vec<OutboxRecord> {
        self.records.lock().await.clone()
    }

    pub async fn acknowledged(&self) -> Vec<Uuid> {
        self.acknowledged.lock().await.clone()
    }
}

#[async_trait]
impl ChangeStream for InMemoryOutbox {
    async fn poll(
        &self,
        limit: usize,
        held: &[AggregateKey],
    ) -> Result<Vec<OutboxRecord>, ConductorError> {
        let mut records = self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| !held.contains(&record.aggregate_key()))
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by_key(|record| record.timestamp);
        records.truncate(limit);

        Ok(records)
    }

    async fn acknowledge(&self, id: Uuid) -> Result<Unit, ConductorError> {
        self.records.lock().await.retain(|record| record.id != id);
        self.acknowledged.lock().await.push(id);

        Ok(())
    }
}
