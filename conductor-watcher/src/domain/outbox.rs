use chrono::{DateTime, Utc};
use conductor_domain::{ChangeEvent, ConductorError, EventType, InternalError};
use serde_json::Value;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Aggregate type and id of an outbox record.
pub type AggregateKey = (String, String);

/// A row of the outbox table, as read by the tailer.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Option<String>,
}

impl OutboxRecord {
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Key under which per-aggregate ordering is kept.
    pub fn aggregate_key(&self) -> AggregateKey {
        (self.aggregate_type.clone(), self.aggregate_id.clone())
    }

    pub fn to_change_event(&self) -> Result<ChangeEvent, ConductorError> {
        let aggregate_id = self.aggregate_id.parse::<i64>().map_err(|e| {
            InternalError::deserialize_error(
                &format!("Outbox record {} has invalid aggregate id '{}': {e}", self.id, self.aggregate_id),
                Some("outbox"),
            )
        })?;

        let event_type = EventType::from_str(&self.event_type).map_err(|_| {
            InternalError::deserialize_error(
                &format!("Outbox record {} has unknown event type '{}'", self.id, self.event_type),
                Some("outbox"),
            )
        })?;

        let payload = self
            .payload
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(|e| {
                InternalError::deserialize_error(
                    &format!("Outbox record {} has malformed payload: {e}", self.id),
                    Some("outbox"),
                )
            })?;

        Ok(ChangeEvent {
            aggregate_type: self.aggregate_type.clone(),
            aggregate_id,
            event_type,
            timestamp: self.timestamp,
            payload,
        })
    }
}
