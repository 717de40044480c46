use crate::{ConductorError, InternalError};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

/// Aggregates whose mutations are reconciled against the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Aggregate {
    Pipeline,
    Vault,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventType {
    Update,
    Delete,
}

/// One committed mutation of an aggregate, as recorded in the outbox.
///
/// `payload` holds the hydrated view for updates and is absent for deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub aggregate_type: String,
    pub aggregate_id: i64,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl ChangeEvent {
    pub fn update(aggregate: Aggregate, id: i64, payload: Value) -> Self {
        Self {
            aggregate_type: aggregate.to_string(),
            aggregate_id: id,
            event_type: EventType::Update,
            timestamp: Utc::now(),
            payload: Some(payload),
        }
    }

    pub fn delete(aggregate: Aggregate, id: i64) -> Self {
        Self {
            aggregate_type: aggregate.to_string(),
            aggregate_id: id,
            event_type: EventType::Delete,
            timestamp: Utc::now(),
            payload: None,
        }
    }

    pub fn is_aggregate(&self, aggregate: Aggregate) -> bool {
        self.aggregate_type == aggregate.as_ref()
    }

    /// Reads the payload as the typed view of the aggregate. A null payload is
    /// treated as absent.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<Option<T>, ConductorError> {
        match &self.payload {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                InternalError::deserialize_error(
                    &format!(
                        "Invalid {} payload for id {}: {e}",
                        self.aggregate_type, self.aggregate_id
                    ),
                    Some("change event"),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vault;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_event_type_tags() {
        assert_eq!(EventType::from_str("UPDATE").ok(), Some(EventType::Update));
        assert_eq!(EventType::from_str("DELETE").ok(), Some(EventType::Delete));
        assert!(EventType::from_str("INSERT").is_err());
        assert_eq!(Aggregate::Pipeline.as_ref(), "pipeline");
    }

    #[test]
    fn test_payload_as() {
        let event = ChangeEvent::update(
            Aggregate::Vault,
            3,
            json!({ "id": 3, "name": "secrets", "items": { "user": "dbz" } }),
        );

        let vault: Option<Vault> = event.payload_as().expect("Failed to read payload");
        assert_eq!(vault.map(|v| v.name), Some("secrets".to_string()));

        let delete = ChangeEvent::delete(Aggregate::Vault, 3);
        assert_eq!(delete.payload_as::<Vault>().ok(), Some(None));
    }

    #[test]
    fn test_malformed_payload() {
        let event = ChangeEvent::update(Aggregate::Vault, 3, json!({ "id": "three" }));

        let err = event
            .payload_as::<Vault>()
            .expect_err("id must be numeric");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("vault"));
    }
}
