use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Control message for a running instance, posted to its `/api/signals` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: String,
    #[serde(rename = "type")]
    pub signal_type: String,
    pub data: String,
    #[serde(default)]
    pub additional_data: BTreeMap<String, Value>,
}

impl Signal {
    pub fn new(id: impl Into<String>, signal_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            signal_type: signal_type.into(),
            data: data.into(),
            additional_data: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let mut signal = Signal::new(
            "ad-hoc-1",
            "execute-snapshot",
            r#"{"data-collections":["public.orders"]}"#,
        );
        signal
            .additional_data
            .insert("origin".to_string(), json!("api"));

        assert_eq!(
            serde_json::to_value(&signal).expect("Failed to serialize signal"),
            json!({
                "id": "ad-hoc-1",
                "type": "execute-snapshot",
                "data": "{\"data-collections\":[\"public.orders\"]}",
                "additionalData": { "origin": "api" }
            })
        );
    }
}
