//! The `DebeziumServer` custom resource reconciled by the operator running in the
//! cluster. One resource runs one pipeline.

use conductor_domain::ConfigProperties;
use indexmap::IndexMap;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Join label carrying the pipeline id.
pub const LABEL_CONDUCTOR_ID: &str = "debezium.io/conductor-id";
pub const LABEL_CLASSIFIER: &str = "debezium.io/classifier";
pub const LABEL_INSTANCE: &str = "debezium.io/instance";
pub const API_CLASSIFIER: &str = "api";
pub const ANNOTATION_STOP: &str = "debezium.io/stop";

#[derive(CustomResource, Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "debezium.io",
    version = "v1alpha1",
    kind = "DebeziumServer",
    plural = "debeziumservers",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct DebeziumServerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub quarkus: Quarkus,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub sink: Sink,
    #[serde(default)]
    pub transforms: Vec<Transformation>,
    #[serde(default)]
    pub predicates: IndexMap<String, PredicateSpec>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct Quarkus {
    #[serde(default)]
    pub config: ConfigProperties,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct Runtime {
    #[serde(default)]
    pub api: RuntimeApi,
    #[serde(default)]
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct RuntimeApi {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default)]
    pub jmx_exporter: JmxExporter,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct JmxExporter {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "class")]
    pub source_class: String,
    #[serde(default)]
    pub offset: Offset,
    #[serde(default)]
    pub schema_history: SchemaHistory,
    #[serde(default)]
    pub config: ConfigProperties,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct Offset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<CustomStore>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct SchemaHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<CustomStore>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct CustomStore {
    #[serde(rename = "type")]
    pub store_type: String,
    #[serde(default)]
    pub config: ConfigProperties,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct Sink {
    #[serde(rename = "type")]
    pub sink_type: String,
    #[serde(default)]
    pub config: ConfigProperties,
}

/// One step of the transform chain. The operator names transforms by position, so
/// `alias` is kept locally and never sent.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct Transformation {
    #[serde(skip)]
    pub alias: String,
    #[serde(rename = "type")]
    pub transform_type: String,
    #[serde(default)]
    pub config: ConfigProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    #[serde(default)]
    pub negate: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
pub struct PredicateSpec {
    #[serde(rename = "type")]
    pub predicate_type: String,
    #[serde(default)]
    pub config: ConfigProperties,
}

impl DebeziumServer {
    /// Pipeline id from the join label, if the resource carries one.
    pub fn conductor_id(&self) -> Option<i64> {
        self.labels()
            .get(LABEL_CONDUCTOR_ID)
            .and_then(|id| id.parse().ok())
    }

    pub fn is_stopped(&self) -> bool {
        self.annotations()
            .get(ANNOTATION_STOP)
            .is_some_and(|value| value == "true")
    }

    pub fn set_stopped(&mut self, stopped: bool) {
        self.annotations_mut()
            .insert(ANNOTATION_STOP.to_string(), stopped.to_string());
    }
}

/// Label selector in `k=v,k=v` form, as accepted by list and delete calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSelector(Vec<(String, String)>);

impl LabelSelector {
    pub fn new() -> Self {
        LabelSelector(Vec::new())
    }

    pub fn conductor_id(pipeline_id: i64) -> Self {
        LabelSelector::new().with(LABEL_CONDUCTOR_ID, pipeline_id.to_string())
    }

    pub fn api_service(instance: &str) -> Self {
        LabelSelector::new()
            .with(LABEL_CLASSIFIER, API_CLASSIFIER)
            .with(LABEL_INSTANCE, instance)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn matches(&self, labels: &std::collections::BTreeMap<String, String>) -> bool {
        self.0
            .iter()
            .all(|(key, value)| labels.get(key).is_some_and(|v| v == value))
    }
}

impl Default for LabelSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let selector = self
            .0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");

        write!(f, "{selector}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_resource_identity() {
        assert_eq!(DebeziumServer::group(&()), "debezium.io");
        assert_eq!(DebeziumServer::version(&()), "v1alpha1");
        assert_eq!(DebeziumServer::kind(&()), "DebeziumServer");
    }

    #[test]
    fn test_transform_alias_is_not_serialized() {
        let transform = Transformation {
            alias: "t0".to_string(),
            transform_type: "io.debezium.transforms.ExtractNewRecordState".to_string(),
            config: ConfigProperties::new(),
            predicate: Some("p7".to_string()),
            negate: false,
        };

        assert_eq!(
            serde_json::to_value(&transform).expect("Failed to serialize transform"),
            json!({
                "type": "io.debezium.transforms.ExtractNewRecordState",
                "config": {},
                "predicate": "p7",
                "negate": false
            })
        );
    }

    #[test]
    fn test_stop_annotation() {
        let mut server = DebeziumServer::new("orders", DebeziumServerSpec::default());
        assert!(!server.is_stopped());

        server.set_stopped(true);
        assert!(server.is_stopped());
        assert_eq!(
            server.annotations().get(ANNOTATION_STOP),
            Some(&"true".to_string())
        );

        server.set_stopped(false);
        assert!(!server.is_stopped());
    }

    #[test]
    fn test_label_selector() {
        let selector = LabelSelector::api_service("orders");
        assert_eq!(
            selector.to_string(),
            "debezium.io/classifier=api,debezium.io/instance=orders"
        );

        let labels = BTreeMap::from([
            (LABEL_CLASSIFIER.to_string(), "api".to_string()),
            (LABEL_INSTANCE.to_string(), "orders".to_string()),
            ("app".to_string(), "debezium".to_string()),
        ]);
        assert!(selector.matches(&labels));
        assert!(!LabelSelector::api_service("billing").matches(&labels));
        assert_eq!(
            LabelSelector::conductor_id(5).to_string(),
            "debezium.io/conductor-id=5"
        );
    }
}
