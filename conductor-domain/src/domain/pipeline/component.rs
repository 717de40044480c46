use super::Connection;
use crate::ConfigProperties;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultReference {
    pub id: i64,
    pub name: String,
}

/// A source or destination of a pipeline.
///
/// `component_type` is the connector class for sources and the sink type for
/// destinations. `connection`, when present, is the legacy shared connection whose
/// configuration is merged below the inline `config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineComponent {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub vaults: Vec<VaultReference>,
    #[serde(default)]
    pub config: ConfigProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
}

impl PipelineComponent {
    pub fn new(id: i64, name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            component_type: component_type.into(),
            schema: None,
            vaults: Vec::new(),
            config: ConfigProperties::new(),
            connection: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub transform_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub vaults: Vec<VaultReference>,
    #[serde(default)]
    pub config: ConfigProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Predicate>,
}

impl Transform {
    pub fn new(id: i64, name: impl Into<String>, transform_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            transform_type: transform_type.into(),
            schema: None,
            vaults: Vec::new(),
            config: ConfigProperties::new(),
            predicate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    #[serde(rename = "type")]
    pub predicate_type: String,
    #[serde(default)]
    pub config: ConfigProperties,
    #[serde(default)]
    pub negate: bool,
}
