mod component;
mod connection;

pub use component::*;
pub use connection::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LOG_LEVEL: &str = "INFO";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Hydrated view of a pipeline as carried by its change events: the pipeline itself
/// plus the full source, destination and ordered transforms it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<PipelineComponent>,
    #[serde(default)]
    pub destination: Option<PipelineComponent>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
    #[serde(default = "default_log_level", alias = "defaultLogLevel")]
    pub log_level: String,
    #[serde(default)]
    pub log_levels: BTreeMap<String, String>,
}

impl Pipeline {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            source: None,
            destination: None,
            transforms: Vec::new(),
            log_level: default_log_level(),
            log_levels: BTreeMap::new(),
        }
    }
}
