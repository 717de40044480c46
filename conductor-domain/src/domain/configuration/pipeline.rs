use crate::{ConductorError, InternalError};
use envconfig::Envconfig;
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Environment-wide storage defaults shared by every deployed pipeline.
#[derive(Envconfig, Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    #[envconfig(
        from = "PIPELINE_OFFSET_STORAGE_TYPE",
        default = "io.debezium.storage.jdbc.offset.JdbcOffsetBackingStore"
    )]
    pub offset_storage_type: String,
    #[envconfig(
        from = "PIPELINE_OFFSET_STORAGE_CONFIG",
        default = r#"{"jdbc.offset.table.name":"@{pipeline_name}_offsets"}"#
    )]
    pub offset_storage_config: StoreProperties,
    #[envconfig(
        from = "PIPELINE_SCHEMA_HISTORY_INTERNAL",
        default = "io.debezium.storage.jdbc.history.JdbcSchemaHistory"
    )]
    pub schema_history_internal: String,
    #[envconfig(
        from = "PIPELINE_SCHEMA_HISTORY_CONFIG",
        default = r#"{"jdbc.schema.history.table.name":"@{pipeline_name}_schema_history"}"#
    )]
    pub schema_history_config: StoreProperties,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            offset_storage_type: "io.debezium.storage.jdbc.offset.JdbcOffsetBackingStore"
                .to_owned(),
            offset_storage_config: StoreProperties::from_iter([(
                "jdbc.offset.table.name",
                "@{pipeline_name}_offsets",
            )]),
            schema_history_internal: "io.debezium.storage.jdbc.history.JdbcSchemaHistory"
                .to_owned(),
            schema_history_config: StoreProperties::from_iter([(
                "jdbc.schema.history.table.name",
                "@{pipeline_name}_schema_history",
            )]),
        }
    }
}

impl Display for PipelineConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "PIPELINE_OFFSET_STORAGE_TYPE: {}",
            self.offset_storage_type
        )?;
        writeln!(
            f,
            "PIPELINE_OFFSET_STORAGE_CONFIG: {}",
            self.offset_storage_config
        )?;
        writeln!(
            f,
            "PIPELINE_SCHEMA_HISTORY_INTERNAL: {}",
            self.schema_history_internal
        )?;
        writeln!(
            f,
            "PIPELINE_SCHEMA_HISTORY_CONFIG: {}",
            self.schema_history_config
        )
    }
}

/// String properties of an offset or schema-history store, read from a JSON object.
/// Keys containing `password` are masked when displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreProperties(BTreeMap<String, String>);

impl StoreProperties {
    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StoreProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        StoreProperties(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl FromStr for StoreProperties {
    type Err = ConductorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(StoreProperties::default());
        }

        serde_json::from_str::<BTreeMap<String, String>>(s)
            .map(StoreProperties)
            .map_err(|e| {
                InternalError::configuration_error(
                    &format!("Store properties must be a JSON object of strings: {e}"),
                    Some("pipeline config"),
                )
            })
    }
}

impl Display for StoreProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|(k, v)| {
                if k.contains("password") {
                    format!("{k}=****")
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "{{{rendered}}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_env_defaults() {
        let config = PipelineConfig::init_from_hashmap(&HashMap::new())
            .expect("Failed to init pipeline config");

        assert_eq!(config, PipelineConfig::default());
        assert_eq!(
            config.offset_storage_config.get("jdbc.offset.table.name"),
            Some(&"@{pipeline_name}_offsets".to_string())
        );
    }

    #[test]
    fn test_store_properties_from_env() {
        let config = PipelineConfig::init_from_hashmap(&HashMap::from([(
            "PIPELINE_OFFSET_STORAGE_CONFIG".to_string(),
            r#"{"jdbc.offset.table.name":"offsets_@{pipeline_name}","jdbc.connection.password":"hunter2"}"#
                .to_string(),
        )]))
        .expect("Failed to init pipeline config");

        assert_eq!(config.offset_storage_config.iter().count(), 2);
        let shown = config.to_string();
        assert!(shown.contains("jdbc.connection.password=****"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_store_properties_reject_non_object() {
        let err = StoreProperties::from_str("[1, 2]").expect_err("arrays are not properties");

        assert!(err.is_configuration());
    }
}
