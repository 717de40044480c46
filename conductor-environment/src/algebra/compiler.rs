use super::{prefix_connection_config, resolve_table_name, ComponentRole};
use crate::domain::server::{
    CustomStore, DebeziumServer, DebeziumServerSpec, JmxExporter, Metrics, Offset,
    PredicateSpec, Quarkus, Runtime, RuntimeApi, SchemaHistory, Sink, Source, Transformation,
    LABEL_CONDUCTOR_ID,
};
use conductor_domain::{
    ConductorError, ConfigProperties, InternalError, Pipeline, PipelineComponent, PipelineConfig,
    StoreProperties, Transform,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;

pub const SIGNAL_ENABLED_CHANNELS: &str = "signal.enabled.channels";
pub const NOTIFICATION_ENABLED_CHANNELS: &str = "notification.enabled.channels";
const DEFAULT_SIGNAL_CHANNELS: &str = "source,in-process";
const DEFAULT_NOTIFICATION_CHANNELS: &str = "log";

const LOG_LEVEL: &str = "log.level";
const LOG_MIN_LEVEL: &str = "log.min-level";
const LOG_CONSOLE_JSON: &str = "log.console.json";
const MIN_LOG_LEVEL: &str = "TRACE";

/// Store properties holding generated table names.
const RESOLVABLE_STORE_KEYS: [&str; 2] = ["jdbc.schema.history.table.name", "jdbc.offset.table.name"];

const MAX_RESOURCE_NAME_LENGTH: usize = 63;

/// Compiles hydrated pipelines into `DebeziumServer` resources.
///
/// Compilation is pure: the same pipeline and defaults always give the same resource.
#[derive(Debug, Clone)]
pub struct DeploymentSpecCompiler {
    defaults: PipelineConfig,
}

impl DeploymentSpecCompiler {
    pub fn new(defaults: PipelineConfig) -> Self {
        Self { defaults }
    }

    pub fn compile(&self, pipeline: &Pipeline) -> Result<DebeziumServer, ConductorError> {
        let source = pipeline.source.as_ref().ok_or_else(|| {
            InternalError::configuration_error(
                &format!("Pipeline {} has no source", pipeline.id),
                Some("missing source"),
            )
        })?;
        let destination = pipeline.destination.as_ref().ok_or_else(|| {
            InternalError::configuration_error(
                &format!("Pipeline {} has no destination", pipeline.id),
                Some("missing destination"),
            )
        })?;

        let spec = DebeziumServerSpec {
            image: None,
            version: None,
            quarkus: quarkus(pipeline),
            runtime: runtime(),
            source: self.source(pipeline, source)?,
            sink: sink(destination)?,
            transforms: transformations(&pipeline.transforms),
            predicates: predicates(&pipeline.transforms),
        };

        let mut server = DebeziumServer::new(&resource_name(pipeline), spec);
        server.metadata.labels = Some(BTreeMap::from([(
            LABEL_CONDUCTOR_ID.to_string(),
            pipeline.id.to_string(),
        )]));

        Ok(server)
    }

    fn source(
        &self,
        pipeline: &Pipeline,
        source: &PipelineComponent,
    ) -> Result<Source, ConductorError> {
        let mut config = merged_config(source, ComponentRole::Source)?;

        for (key, value) in [
            (SIGNAL_ENABLED_CHANNELS, DEFAULT_SIGNAL_CHANNELS),
            (NOTIFICATION_ENABLED_CHANNELS, DEFAULT_NOTIFICATION_CHANNELS),
        ] {
            config
                .entry(key.to_string())
                .or_insert_with(|| Value::String(value.to_string()));
        }

        Ok(Source {
            source_class: source.component_type.clone(),
            offset: Offset {
                store: Some(store(
                    pipeline,
                    &self.defaults.offset_storage_type,
                    &self.defaults.offset_storage_config,
                )),
            },
            schema_history: SchemaHistory {
                store: Some(store(
                    pipeline,
                    &self.defaults.schema_history_internal,
                    &self.defaults.schema_history_config,
                )),
            },
            config,
        })
    }
}

fn quarkus(pipeline: &Pipeline) -> Quarkus {
    let mut config = ConfigProperties::from([
        (LOG_LEVEL.to_string(), Value::String(pipeline.log_level.clone())),
        (LOG_MIN_LEVEL.to_string(), Value::String(MIN_LOG_LEVEL.to_string())),
        (LOG_CONSOLE_JSON.to_string(), Value::Bool(false)),
    ]);

    config.extend(pipeline.log_levels.iter().map(|(category, level)| {
        (
            format!("log.category.\"{category}\".level"),
            Value::String(level.clone()),
        )
    }));

    Quarkus { config }
}

fn runtime() -> Runtime {
    Runtime {
        api: RuntimeApi { enabled: true },
        metrics: Metrics {
            jmx_exporter: JmxExporter { enabled: true },
        },
    }
}

fn sink(destination: &PipelineComponent) -> Result<Sink, ConductorError> {
    Ok(Sink {
        sink_type: destination.component_type.clone(),
        config: merged_config(destination, ComponentRole::Sink)?,
    })
}

/// Legacy connection config first, explicit component config on top.
fn merged_config(
    component: &PipelineComponent,
    role: ComponentRole,
) -> Result<ConfigProperties, ConductorError> {
    let mut config = match &component.connection {
        Some(connection) => prefix_connection_config(connection, role)?,
        None => ConfigProperties::new(),
    };

    config.extend(
        component
            .config
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    Ok(config)
}

fn store(pipeline: &Pipeline, store_type: &str, properties: &StoreProperties) -> CustomStore {
    let config = properties
        .iter()
        .filter_map(|(key, value)| {
            let value = if RESOLVABLE_STORE_KEYS.contains(&key.as_str()) {
                resolve_table_name(pipeline, Some(value))?
            } else {
                value.clone()
            };

            Some((key.clone(), Value::String(value)))
        })
        .collect();

    CustomStore {
        store_type: store_type.to_string(),
        config,
    }
}

pub fn transform_alias(position: usize) -> String {
    format!("t{position}")
}

pub fn predicate_alias(transform: &Transform) -> String {
    format!("p{}", transform.id)
}

fn transformations(transforms: &[Transform]) -> Vec<Transformation> {
    transforms
        .iter()
        .enumerate()
        .map(|(position, transform)| Transformation {
            alias: transform_alias(position),
            transform_type: transform.transform_type.clone(),
            config: transform.config.clone(),
            predicate: transform.predicate.as_ref().map(|_| predicate_alias(transform)),
            negate: transform.predicate.as_ref().is_some_and(|p| p.negate),
        })
        .collect()
}

fn predicates(transforms: &[Transform]) -> IndexMap<String, PredicateSpec> {
    transforms
        .iter()
        .filter_map(|transform| {
            let predicate = transform.predicate.as_ref()?;

            Some((
                predicate_alias(transform),
                PredicateSpec {
                    predicate_type: predicate.predicate_type.clone(),
                    config: predicate.config.clone(),
                },
            ))
        })
        .collect()
}

/// DNS-1123 label derived from the pipeline name, falling back to the id when the
/// name has no usable characters.
pub fn resource_name(pipeline: &Pipeline) -> String {
    let mut name = String::with_capacity(pipeline.name.len());

    for c in pipeline.name.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };

        if !(c == '-' && (name.is_empty() || name.ends_with('-'))) {
            name.push(c);
        }
    }

    name.truncate(MAX_RESOURCE_NAME_LENGTH);
    let name = name.trim_end_matches('-');

    if name.is_empty() {
        format!("pipeline-{}", pipeline.id)
    } else {
        name.to_string()
    }
}
