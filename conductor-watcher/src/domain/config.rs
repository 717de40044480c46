use crate::stream::OutboxProvider;
use conductor_domain::{ConductorError, InternalError, PostgresConfig, StringExt, Unit};
use conductor_environment::domain::config::EnvironmentConfig;
use envconfig::Envconfig;
use std::{
    fmt::{Display, Formatter},
    net::SocketAddr,
};

/// Location and shape of the outbox table.
#[derive(Envconfig, Debug, Clone, PartialEq, Eq)]
pub struct OutboxConfig {
    #[envconfig(from = "OUTBOX_TABLE", default = "outbox")]
    pub table: String,
    #[envconfig(from = "OUTBOX_ID_COLUMN", default = "id")]
    pub id_column: String,
    #[envconfig(from = "OUTBOX_AGGREGATE_TYPE_COLUMN", default = "aggregatetype")]
    pub aggregate_type_column: String,
    #[envconfig(from = "OUTBOX_AGGREGATE_ID_COLUMN", default = "aggregateid")]
    pub aggregate_id_column: String,
    #[envconfig(from = "OUTBOX_TYPE_COLUMN", default = "type")]
    pub type_column: String,
    #[envconfig(from = "OUTBOX_PAYLOAD_COLUMN", default = "payload")]
    pub payload_column: String,
    #[envconfig(from = "OUTBOX_TIMESTAMP_COLUMN", default = "timestamp")]
    pub timestamp_column: String,
    #[envconfig(from = "OUTBOX_POLL_INTERVAL_MILLIS", default = "1000")]
    pub poll_interval_millis: u64,
    #[envconfig(from = "OUTBOX_BATCH_SIZE", default = "100")]
    pub batch_size: usize,
    #[envconfig(from = "OUTBOX_MAX_DELIVERY_ATTEMPTS", default = "5")]
    pub max_delivery_attempts: u32,
}

impl OutboxConfig {
    /// Table and column names end up in SQL text, so only plain identifiers pass.
    pub fn validate(&self) -> Result<Unit, ConductorError> {
        let identifiers = [
            ("OUTBOX_TABLE", &self.table),
            ("OUTBOX_ID_COLUMN", &self.id_column),
            ("OUTBOX_AGGREGATE_TYPE_COLUMN", &self.aggregate_type_column),
            ("OUTBOX_AGGREGATE_ID_COLUMN", &self.aggregate_id_column),
            ("OUTBOX_TYPE_COLUMN", &self.type_column),
            ("OUTBOX_PAYLOAD_COLUMN", &self.payload_column),
            ("OUTBOX_TIMESTAMP_COLUMN", &self.timestamp_column),
        ];

        if let Some((key, value)) = identifiers
            .iter()
            .find(|(_, value)| !value.is_sql_identifier())
        {
            return Err(InternalError::configuration_error(
                &format!("{key} must be a plain SQL identifier, got '{value}'"),
                Some("outbox"),
            ));
        }

        if self.batch_size == 0 || self.max_delivery_attempts == 0 {
            return Err(InternalError::configuration_error(
                "OUTBOX_BATCH_SIZE and OUTBOX_MAX_DELIVERY_ATTEMPTS must be positive",
                Some("outbox"),
            ));
        }

        Ok(())
    }
}

impl Display for OutboxConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "OUTBOX_TABLE: {}", self.table)?;
        writeln!(f, "OUTBOX_ID_COLUMN: {}", self.id_column)?;
        writeln!(
            f,
            "OUTBOX_AGGREGATE_TYPE_COLUMN: {}",
            self.aggregate_type_column
        )?;
        writeln!(
            f,
            "OUTBOX_AGGREGATE_ID_COLUMN: {}",
            self.aggregate_id_column
        )?;
        writeln!(f, "OUTBOX_TYPE_COLUMN: {}", self.type_column)?;
        writeln!(f, "OUTBOX_PAYLOAD_COLUMN: {}", self.payload_column)?;
        writeln!(f, "OUTBOX_TIMESTAMP_COLUMN: {}", self.timestamp_column)?;
        writeln!(
            f,
            "OUTBOX_POLL_INTERVAL_MILLIS: {}",
            self.poll_interval_millis
        )?;
        writeln!(f, "OUTBOX_BATCH_SIZE: {}", self.batch_size)?;
        writeln!(
            f,
            "OUTBOX_MAX_DELIVERY_ATTEMPTS: {}",
            self.max_delivery_attempts
        )
    }
}

#[derive(Envconfig, Clone)]
pub struct WatcherConfig {
    #[envconfig(from = "WORKER_THREADS")]
    pub worker_threads: Option<usize>,
    #[envconfig(from = "METRICS_ADDRESS")]
    pub metrics_address: Option<SocketAddr>,
    #[envconfig(from = "OUTBOX_PROVIDER", default = "postgres")]
    pub outbox_provider: OutboxProvider,
    #[envconfig(nested = true)]
    pub outbox: OutboxConfig,
    #[envconfig(nested = true)]
    pub postgres: PostgresConfig,
    #[envconfig(nested = true)]
    pub environment: EnvironmentConfig,
}

impl Display for WatcherConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "WORKER_THREADS: {:?}", self.worker_threads)?;
        writeln!(f, "METRICS_ADDRESS: {:?}", self.metrics_address)?;
        writeln!(f, "OUTBOX_PROVIDER: {}", self.outbox_provider.as_ref())?;
        write!(f, "{}", self.outbox)?;
        write!(f, "{}", self.postgres)?;
        write!(f, "{}", self.environment)
    }
}
