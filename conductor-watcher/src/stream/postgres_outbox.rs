use super::ChangeStream;
use crate::domain::{
    config::OutboxConfig,
    outbox::{AggregateKey, OutboxRecord},
};
use async_trait::async_trait;
use conductor_domain::{ConductorError, InternalError, PostgresConfig, Unit};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use std::time::Duration;
use uuid::Uuid;

/// Tails the outbox table. Acknowledged records are deleted.
#[derive(Clone)]
pub struct PostgresOutbox {
    pool: PgPool,
    select: String,
    delete: String,
}

impl PostgresOutbox {
    pub async fn new(
        postgres: &PostgresConfig,
        outbox: &OutboxConfig,
    ) -> Result<Self, ConductorError> {
        outbox.validate()?;

        let options = PgConnectOptions::new()
            .username(&postgres.postgres_username)
            .password(&postgres.postgres_password)
            .host(&postgres.postgres_host)
            .ssl_mode(if postgres.postgres_ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Disable
            })
            .port(postgres.postgres_port);

        let pool = PgPoolOptions::new()
            .max_connections(postgres.postgres_pool_size)
            .acquire_timeout(Duration::from_millis(postgres.postgres_timeout))
            .connect_with(options.database(&postgres.postgres_name))
            .await
            .map_err(|e| {
                tracing::error!("Could not connect to the outbox database: {e}");
                InternalError::connection_error(&e.to_string(), Some("postgres"))
            })?;

        Ok(Self::with_pool(pool, outbox))
    }

    pub fn with_pool(pool: PgPool, outbox: &OutboxConfig) -> Self {
        Self {
            pool,
            select: select_statement(outbox),
            delete: delete_statement(outbox),
        }
    }
}

fn select_statement(outbox: &OutboxConfig) -> String {
    format!(
        "SELECT \"{id}\" AS id, \
         \"{aggregate_type}\"::text AS aggregate_type, \
         \"{aggregate_id}\"::text AS aggregate_id, \
         \"{event_type}\"::text AS event_type, \
         \"{timestamp}\"::timestamptz AS timestamp, \
         \"{payload}\"::text AS payload \
         FROM \"{table}\" AS record \
         WHERE NOT EXISTS (\
         SELECT 1 FROM unnest($2::text[], $3::text[]) AS held(aggregate_type, aggregate_id) \
         WHERE held.aggregate_type = record.\"{aggregate_type}\"::text \
         AND held.aggregate_id = record.\"{aggregate_id}\"::text) \
         ORDER BY \"{timestamp}\" ASC, \"{id}\" ASC LIMIT $1",
        id = outbox.id_column,
        aggregate_type = outbox.aggregate_type_column,
        aggregate_id = outbox.aggregate_id_column,
        event_type = outbox.type_column,
        timestamp = outbox.timestamp_column,
        payload = outbox.payload_column,
        table = outbox.table,
    )
}

fn delete_statement(outbox: &OutboxConfig) -> String {
    format!(
        "DELETE FROM \"{table}\" WHERE \"{id}\" = $1",
        table = outbox.table,
        id = outbox.id_column,
    )
}

fn outbox_error(e: sqlx::Error) -> ConductorError {
    match e {
        sqlx::Error::PoolTimedOut => InternalError::timeout(&e.to_string(), Some("postgres")),
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed => {
            InternalError::connection_error(&e.to_string(), Some("postgres"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            InternalError::deserialize_error(&e.to_string(), Some("outbox"))
        }
        _ => InternalError::io_err(&e.to_string(), Some("outbox")),
    }
}

#[async_trait]
impl ChangeStream for PostgresOutbox {
    async fn poll(
        &self,
        limit: usize,
        held: &[AggregateKey],
    ) -> Result<Vec<OutboxRecord>, ConductorError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let (held_types, held_ids): (Vec<String>, Vec<String>) = held.iter().cloned().unzip();

        sqlx::query_as::<_, OutboxRecord>(&self.select)
            .bind(limit)
            .bind(held_types)
            .bind(held_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(outbox_error)
    }

    async fn acknowledge(&self, id: Uuid) -> Result<Unit, ConductorError> {
        sqlx::query(&self.delete)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(outbox_error)?;

        Ok(())
    }
}
