mod logger_outbox;
mod postgres_outbox;
mod tailer;

pub use logger_outbox::LoggerOutbox;
pub use postgres_outbox::PostgresOutbox;
pub use tailer::{DrainSummary, OutboxTailer};

use crate::domain::outbox::{AggregateKey, OutboxRecord};
use async_trait::async_trait;
use conductor_domain::{ConductorError, Unit};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// Source of committed change records, read in commit order.
///
/// A record stays visible to `poll` until it is acknowledged, which makes
/// delivery at-least-once. Records of the `held` aggregates are skipped.
#[async_trait]
pub trait ChangeStream: Send + Sync {
    async fn poll(
        &self,
        limit: usize,
        held: &[AggregateKey],
    ) -> Result<Vec<OutboxRecord>, ConductorError>;
    async fn acknowledge(&self, id: Uuid) -> Result<Unit, ConductorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum OutboxProvider {
    Postgres,
    Logger,
}
