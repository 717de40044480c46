use crate::{ConductorError, ConfigProperties, InternalError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Shared connection object referenced by a component. The type is kept as the raw
/// tag so that unknown tags surface when the connection is used, not when the
/// payload is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub connection_type: String,
    #[serde(default)]
    pub config: ConfigProperties,
}

impl Connection {
    pub fn kind(&self) -> Result<ConnectionType, ConductorError> {
        ConnectionType::from_str(&self.connection_type).map_err(|_| {
            InternalError::configuration_error(
                &format!(
                    "Unknown connection type '{}' for connection {}",
                    self.connection_type, self.id
                ),
                Some("connection type"),
            )
        })
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    Oracle,
    Mysql,
    Mariadb,
    Sqlserver,
    Postgresql,
    Mongodb,
    Kafka,
    AmazonKinesis,
    GooglePubSub,
    Http,
    ApachePulsar,
    AzureEventsHubs,
    Redis,
    NatsStreaming,
    NatsJetstream,
    Pravega,
    Infinispan,
    ApacheRocketmq,
    RabbitmqStream,
    RabbitmqNativeStream,
    Milvus,
    Qdrant,
}
