use conductor_domain::{ConductorError, ConfigProperties, Connection, ConnectionType};

/// Which side of a pipeline a legacy connection is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRole {
    Source,
    Sink,
}

/// Configuration namespace of a connection type. Every prefix ends with a dot.
pub fn connection_prefix(connection_type: ConnectionType) -> &'static str {
    match connection_type {
        ConnectionType::Oracle
        | ConnectionType::Mysql
        | ConnectionType::Mariadb
        | ConnectionType::Sqlserver
        | ConnectionType::Postgresql => "database.",
        ConnectionType::Mongodb => "mongodb.",
        ConnectionType::Kafka => "producer.",
        ConnectionType::AmazonKinesis => "kinesis.",
        ConnectionType::GooglePubSub => "pubsub.",
        ConnectionType::Http => "http.",
        ConnectionType::ApachePulsar => "pulsar.client.",
        ConnectionType::AzureEventsHubs => "eventhubs.",
        ConnectionType::Redis => "redis.",
        ConnectionType::NatsStreaming => "nats-streaming.",
        ConnectionType::NatsJetstream => "nats-jetstream.",
        ConnectionType::Pravega => "pravega.controller.",
        ConnectionType::Infinispan => "infinispan.",
        ConnectionType::ApacheRocketmq => "rocketmq.producer.",
        ConnectionType::RabbitmqStream => "rabbitmq.connection.",
        ConnectionType::RabbitmqNativeStream => "rabbitmqstream.connection.",
        ConnectionType::Milvus => "milvus.",
        ConnectionType::Qdrant => "qdrant.",
    }
}

fn source_key(key: &str) -> &str {
    match key {
        "username" => "user",
        "database" => "dbname",
        other => other,
    }
}

/// Namespaces the configuration of a legacy connection under its type prefix.
///
/// Source connections rename `username` and `database` to the keys the source
/// connectors read; sink keys are kept as they are. Fails with a configuration error
/// when the connection type is not known.
pub fn prefix_connection_config(
    connection: &Connection,
    role: ComponentRole,
) -> Result<ConfigProperties, ConductorError> {
    let prefix = connection_prefix(connection.kind()?);

    Ok(connection
        .config
        .iter()
        .map(|(key, value)| {
            let key = match role {
                ComponentRole::Source => source_key(key),
                ComponentRole::Sink => key.as_str(),
            };

            (format!("{prefix}{key}"), value.clone())
        })
        .collect())
}
