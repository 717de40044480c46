use crate::{ConductorError, InternalError, Unit};
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

pub struct Telemetry<T>
where
    T: SubscriberExt + Send + Sync + 'static,
{
    pub subscriber: T,
}

/// Builds the process subscriber: bunyan-formatted JSON lines written to `sink`,
/// filtered by `RUST_LOG` when set and by `env_filter` otherwise.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
) -> Telemetry<impl SubscriberExt + Send + Sync + 'static>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let formatting_layer: BunyanFormattingLayer<Sink> = BunyanFormattingLayer::new(name, sink);

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    Telemetry {
        subscriber: Registry::default()
            .with(filter_layer)
            .with(JsonStorageLayer)
            .with(formatting_layer),
    }
}

/// Routes `log` records into tracing and installs the subscriber process-wide.
/// Fails if a global subscriber was already set.
pub fn init_subscriber(
    telemetry: Telemetry<impl SubscriberExt + Send + Sync + 'static>,
) -> Result<Unit, ConductorError> {
    LogTracer::init().map_err(|e| {
        InternalError::configuration_error(&format!("Failed to set logger: {e}"), Some("telemetry"))
    })?;

    set_global_default(telemetry.subscriber).map_err(|e| {
        InternalError::configuration_error(
            &format!("Failed to set subscriber: {e}"),
            Some("telemetry"),
        )
    })
}
