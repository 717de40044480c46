use crate::{
    algebra::{ChangeEventDispatcher, PipelineConsumer, VaultConsumer},
    domain::config::WatcherConfig,
    stream::{ChangeStream, LoggerOutbox, OutboxProvider, OutboxTailer, PostgresOutbox},
};
use anyhow::Result as AnyhowResult;
use conductor_environment::service::EnvironmentController;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Consumers for every reconciled aggregate, bound to `controller`.
pub fn dispatcher(controller: &EnvironmentController) -> ChangeEventDispatcher {
    let mut dispatcher = ChangeEventDispatcher::new();
    dispatcher
        .register(Arc::new(PipelineConsumer::new(controller.clone())))
        .register(Arc::new(VaultConsumer::new(controller.clone())));
    dispatcher
}

pub struct Server {
    tailer: OutboxTailer,
}

impl Server {
    pub async fn init(config: &WatcherConfig) -> AnyhowResult<Self> {
        config.outbox.validate()?;

        let controller = EnvironmentController::from_config(&config.environment).await?;

        let stream: Arc<dyn ChangeStream> = match config.outbox_provider {
            OutboxProvider::Postgres => {
                Arc::new(PostgresOutbox::new(&config.postgres, &config.outbox).await?)
            }
            OutboxProvider::Logger => Arc::new(LoggerOutbox),
        };

        Ok(Self {
            tailer: OutboxTailer::new(stream, dispatcher(&controller), &config.outbox),
        })
    }

    /// Tails the outbox until the process is interrupted.
    pub async fn run(&self) -> AnyhowResult<()> {
        let token = CancellationToken::new();
        let cloned_token = token.clone();

        ctrlc::try_set_handler(move || {
            tracing::info!("Received Ctrl+C, shutting down...");
            cloned_token.cancel();
        })?;

        self.tailer.run(token).await?;

        Ok(())
    }
}
