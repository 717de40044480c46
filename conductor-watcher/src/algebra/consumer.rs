use async_trait::async_trait;
use conductor_domain::{
    Aggregate, ChangeEvent, ConductorError, EventType, InternalError, Pipeline, Unit, Vault,
};
use conductor_environment::service::EnvironmentController;

/// Reacts to change events of the aggregates it declares.
///
/// Implementations must tolerate redelivery of the same event.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    fn name(&self) -> &str;

    fn consumed_aggregates(&self) -> &[Aggregate];

    fn consumed_types(&self) -> &[EventType] {
        &[EventType::Update, EventType::Delete]
    }

    fn accepts(&self, event: &ChangeEvent) -> bool {
        self.consumed_aggregates()
            .iter()
            .any(|aggregate| event.is_aggregate(*aggregate))
            && self.consumed_types().contains(&event.event_type)
    }

    async fn accept(&self, event: &ChangeEvent) -> Result<Unit, ConductorError>;
}

fn missing_payload(event: &ChangeEvent) -> ConductorError {
    InternalError::deserialize_error(
        &format!(
            "{} event for {} {} has no payload",
            event.event_type, event.aggregate_type, event.aggregate_id
        ),
        Some("change event"),
    )
}

/// Deploys pipelines on update and removes them on delete.
pub struct PipelineConsumer {
    controller: EnvironmentController,
}

impl PipelineConsumer {
    pub fn new(controller: EnvironmentController) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl EventConsumer for PipelineConsumer {
    fn name(&self) -> &str {
        "pipeline"
    }

    fn consumed_aggregates(&self) -> &[Aggregate] {
        &[Aggregate::Pipeline]
    }

    async fn accept(&self, event: &ChangeEvent) -> Result<Unit, ConductorError> {
        match event.event_type {
            EventType::Update => {
                let pipeline = event
                    .payload_as::<Pipeline>()?
                    .ok_or_else(|| missing_payload(event))?;

                if pipeline.id != event.aggregate_id {
                    tracing::warn!(
                        pipeline_id = pipeline.id,
                        aggregate_id = event.aggregate_id,
                        "Pipeline payload id differs from the outbox aggregate id"
                    );
                }

                self.controller.deploy(&pipeline).await.map(|_| ())
            }
            EventType::Delete => self.controller.undeploy(event.aggregate_id).await,
        }
    }
}

/// Routes vault changes to the vault controller.
pub struct VaultConsumer {
    controller: EnvironmentController,
}

impl VaultConsumer {
    pub fn new(controller: EnvironmentController) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl EventConsumer for VaultConsumer {
    fn name(&self) -> &str {
        "vault"
    }

    fn consumed_aggregates(&self) -> &[Aggregate] {
        &[Aggregate::Vault]
    }

    async fn accept(&self, event: &ChangeEvent) -> Result<Unit, ConductorError> {
        match event.event_type {
            EventType::Update => {
                let vault = event
                    .payload_as::<Vault>()?
                    .ok_or_else(|| missing_payload(event))?;

                self.controller.vaults().deploy(&vault).await
            }
            EventType::Delete => {
                self.controller
                    .vaults()
                    .undeploy(event.aggregate_id)
                    .await
            }
        }
    }
}
