use super::{ControlSignalForwarder, LogReader, LogStreamer, RuntimeLocator};
use crate::{
    algebra::DeploymentSpecCompiler,
    domain::{config::EnvironmentConfig, server::DebeziumServer, server::LabelSelector},
    driver::{K8sDriver, K8sDriverImpl, K8sDriverLogger, K8sDriverProvider},
};
use conductor_domain::{
    ApplicationError, ConductorError, Pipeline, Signal, Unit, Vault,
};
use kube::ResourceExt;
use std::{sync::Arc, time::Duration};

pub const DEFAULT_NAMESPACE: &str = "default";

/// Entry point for everything the conductor does against the orchestrator.
#[derive(Clone)]
pub struct EnvironmentController {
    driver: Arc<dyn K8sDriver>,
    compiler: DeploymentSpecCompiler,
    locator: RuntimeLocator,
    forwarder: ControlSignalForwarder,
    namespace: String,
    tail_lines: i64,
    poll_interval: Duration,
}

impl EnvironmentController {
    pub fn new(
        config: &EnvironmentConfig,
        driver: Arc<dyn K8sDriver>,
    ) -> Result<Self, ConductorError> {
        let namespace = config
            .k8s_namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        Ok(Self {
            compiler: DeploymentSpecCompiler::new(config.pipeline.clone()),
            locator: RuntimeLocator::new(driver.clone(), namespace.clone()),
            forwarder: ControlSignalForwarder::new(config.signal_http_timeout_secs)?,
            driver,
            namespace,
            tail_lines: config.log_tail_lines,
            poll_interval: Duration::from_millis(config.log_poll_interval_millis),
        })
    }

    /// Builds the controller with the driver selected by `K8S_DRIVER`.
    pub async fn from_config(config: &EnvironmentConfig) -> Result<Self, ConductorError> {
        let driver: Arc<dyn K8sDriver> = match config.k8s_driver {
            K8sDriverProvider::Kubernetes => Arc::new(
                K8sDriverImpl::new(config.k8s_namespace.clone(), &config.k8s_field_manager)
                    .await?,
            ),
            K8sDriverProvider::Logger => Arc::new(K8sDriverLogger),
        };

        Self::new(config, driver)
    }

    pub fn vaults(&self) -> VaultController {
        VaultController
    }

    pub fn log_streamer(&self) -> LogStreamer {
        LogStreamer::new(self.poll_interval)
    }

    /// Creates or updates the resource running `pipeline`.
    ///
    /// Instances of the same pipeline under another name are removed first. A
    /// stopped pipeline stays stopped, renamed or not.
    pub async fn deploy(&self, pipeline: &Pipeline) -> Result<DebeziumServer, ConductorError> {
        let mut desired = self.compiler.compile(pipeline)?;
        let selector = LabelSelector::conductor_id(pipeline.id);

        let existing = self.driver.list_servers(&selector).await?;
        if existing
            .iter()
            .any(|server| server.name_any() != desired.name_any())
        {
            tracing::info!(
                "Removing stale instances of pipeline {} before deploying {}",
                pipeline.id,
                desired.name_any()
            );
            self.driver.delete_servers(&selector).await?;
        }
        if existing.iter().any(DebeziumServer::is_stopped) {
            desired.set_stopped(true);
        }

        let applied = self.driver.apply(&desired).await?;
        tracing::info!(
            "Deployed pipeline {} as {}",
            pipeline.id,
            applied.name_any()
        );

        Ok(applied)
    }

    pub async fn undeploy(&self, pipeline_id: i64) -> Result<Unit, ConductorError> {
        self.driver
            .delete_servers(&LabelSelector::conductor_id(pipeline_id))
            .await?;
        tracing::info!("Undeployed pipeline {pipeline_id}");

        Ok(())
    }

    pub async fn start(&self, pipeline_id: i64) -> Result<DebeziumServer, ConductorError> {
        self.change_status(pipeline_id, false).await
    }

    pub async fn stop(&self, pipeline_id: i64) -> Result<DebeziumServer, ConductorError> {
        self.change_status(pipeline_id, true).await
    }

    /// Sets the stop marker of the running instance and re-applies it.
    pub async fn change_status(
        &self,
        pipeline_id: i64,
        stop: bool,
    ) -> Result<DebeziumServer, ConductorError> {
        let mut server = self
            .locator
            .find_instance(pipeline_id)
            .await?
            .ok_or_else(|| pipeline_not_found(pipeline_id))?;

        server.set_stopped(stop);
        let applied = self.driver.apply(&server).await?;
        tracing::info!(
            "Pipeline {pipeline_id} {}",
            if stop { "stopped" } else { "started" }
        );

        Ok(applied)
    }

    pub async fn send_signal(&self, pipeline_id: i64, signal: &Signal) -> Result<Unit, ConductorError> {
        let server = self
            .locator
            .find_instance(pipeline_id)
            .await?
            .ok_or_else(|| pipeline_not_found(pipeline_id))?;

        let endpoint = self
            .locator
            .locate_control_endpoint(&server)
            .await?
            .ok_or_else(|| {
                ApplicationError::not_found(
                    "Unable to find pipeline instance to send the signal",
                    Some("endpoint"),
                )
            })?;

        self.forwarder.send(&endpoint, signal).await
    }

    /// Reader over the log of the pipeline's running instance. Nothing is
    /// opened until the first line is read.
    pub async fn log_reader(&self, pipeline_id: i64) -> Result<LogReader, ConductorError> {
        let server = self
            .locator
            .find_instance(pipeline_id)
            .await?
            .ok_or_else(|| pipeline_not_found(pipeline_id))?;

        Ok(LogReader::new(
            self.driver.clone(),
            server.namespace().unwrap_or_else(|| self.namespace.clone()),
            server.name_any(),
            self.tail_lines,
        ))
    }
}

fn pipeline_not_found(pipeline_id: i64) -> ConductorError {
    ApplicationError::not_found(
        &format!("Pipeline with id {pipeline_id} not found"),
        Some("pipeline"),
    )
}

/// Vault items are resolved by the runtime itself, so reconciling a vault only
/// records that it happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultController;

impl VaultController {
    pub async fn deploy(&self, vault: &Vault) -> Result<Unit, ConductorError> {
        tracing::info!("Vault {} ({}) reconciled", vault.id, vault.name);

        Ok(())
    }

    pub async fn undeploy(&self, vault_id: i64) -> Result<Unit, ConductorError> {
        tracing::info!("Vault {vault_id} removed");

        Ok(())
    }
}
