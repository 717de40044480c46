use super::{K8sDriver, LogLines};
use crate::domain::server::{DebeziumServer, LabelSelector};
use async_trait::async_trait;
use conductor_domain::{ConductorError, Unit};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tokio::sync::mpsc;

/// Driver for running without a cluster: every call is logged and nothing is kept.
pub struct K8sDriverLogger;

#[async_trait]
impl K8sDriver for K8sDriverLogger {
    async fn apply(&self, server: &DebeziumServer) -> Result<DebeziumServer, ConductorError> {
        tracing::info!(
            "Applying DebeziumServer {} with labels {:?}, using logger driver",
            server.name_any(),
            server.labels()
        );

        Ok(server.clone())
    }

    async fn list_servers(
        &self,
        selector: &LabelSelector,
    ) -> Result<Vec<DebeziumServer>, ConductorError> {
        tracing::info!("Listing DebeziumServers with {selector}, using logger driver");

        Ok(vec![])
    }

    async fn delete_servers(&self, selector: &LabelSelector) -> Result<Unit, ConductorError> {
        tracing::info!("Deleting DebeziumServers with {selector}, using logger driver");

        Ok(())
    }

    async fn list_services(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Service>, ConductorError> {
        tracing::info!("Listing services in {namespace} with {selector}, using logger driver");

        Ok(vec![])
    }

    async fn tail_logs(
        &self,
        namespace: &str,
        deployment: &str,
        _tail_lines: i64,
    ) -> Result<LogLines, ConductorError> {
        tracing::info!("Tailing logs of {namespace}/{deployment}, using logger driver");

        let (_, rx) = mpsc::channel(1);
        Ok(rx)
    }
}
