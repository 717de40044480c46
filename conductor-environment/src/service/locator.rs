use crate::{
    domain::server::{DebeziumServer, LabelSelector},
    driver::K8sDriver,
};
use conductor_domain::ConductorError;
use kube::ResourceExt;
use std::sync::Arc;

/// Finds the running resource of a pipeline and the address of its control API.
#[derive(Clone)]
pub struct RuntimeLocator {
    driver: Arc<dyn K8sDriver>,
    namespace: String,
}

impl RuntimeLocator {
    pub fn new(driver: Arc<dyn K8sDriver>, namespace: impl Into<String>) -> Self {
        Self {
            driver,
            namespace: namespace.into(),
        }
    }

    /// First resource labelled with the pipeline id, if any.
    pub async fn find_instance(
        &self,
        pipeline_id: i64,
    ) -> Result<Option<DebeziumServer>, ConductorError> {
        let servers = self
            .driver
            .list_servers(&LabelSelector::conductor_id(pipeline_id))
            .await?;

        Ok(servers.into_iter().next())
    }

    /// `http://<service>:<port>` of the API service exposed for the instance.
    ///
    /// Returns `None` when no service carries the instance's API labels or the
    /// first such service exposes no port.
    pub async fn locate_control_endpoint(
        &self,
        server: &DebeziumServer,
    ) -> Result<Option<String>, ConductorError> {
        let namespace = server
            .namespace()
            .unwrap_or_else(|| self.namespace.clone());
        let services = self
            .driver
            .list_services(&namespace, &LabelSelector::api_service(&server.name_any()))
            .await?;

        let Some(service) = services.into_iter().next() else {
            tracing::debug!(
                "No API service found for instance {} in {namespace}",
                server.name_any()
            );
            return Ok(None);
        };

        let port = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .and_then(|ports| ports.first())
            .map(|port| port.port);

        Ok(port.map(|port| format!("http://{}:{port}", service.name_any())))
    }
}
