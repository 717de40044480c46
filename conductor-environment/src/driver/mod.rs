mod kubernetes;
mod logger;

pub use kubernetes::K8sDriverImpl;
pub use logger::K8sDriverLogger;

use crate::domain::server::{DebeziumServer, LabelSelector};
use async_trait::async_trait;
use conductor_domain::{ConductorError, Unit};
use k8s_openapi::api::core::v1::Service;
use strum::{AsRefStr, EnumString};
use tokio::sync::mpsc;

/// Lines of a followed log. The channel closes when the log ends; dropping the
/// receiver releases the underlying watch.
pub type LogLines = mpsc::Receiver<Result<String, ConductorError>>;

/// The orchestrator primitives the conductor relies on.
#[async_trait]
pub trait K8sDriver: Send + Sync {
    /// Creates or updates the resource, keyed by its name.
    async fn apply(&self, server: &DebeziumServer) -> Result<DebeziumServer, ConductorError>;
    async fn list_servers(
        &self,
        selector: &LabelSelector,
    ) -> Result<Vec<DebeziumServer>, ConductorError>;
    async fn delete_servers(&self, selector: &LabelSelector) -> Result<Unit, ConductorError>;
    async fn list_services(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Service>, ConductorError>;
    /// Follows the log of the first pod of the named deployment, starting
    /// `tail_lines` lines back.
    async fn tail_logs(
        &self,
        namespace: &str,
        deployment: &str,
        tail_lines: i64,
    ) -> Result<LogLines, ConductorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum K8sDriverProvider {
    Kubernetes,
    Logger,
}
