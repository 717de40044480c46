//! In-process stand-ins for the orchestrator, for tests and local runs.

use crate::{
    domain::server::{DebeziumServer, LabelSelector},
    driver::{K8sDriver, LogLines},
};
use async_trait::async_trait;
use conductor_domain::{ConductorError, InternalError, Unit};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use kube::{api::ObjectMeta, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{mpsc, Mutex};

pub use crate::service::DEFAULT_NAMESPACE;

/// Keeps resources in memory, keyed by namespace and name like the API server does.
#[derive(Default)]
pub struct InMemoryK8sDriver {
    servers: Mutex<Vec<DebeziumServer>>,
    services: Mutex<Vec<Service>>,
    logs: Mutex<HashMap<String, Vec<String>>>,
    watchers: Mutex<HashMap<String, Vec<mpsc::Sender<Result<String, ConductorError>>>>>,
    failing_applies: Mutex<usize>,
    applies: Mutex<usize>,
}

impl InMemoryK8sDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service in `namespace` with the given labels and ports.
    pub async fn add_service(
        &self,
        namespace: &str,
        name: &str,
        labels: BTreeMap<String, String>,
        ports: &[i32],
    ) {
        let service = Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels),
                ..ObjectMeta::default()
            },
            spec: Some(ServiceSpec {
                ports: Some(
                    ports
                        .iter()
                        .map(|port| ServicePort {
                            port: *port,
                            ..ServicePort::default()
                        })
                        .collect(),
                ),
                ..ServiceSpec::default()
            }),
            ..Service::default()
        };

        self.services.lock().await.push(service);
    }

    /// Appends a log line to a deployment, delivering it to readers already following it.
    pub async fn push_log_line(&self, deployment: &str, line: &str) {
        self.logs
            .lock()
            .await
            .entry(deployment.to_string())
            .or_default()
            .push(line.to_string());

        if let Some(watchers) = self.watchers.lock().await.get_mut(deployment) {
            watchers.retain(|tx| tx.try_send(Ok(line.to_string())).is_ok());
        }
    }

    /// Ends every log being followed for a deployment.
    pub async fn end_logs(&self, deployment: &str) {
        self.watchers.lock().await.remove(deployment);
    }

    pub async fn active_log_watchers(&self, deployment: &str) -> usize {
        self.watchers
            .lock()
            .await
            .get(deployment)
            .map(|watchers| watchers.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or_default()
    }

    /// Makes the next `count` applies fail with an orchestrator error.
    pub async fn fail_next_applies(&self, count: usize) {
        *self.failing_applies.lock().await = count;
    }

    pub async fn servers(&self) -> Vec<DebeziumServer> {
        self.servers.lock().await.clone()
    }

    pub async fn apply_count(&self) -> usize {
        *self.applies.lock().await
    }
}

#[async_trait]
impl K8sDriver for InMemoryK8sDriver {
    async fn apply(&self, server: &DebeziumServer) -> Result<DebeziumServer, ConductorError> {
        {
            let mut failing = self.failing_applies.lock().await;
            if *failing > 0 {
                *failing -= 1;
                return Err(InternalError::orchestrator_error(
                    "apply rejected by the API server",
                    Some("unavailable"),
                ));
            }
        }

        let mut applied = server.clone();
        if applied.metadata.namespace.is_none() {
            applied.metadata.namespace = Some(DEFAULT_NAMESPACE.to_string());
        }

        let mut servers = self.servers.lock().await;
        servers.retain(|s| {
            !(s.name_any() == applied.name_any() && s.namespace() == applied.namespace())
        });
        servers.push(applied.clone());
        *self.applies.lock().await += 1;

        Ok(applied)
    }

    async fn list_servers(
        &self,
        selector: &LabelSelector,
    ) -> Result<Vec<DebeziumServer>, ConductorError> {
        Ok(self
            .servers
            .lock()
            .await
            .iter()
            .filter(|server| selector.matches(server.labels()))
            .cloned()
            .collect())
    }

    async fn delete_servers(&self, selector: &LabelSelector) -> Result<Unit, ConductorError> {
        self.servers
            .lock()
            .await
            .retain(|server| !selector.matches(server.labels()));

        Ok(())
    }

    async fn list_services(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Service>, ConductorError> {
        Ok(self
            .services
            .lock()
            .await
            .iter()
            .filter(|service| {
                service.namespace().as_deref() == Some(namespace)
                    && selector.matches(service.labels())
            })
            .cloned()
            .collect())
    }

    async fn tail_logs(
        &self,
        _namespace: &str,
        deployment: &str,
        tail_lines: i64,
    ) -> Result<LogLines, ConductorError> {
        let backlog = self
            .logs
            .lock()
            .await
            .get(deployment)
            .cloned()
            .unwrap_or_default();
        let skip = backlog
            .len()
            .saturating_sub(usize::try_from(tail_lines).unwrap_or_default());

        let (tx, rx) = mpsc::channel(backlog.len().max(1) + 64);
        for line in backlog.into_iter().skip(skip) {
            let _ = tx.try_send(Ok(line));
        }

        self.watchers
            .lock()
            .await
            .entry(deployment.to_string())
            .or_default()
            .push(tx);

        Ok(rx)
    }
}
