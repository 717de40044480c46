use super::{K8sDriver, LogLines};
use crate::domain::server::{DebeziumServer, LabelSelector};
use async_trait::async_trait;
use conductor_domain::{ApplicationError, ConductorError, InternalError, Unit};
use futures::{AsyncBufReadExt, TryStreamExt};
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Pod, Service},
};
use kube::{
    api::{DeleteParams, ListParams, LogParams, Patch, PatchParams},
    Api, Client, ResourceExt,
};
use tokio::sync::mpsc;

const LOG_BUFFER_LINES: usize = 256;

pub struct K8sDriverImpl {
    client: Client,
    namespace: Option<String>,
    field_manager: String,
}

impl K8sDriverImpl {
    pub async fn new(
        namespace: Option<String>,
        field_manager: impl Into<String>,
    ) -> Result<Self, ConductorError> {
        let client = Client::try_default().await.map_err(|e| {
            tracing::error!("Could not connect to kubernetes: {e}");
            InternalError::connection_error("Could not connect to kubernetes", Some("kube client"))
        })?;

        Ok(Self {
            client,
            namespace,
            field_manager: field_manager.into(),
        })
    }

    fn servers(&self) -> Api<DebeziumServer> {
        match &self.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::default_namespaced(self.client.clone()),
        }
    }
}

#[async_trait]
impl K8sDriver for K8sDriverImpl {
    async fn apply(&self, server: &DebeziumServer) -> Result<DebeziumServer, ConductorError> {
        let name = server.metadata.name.as_deref().ok_or_else(|| {
            InternalError::invalid_argument("DebeziumServer has no name", Some("apply"))
        })?;

        let mut desired = server.clone();
        desired.metadata.managed_fields = None;
        desired.metadata.resource_version = None;
        desired.metadata.uid = None;
        desired.metadata.creation_timestamp = None;

        let params = PatchParams::apply(&self.field_manager).force();
        let applied = self
            .servers()
            .patch(name, &params, &Patch::Apply(&desired))
            .await?;

        tracing::debug!(
            "Applied DebeziumServer {} in {:?}",
            applied.name_any(),
            applied.namespace()
        );

        Ok(applied)
    }

    async fn list_servers(
        &self,
        selector: &LabelSelector,
    ) -> Result<Vec<DebeziumServer>, ConductorError> {
        let params = ListParams::default().labels(&selector.to_string());

        Ok(self.servers().list(&params).await?.items)
    }

    async fn delete_servers(&self, selector: &LabelSelector) -> Result<Unit, ConductorError> {
        let params = ListParams::default().labels(&selector.to_string());

        self.servers()
            .delete_collection(&DeleteParams::default(), &params)
            .await?;

        Ok(())
    }

    async fn list_services(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Service>, ConductorError> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(&selector.to_string());

        Ok(services.list(&params).await?.items)
    }

    async fn tail_logs(
        &self,
        namespace: &str,
        deployment: &str,
        tail_lines: i64,
    ) -> Result<LogLines, ConductorError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let found = deployments.get_opt(deployment).await?.ok_or_else(|| {
            ApplicationError::not_found(
                &format!("Deployment {deployment} not found in {namespace}"),
                Some("deployment"),
            )
        })?;

        let selector = found
            .spec
            .and_then(|spec| spec.selector.match_labels)
            .unwrap_or_default()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods
            .list(&ListParams::default().labels(&selector))
            .await?
            .items
            .into_iter()
            .next()
            .ok_or_else(|| {
                ApplicationError::not_found(
                    &format!("No running pod for deployment {deployment}"),
                    Some("pod"),
                )
            })?;

        let pod_name = pod.name_any();
        let params = LogParams {
            follow: true,
            tail_lines: Some(tail_lines),
            ..LogParams::default()
        };

        let (tx, rx) = mpsc::channel(LOG_BUFFER_LINES);

        tokio::spawn(async move {
            let reader = match pods.log_stream(&pod_name, &params).await {
                Ok(reader) => reader,
                Err(e) => {
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            };

            let mut lines = Box::pin(reader.lines());

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    next = lines.try_next() => match next {
                        Ok(Some(line)) => {
                            if tx.send(Ok(line)).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = tx
                                .send(Err(InternalError::io_err(&e.to_string(), Some("log stream"))))
                                .await;
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Log watch on pod {pod_name} released");
        });

        Ok(rx)
    }
}
