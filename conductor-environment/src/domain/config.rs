use crate::driver::K8sDriverProvider;
use conductor_domain::PipelineConfig;
use envconfig::Envconfig;
use std::fmt::{Display, Formatter};

#[derive(Envconfig, Clone)]
pub struct EnvironmentConfig {
    #[envconfig(from = "K8S_DRIVER", default = "kubernetes")]
    pub k8s_driver: K8sDriverProvider,
    #[envconfig(from = "K8S_NAMESPACE")]
    pub k8s_namespace: Option<String>,
    #[envconfig(from = "K8S_FIELD_MANAGER", default = "conductor")]
    pub k8s_field_manager: String,
    #[envconfig(from = "LOG_TAIL_LINES", default = "100")]
    pub log_tail_lines: i64,
    #[envconfig(from = "LOG_POLL_INTERVAL_MILLIS", default = "1000")]
    pub log_poll_interval_millis: u64,
    #[envconfig(from = "SIGNAL_HTTP_TIMEOUT_SECS", default = "30")]
    pub signal_http_timeout_secs: u64,
    #[envconfig(nested = true)]
    pub pipeline: PipelineConfig,
}

impl Display for EnvironmentConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "K8S_DRIVER: {}", self.k8s_driver.as_ref())?;
        writeln!(f, "K8S_NAMESPACE: {:?}", self.k8s_namespace)?;
        writeln!(f, "K8S_FIELD_MANAGER: {}", self.k8s_field_manager)?;
        writeln!(f, "LOG_TAIL_LINES: {}", self.log_tail_lines)?;
        writeln!(
            f,
            "LOG_POLL_INTERVAL_MILLIS: {}",
            self.log_poll_interval_millis
        )?;
        writeln!(
            f,
            "SIGNAL_HTTP_TIMEOUT_SECS: {}",
            self.signal_http_timeout_secs
        )?;
        write!(f, "{}", self.pipeline)
    }
}
