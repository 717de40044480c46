use conductor_domain::{ConductorError, InternalError, Signal, Unit};
use std::time::Duration;

pub const SIGNALS_PATH: &str = "/api/signals";

/// Posts signals to the control API of a running instance.
#[derive(Clone)]
pub struct ControlSignalForwarder {
    client: reqwest::Client,
}

impl ControlSignalForwarder {
    pub fn new(timeout_secs: u64) -> Result<Self, ConductorError> {
        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                InternalError::configuration_error(&e.to_string(), Some("signal http client"))
            })?;

        Ok(Self { client })
    }

    /// Delivers `signal` to `endpoint`. Any non-2xx answer is a transport error.
    pub async fn send(&self, endpoint: &str, signal: &Signal) -> Result<Unit, ConductorError> {
        let url = format!("{}{SIGNALS_PATH}", endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(signal)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send signal {} to {url}: {e}", signal.id);
                InternalError::transport_error(&url, &e.to_string(), Some("request"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "Signal {} rejected by {url} with status {status}: {body}",
                signal.id
            );
            return Err(InternalError::transport_error(
                &url,
                &format!("Unexpected status {status}: {body}"),
                Some("status"),
            ));
        }

        tracing::info!("Signal {} delivered to {url}", signal.id);

        Ok(())
    }
}
