//! Line-oriented access to the log of a running instance.
//!
//! A [`LogReader`] holds an open watch on the orchestrator once the first line
//! is read. The watch is released by [`LogReader::close`] or when the reader is
//! dropped, whichever comes first.

use crate::driver::{K8sDriver, LogLines};
use conductor_domain::{ConductorError, InternalError, Unit};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::{mpsc::error::TryRecvError, Mutex};
use tokio_util::sync::CancellationToken;

pub struct LogReader {
    driver: Arc<dyn K8sDriver>,
    namespace: String,
    deployment: String,
    tail_lines: i64,
    lines: Mutex<Option<LogLines>>,
    ended: AtomicBool,
    closed: CancellationToken,
}

impl LogReader {
    pub fn new(
        driver: Arc<dyn K8sDriver>,
        namespace: impl Into<String>,
        deployment: impl Into<String>,
        tail_lines: i64,
    ) -> Self {
        Self {
            driver,
            namespace: namespace.into(),
            deployment: deployment.into(),
            tail_lines,
            lines: Mutex::new(None),
            ended: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.deployment
    }

    /// Next available line, or `None` when the log has no new data yet.
    ///
    /// Fails once the reader is closed or the log has ended.
    pub async fn read_line(&self) -> Result<Option<String>, ConductorError> {
        if self.is_closed() {
            return Err(closed_error(&self.deployment));
        }
        if self.has_ended() {
            return Err(ended_error(&self.deployment));
        }

        let mut guard = self.lines.lock().await;
        if guard.is_none() {
            tracing::debug!(
                "Opening log watch on {}/{}",
                self.namespace,
                self.deployment
            );
            let opened = self
                .driver
                .tail_logs(&self.namespace, &self.deployment, self.tail_lines)
                .await?;
            *guard = Some(opened);
        }
        let Some(lines) = guard.as_mut() else {
            return Err(closed_error(&self.deployment));
        };

        match lines.try_recv() {
            Ok(line) => line.map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                guard.take();
                self.ended.store(true, Ordering::Release);
                Err(ended_error(&self.deployment))
            }
        }
    }

    /// Waits for the next line. Returns `None` if the reader gets closed meanwhile.
    pub async fn next_line(&self, poll_interval: Duration) -> Result<Option<String>, ConductorError> {
        loop {
            if let Some(line) = self.read_line().await? {
                return Ok(Some(line));
            }

            tokio::select! {
                _ = self.closed.cancelled() => return Ok(None),
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    /// Releases the underlying watch. Calling it again has no effect.
    pub async fn close(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();

        if let Some(mut lines) = self.lines.lock().await.take() {
            lines.close();
        }

        tracing::debug!("Closed log reader for {}", self.deployment);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Whether the orchestrator ended the log.
    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

impl Drop for LogReader {
    fn drop(&mut self) {
        if !self.closed.is_cancelled() {
            tracing::debug!("Log reader for {} dropped without close", self.deployment);
            self.closed.cancel();
        }
    }
}

fn closed_error(name: &str) -> ConductorError {
    InternalError::io_err(&format!("Log reader for {name} is closed"), Some("closed"))
}

fn ended_error(name: &str) -> ConductorError {
    InternalError::io_err(&format!("Log of {name} ended"), Some("end of stream"))
}

/// Forwards lines from a [`LogReader`] to a sink until cancelled or the log ends.
pub struct LogStreamer {
    poll_interval: Duration,
}

impl LogStreamer {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Streams every line into `sink`. The reader is closed on every exit path.
    pub async fn stream<F>(
        &self,
        reader: LogReader,
        mut sink: F,
        token: CancellationToken,
    ) -> Result<Unit, ConductorError>
    where
        F: FnMut(String) + Send,
    {
        tracing::info!("Starting log streamer for {}", reader.name());

        let result = loop {
            let next = tokio::select! {
                _ = token.cancelled() => break Ok(()),
                next = reader.read_line() => next,
            };

            match next {
                Ok(Some(line)) => sink(line),
                Ok(None) => {
                    tokio::select! {
                        _ = token.cancelled() => break Ok(()),
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                Err(e) if reader.has_ended() => {
                    tracing::info!("Finished streaming from log {}: {e}", reader.name());
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!("Error streaming from log {}: {e}", reader.name());
                    break Err(e);
                }
            }
        };

        reader.close().await;

        result
    }
}
