use anyhow::{Context, Result};
use conductor_domain::telemetry::{get_subscriber, init_subscriber};
use conductor_watcher::{domain::config::WatcherConfig, server::Server};
use dotenvy::dotenv;
use envconfig::Envconfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

fn main() -> Result<()> {
    dotenv().ok();
    let config = WatcherConfig::init_from_env()?;

    let subscriber = get_subscriber("conductor-watcher".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    info!("Starting conductor watcher with config:\n{config}");

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.unwrap_or(num_cpus::get()))
        .enable_all()
        .build()?
        .block_on(async move {
            if let Some(address) = config.metrics_address {
                PrometheusBuilder::new()
                    .with_http_listener(address)
                    .install()
                    .with_context(|| "Failed to install prometheus exporter")?;

                info!("Serving metrics on {address}");
            }

            let server = Server::init(&config).await?;

            info!("Watcher started");

            server.run().await
        })
}
