use crate::context::{pipeline, TestContext};
use conductor_domain::{ConductorError, Unit};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_log_reader_reads_instance_log() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context
        .driver
        .push_log_line("orders", "Snapshot completed")
        .await;

    let reader = context.controller.log_reader(5).await?;
    assert_eq!(
        reader.read_line().await?.as_deref(),
        Some("Snapshot completed")
    );
    assert_eq!(reader.read_line().await?, None);

    reader.close().await;
    assert_eq!(context.driver.active_log_watchers("orders").await, 0);

    Ok(())
}

#[tokio::test]
async fn test_log_reader_of_unknown_pipeline() {
    let context = TestContext::new();

    let error = context
        .controller
        .log_reader(42)
        .await
        .err()
        .expect("Log reader of an unknown pipeline should fail");

    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_log_streamer_releases_watch_on_cancel() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.driver.push_log_line("orders", "Streaming started").await;

    let reader = context.controller.log_reader(5).await?;
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let lines = lines.clone();
        move |line: String| lines.lock().expect("Poisoned").push(line)
    };

    let token = CancellationToken::new();
    let streamer = context.controller.log_streamer();
    let task = {
        let token = token.clone();
        tokio::spawn(async move { streamer.stream(reader, sink, token).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();
    task.await.expect("Streamer panicked")?;

    assert_eq!(
        lines.lock().expect("Poisoned").clone(),
        vec!["Streaming started".to_string()]
    );
    assert_eq!(context.driver.active_log_watchers("orders").await, 0);

    Ok(())
}
