use crate::context::{pipeline, TestWatcher};
use conductor_domain::{Aggregate, ConductorError, Unit, Vault};
use kube::ResourceExt;
use std::{collections::BTreeMap, time::Duration};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_update_deploys_pipeline() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &pipeline(5, "orders"))
        .await?;

    let summary = watcher.tailer.drain_once().await?;

    assert_eq!(summary.delivered, 1);
    let servers = watcher.driver.servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name_any(), "orders");
    assert_eq!(servers[0].conductor_id(), Some(5));
    assert!(watcher.outbox.pending().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_update_then_delete_leaves_nothing_deployed() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &pipeline(5, "orders"))
        .await?;
    watcher.outbox.push_delete(Aggregate::Pipeline, 5).await;

    let summary = watcher.tailer.drain_once().await?;

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.delivered, 2);
    assert!(watcher.driver.servers().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_redelivered_update_is_idempotent() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    let orders = pipeline(5, "orders");

    for _ in 0..3 {
        watcher
            .outbox
            .push_update(Aggregate::Pipeline, 5, &orders)
            .await?;
    }
    watcher.tailer.drain_once().await?;

    let servers = watcher.driver.servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(watcher.driver.apply_count().await, 3);

    Ok(())
}

#[tokio::test]
async fn test_vault_events_have_no_orchestrator_effect() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    let vault = Vault {
        id: 3,
        name: "secrets".to_string(),
        plaintext: false,
        items: BTreeMap::from([("password".to_string(), "s3cr3t".to_string())]),
    };

    watcher
        .outbox
        .push_update(Aggregate::Vault, 3, &vault)
        .await?;
    watcher.outbox.push_delete(Aggregate::Vault, 3).await;

    let summary = watcher.tailer.drain_once().await?;

    assert_eq!(summary.delivered, 2);
    assert_eq!(watcher.driver.apply_count().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_run_stops_on_cancel() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &pipeline(5, "orders"))
        .await?;

    let token = CancellationToken::new();
    let cancel = {
        let token = token.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        }
    };

    let (result, _) = tokio::join!(watcher.tailer.run(token), cancel);

    result?;
    assert_eq!(watcher.driver.servers().await.len(), 1);

    Ok(())
}
