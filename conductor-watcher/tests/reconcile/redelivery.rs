use crate::context::{pipeline, TestWatcher};
use conductor_domain::{Aggregate, ConductorError, Unit};
use conductor_watcher::domain::outbox::OutboxRecord;
use kube::ResourceExt;

#[tokio::test]
async fn test_retryable_failure_holds_back_same_aggregate() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    watcher.driver.fail_next_applies(1).await;

    let mut renamed = pipeline(5, "orders");
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &renamed)
        .await?;
    renamed.name = "orders v2".to_string();
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &renamed)
        .await?;
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 6, &pipeline(6, "customers"))
        .await?;

    let first = watcher.tailer.drain_once().await?;
    assert_eq!(first.deferred, 2);
    assert_eq!(first.delivered, 1);
    assert_eq!(watcher.outbox.pending().await.len(), 2);

    let names = watcher
        .driver
        .servers()
        .await
        .iter()
        .map(|server| server.name_any())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["customers".to_string()]);

    let second = watcher.tailer.drain_once().await?;
    assert_eq!(second.delivered, 2);
    assert!(watcher.outbox.pending().await.is_empty());

    let mut names = watcher
        .driver
        .servers()
        .await
        .iter()
        .map(|server| server.name_any())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(
        names,
        vec!["customers".to_string(), "orders-v2".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn test_held_aggregate_does_not_starve_later_batches() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::with_outbox(&[("OUTBOX_BATCH_SIZE", "2")]);
    watcher.driver.fail_next_applies(1).await;

    let mut orders = pipeline(5, "orders");
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &orders)
        .await?;
    orders.name = "orders v2".to_string();
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &orders)
        .await?;
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 6, &pipeline(6, "customers"))
        .await?;

    let first = watcher.tailer.drain_once().await?;
    assert_eq!(first.fetched, 3);
    assert_eq!(first.deferred, 2);
    assert_eq!(first.delivered, 1);

    let names = watcher
        .driver
        .servers()
        .await
        .iter()
        .map(|server| server.name_any())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["customers".to_string()]);

    let second = watcher.tailer.drain_once().await?;
    assert_eq!(second.delivered, 2);
    assert!(watcher.outbox.pending().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_pass_stops_after_a_full_batch() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::with_outbox(&[("OUTBOX_BATCH_SIZE", "2")]);
    for id in 1..=3 {
        watcher
            .outbox
            .push_update(Aggregate::Pipeline, id, &pipeline(id, &format!("p{id}")))
            .await?;
    }

    let first = watcher.tailer.drain_once().await?;
    assert_eq!(first.delivered, 2);
    assert_eq!(watcher.outbox.pending().await.len(), 1);

    let second = watcher.tailer.drain_once().await?;
    assert_eq!(second.delivered, 1);
    assert!(watcher.outbox.pending().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::with_max_attempts(2);
    watcher.driver.fail_next_applies(10).await;

    let id = watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &pipeline(5, "orders"))
        .await?;

    let first = watcher.tailer.drain_once().await?;
    assert_eq!(first.deferred, 1);
    assert_eq!(watcher.outbox.pending().await.len(), 1);

    let second = watcher.tailer.drain_once().await?;
    assert_eq!(second.dropped, 1);
    assert!(watcher.outbox.pending().await.is_empty());
    assert_eq!(watcher.outbox.acknowledged().await, vec![id]);

    Ok(())
}

#[tokio::test]
async fn test_configuration_failure_is_acknowledged() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    let mut broken = pipeline(5, "orders");
    broken.destination = None;

    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 5, &broken)
        .await?;
    watcher
        .outbox
        .push_update(Aggregate::Pipeline, 6, &pipeline(6, "customers"))
        .await?;

    let summary = watcher.tailer.drain_once().await?;

    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.delivered, 1);
    assert!(watcher.outbox.pending().await.is_empty());
    assert_eq!(watcher.driver.servers().await.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_unreadable_record_is_dropped() -> Result<Unit, ConductorError> {
    let watcher = TestWatcher::new();
    watcher
        .outbox
        .push(OutboxRecord::new(
            "pipeline",
            "five",
            "UPDATE",
            Some("{}".to_string()),
        ))
        .await;
    watcher.outbox.push_delete(Aggregate::Pipeline, 6).await;

    let summary = watcher.tailer.drain_once().await?;

    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.delivered, 1);
    assert!(watcher.outbox.pending().await.is_empty());

    Ok(())
}
