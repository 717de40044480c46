use crate::context::{pipeline, TestContext};
use conductor_domain::{ConductorError, Unit};
use kube::ResourceExt;

#[tokio::test]
async fn test_stop_and_start_toggle_marker() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;

    let stopped = context.controller.stop(5).await?;
    assert!(stopped.is_stopped());
    assert!(context.driver.servers().await[0].is_stopped());

    let started = context.controller.start(5).await?;
    assert!(!started.is_stopped());
    assert!(!context.driver.servers().await[0].is_stopped());

    Ok(())
}

#[tokio::test]
async fn test_change_status_is_idempotent() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;

    context.controller.change_status(5, true).await?;
    context.controller.change_status(5, true).await?;

    let servers = context.driver.servers().await;
    assert_eq!(servers.len(), 1);
    assert!(servers[0].is_stopped());

    Ok(())
}

#[tokio::test]
async fn test_redeploy_keeps_instance_stopped() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    let mut pipeline = pipeline(5, "orders");
    context.controller.deploy(&pipeline).await?;
    context.controller.stop(5).await?;

    pipeline.log_level = "DEBUG".to_string();
    let redeployed = context.controller.deploy(&pipeline).await?;

    assert!(redeployed.is_stopped());

    Ok(())
}

#[tokio::test]
async fn test_renamed_pipeline_stays_stopped() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.controller.stop(5).await?;

    let renamed = context.controller.deploy(&pipeline(5, "orders v2")).await?;

    assert!(renamed.is_stopped());
    let servers = context.driver.servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name_any(), "orders-v2");
    assert!(servers[0].is_stopped());

    Ok(())
}

#[tokio::test]
async fn test_change_status_of_unknown_pipeline() {
    let context = TestContext::new();

    let error = context
        .controller
        .stop(42)
        .await
        .expect_err("Stopping an unknown pipeline should fail");

    assert!(error.is_not_found());
    assert!(error.to_string().contains("Pipeline with id 42 not found"));
}
