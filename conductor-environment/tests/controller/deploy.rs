use crate::context::{pipeline, TestContext};
use conductor_domain::{ConductorError, Unit};
use conductor_environment::domain::server::LABEL_CONDUCTOR_ID;
use kube::ResourceExt;

#[tokio::test]
async fn test_deploy_is_idempotent() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    let pipeline = pipeline(5, "orders");

    let first = context.controller.deploy(&pipeline).await?;
    let second = context.controller.deploy(&pipeline).await?;

    let servers = context.driver.servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(first.spec, second.spec);
    assert_eq!(servers[0].name_any(), "orders");
    assert_eq!(
        servers[0].labels().get(LABEL_CONDUCTOR_ID).map(String::as_str),
        Some("5")
    );

    Ok(())
}

#[tokio::test]
async fn test_redeploy_picks_up_changes() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    let mut pipeline = pipeline(5, "orders");
    context.controller.deploy(&pipeline).await?;

    pipeline.log_level = "DEBUG".to_string();
    context.controller.deploy(&pipeline).await?;

    let servers = context.driver.servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(
        servers[0].spec.quarkus.config.get("log.level"),
        Some(&serde_json::json!("DEBUG"))
    );

    Ok(())
}

#[tokio::test]
async fn test_rename_replaces_stale_instance() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.controller.deploy(&pipeline(5, "orders v2")).await?;

    let names = context
        .driver
        .servers()
        .await
        .iter()
        .map(|server| server.name_any())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["orders-v2".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_deploy_keeps_other_pipelines() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.controller.deploy(&pipeline(6, "customers")).await?;

    assert_eq!(context.driver.servers().await.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_undeploy_is_idempotent() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.controller.deploy(&pipeline(6, "customers")).await?;

    context.controller.undeploy(5).await?;
    context.controller.undeploy(5).await?;

    let servers = context.driver.servers().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name_any(), "customers");

    Ok(())
}

#[tokio::test]
async fn test_deploy_without_destination_fails() {
    let context = TestContext::new();
    let mut pipeline = pipeline(5, "orders");
    pipeline.destination = None;

    let error = context
        .controller
        .deploy(&pipeline)
        .await
        .expect_err("Deploy should fail without destination");

    assert!(error.is_configuration());
    assert!(!error.is_retryable());
    assert_eq!(context.driver.apply_count().await, 0);
}

#[tokio::test]
async fn test_orchestrator_failure_is_retryable() {
    let context = TestContext::new();
    context.driver.fail_next_applies(1).await;

    let error = context
        .controller
        .deploy(&pipeline(5, "orders"))
        .await
        .expect_err("Apply should fail");
    assert!(error.is_retryable());

    assert!(context.controller.deploy(&pipeline(5, "orders")).await.is_ok());
    assert_eq!(context.driver.servers().await.len(), 1);
}
