use crate::context::{pipeline, TestContext};
use conductor_domain::{ConductorError, Signal, Unit};
use mockito::{Matcher, Server as MockServer};
use serde_json::json;

fn signal() -> Signal {
    let mut signal = Signal::new(
        "ad-hoc-1",
        "execute-snapshot",
        r#"{"data-collections":["public.orders"]}"#,
    );
    signal
        .additional_data
        .insert("requestedBy".to_string(), json!("ops"));
    signal
}

#[tokio::test]
async fn test_signal_is_posted_to_instance() -> Result<Unit, ConductorError> {
    let mut mock_server = MockServer::new_async().await;
    let port = i32::from(mock_server.socket_address().port());

    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.expose_api("orders", "127.0.0.1", port).await;

    let request = mock_server
        .mock("POST", "/api/signals")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "id": "ad-hoc-1",
            "type": "execute-snapshot",
            "data": "{\"data-collections\":[\"public.orders\"]}",
            "additionalData": { "requestedBy": "ops" }
        })))
        .with_status(200)
        .create_async()
        .await;

    context.controller.send_signal(5, &signal()).await?;

    request.expect(1).assert_async().await;

    Ok(())
}

#[tokio::test]
async fn test_rejected_signal_is_transport_error() -> Result<Unit, ConductorError> {
    let mut mock_server = MockServer::new_async().await;
    let port = i32::from(mock_server.socket_address().port());

    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.expose_api("orders", "127.0.0.1", port).await;

    let request = mock_server
        .mock("POST", "/api/signals")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let error = context
        .controller
        .send_signal(5, &signal())
        .await
        .expect_err("Signal should be rejected");

    request.expect(1).assert_async().await;
    assert!(error.is_retryable());
    assert!(error
        .to_string()
        .contains(&format!("http://127.0.0.1:{port}/api/signals")));

    Ok(())
}

#[tokio::test]
async fn test_unreachable_instance_is_transport_error() -> Result<Unit, ConductorError> {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
        listener.local_addr().expect("Failed to get address").port()
    };

    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;
    context.expose_api("orders", "127.0.0.1", i32::from(port)).await;

    let error = context
        .controller
        .send_signal(5, &signal())
        .await
        .expect_err("Nothing listens on the port");

    assert!(error.to_string().contains("127.0.0.1"));

    Ok(())
}

#[tokio::test]
async fn test_signal_to_unknown_pipeline() {
    let context = TestContext::new();

    let error = context
        .controller
        .send_signal(42, &signal())
        .await
        .expect_err("Pipeline does not exist");

    assert!(error.is_not_found());
    assert!(error.to_string().contains("Pipeline with id 42 not found"));
}

#[tokio::test]
async fn test_signal_without_endpoint() -> Result<Unit, ConductorError> {
    let context = TestContext::new();
    context.controller.deploy(&pipeline(5, "orders")).await?;

    let error = context
        .controller
        .send_signal(5, &signal())
        .await
        .expect_err("Instance exposes no API");

    assert!(error.is_not_found());
    assert!(error
        .to_string()
        .contains("Unable to find pipeline instance to send the signal"));

    Ok(())
}
