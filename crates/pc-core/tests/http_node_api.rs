use pc_config::{AdminPortFile, DEFAULT_PORT_FILE};
use pc_core::{
    ADMIN_DISABLED_FAULT, HttpNodeApiFactory, NOT_CONFIGURED_FAULT, Node, NodeApi,
    NodeApiFactory, RpcError, TimeoutProfile,
};

use std::sync::Arc;

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok, pat};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/ssg/services/nodeapi";

fn node(home: &TempDir, fallback_endpoint: &str) -> Node {
    Node {
        name: "n1".to_string(),
        enabled: true,
        home: home.path().to_path_buf(),
        program: "gateway".to_string(),
        args: vec![],
        extra_args: vec![],
        port_file: DEFAULT_PORT_FILE.to_string(),
        fallback_endpoint: fallback_endpoint.to_string(),
    }
}

/// Node whose port file points at the mock server.
fn published_node(home: &TempDir, server: &MockServer) -> Node {
    AdminPortFile::write_in(home.path(), DEFAULT_PORT_FILE, Some(server.address().port())).unwrap();
    node(home, "http://127.0.0.1:1/unused")
}

fn client(node: &Node) -> Arc<dyn NodeApi> {
    HttpNodeApiFactory::plain()
        .create(node, TimeoutProfile::Fast)
        .unwrap()
}

#[tokio::test]
async fn given_published_port_when_pinged_then_posts_to_ping_endpoint() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/ping")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let api = client(&published_node(&home, &server));

    // When
    let result = api.ping().await;

    // Then
    assert_that!(result, ok(anything()));
}

#[tokio::test]
async fn given_published_port_when_shutdown_requested_then_posts_to_shutdown_endpoint() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/shutdown")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let api = client(&published_node(&home, &server));

    // When
    let result = api.shutdown().await;

    // Then
    assert_that!(result, ok(anything()));
}

#[tokio::test]
async fn given_admin_disabled_fault_when_pinged_then_admin_disabled() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/ping")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "fault": ADMIN_DISABLED_FAULT })))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let api = client(&published_node(&home, &server));

    // When
    let result = api.ping().await;

    // Then
    assert_that!(result, err(pat!(RpcError::AdminDisabled { .. })));
}

#[tokio::test]
async fn given_not_configured_fault_when_pinged_then_not_configured() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/ping")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "fault": NOT_CONFIGURED_FAULT })))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let api = client(&published_node(&home, &server));

    // When
    let result = api.ping().await;

    // Then
    assert_that!(result, err(pat!(RpcError::NotConfigured { .. })));
}

#[tokio::test]
async fn given_other_fault_when_pinged_then_fault_with_message() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/ping")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "fault": "cluster lock held" })))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let api = client(&published_node(&home, &server));

    // When
    let result = api.ping().await;

    // Then
    assert_that!(
        result,
        err(pat!(RpcError::Fault {
            message: eq("cluster lock held"),
            ..
        }))
    );
}

#[tokio::test]
async fn given_error_status_without_fault_body_when_pinged_then_unexpected() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/ping")))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let api = client(&published_node(&home, &server));

    // When
    let result = api.ping().await;

    // Then
    assert_that!(result, err(pat!(RpcError::Unexpected { .. })));
}

#[tokio::test]
async fn given_empty_port_file_when_pinged_then_admin_disabled_without_request() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    AdminPortFile::write_in(home.path(), DEFAULT_PORT_FILE, None).unwrap();
    let api = client(&node(&home, &format!("{}{API_PATH}", server.uri())));

    // When
    let result = api.ping().await;

    // Then
    assert_that!(result, err(pat!(RpcError::AdminDisabled { .. })));
}

#[tokio::test]
async fn given_missing_port_file_when_pinged_then_fallback_endpoint_used() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fallback/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let api = client(&node(&home, &format!("{}/fallback", server.uri())));

    // When
    let result = api.ping().await;

    // Then
    assert_that!(result, ok(anything()));
}

#[tokio::test]
async fn given_port_file_updated_when_pinged_again_then_new_port_used_by_same_client() {
    // Given
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for server in [&first, &second] {
        Mock::given(method("POST"))
            .and(path(format!("{API_PATH}/ping")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(server)
            .await;
    }
    let home = TempDir::new().unwrap();
    let api = client(&published_node(&home, &first));
    api.ping().await.unwrap();

    // When
    AdminPortFile::write_in(home.path(), DEFAULT_PORT_FILE, Some(second.address().port())).unwrap();
    let result = api.ping().await;

    // Then
    assert_that!(result, ok(anything()));
}

#[tokio::test]
async fn given_nothing_listening_when_pinged_then_connection_refused() {
    // Given
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let home = TempDir::new().unwrap();
    AdminPortFile::write_in(home.path(), DEFAULT_PORT_FILE, Some(port)).unwrap();
    let api = client(&node(&home, "http://127.0.0.1:1/unused"));

    // When
    let result = api.ping().await;

    // Then
    let error = result.unwrap_err();
    assert_that!(error.is_connection_refused(), eq(true));
    assert_that!(error.is_network(), eq(true));
}

#[test]
fn given_missing_client_certificate_when_client_created_then_unavailable() {
    // Given
    let home = TempDir::new().unwrap();
    let factory = HttpNodeApiFactory::with_identity(
        home.path().join("controller.crt"),
        home.path().join("controller.key"),
        true,
    );

    // When
    let result = factory
        .create(&node(&home, "https://127.0.0.1:2124/unused"), TimeoutProfile::Slow)
        .map(|_| ());

    // Then
    assert_that!(result, err(pat!(RpcError::Unavailable { .. })));
}
