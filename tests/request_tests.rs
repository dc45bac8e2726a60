//! Integration tests for the single-response request path.
//!
//! These tests drive the client through a scripted transport to verify
//! request construction, the retry policy, response classification, and
//! the log event sequence.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use common::{test_client, MockBody, MockReply, MockTransport, RecordingLogger, TEST_RETRY_WAIT};
use graphql_http_client::{
    ClientConfig, ClientError, GraphqlClient, HttpTransport, LogEvent, Logger, RequestOptions,
    RETRY_WAIT_TIME,
};

// ============================================================================
// Request Construction Tests
// ============================================================================

#[tokio::test]
async fn test_single_json_request_success() {
    let transport = MockTransport::new(vec![MockReply::json(
        200,
        "OK",
        r#"{"data":{"shop":{"name":"Test shop"}}}"#,
    )]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(transport.calls(), 1);
    let request = &transport.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "https://shop.example.com/graphql");
    assert_eq!(request.body, r#"{"query":"query { shop { name } }"}"#);
    assert_eq!(
        request.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );

    assert_eq!(response.data, Some(json!({"shop": {"name": "Test shop"}})));
    assert!(response.errors.is_none());
}

#[tokio::test]
async fn test_variables_are_omitted_when_absent() {
    let transport = MockTransport::new(vec![MockReply::json(200, "OK", r#"{"data":{}}"#)]);
    let client = test_client(Arc::clone(&transport), 0);

    client.request("query { shop { name } }", None).await.unwrap();

    assert!(!transport.requests()[0].body.contains("variables"));
}

#[tokio::test]
async fn test_variables_are_serialized_when_present() {
    let transport = MockTransport::new(vec![MockReply::json(200, "OK", r#"{"data":{}}"#)]);
    let client = test_client(Arc::clone(&transport), 0);

    let options = RequestOptions::new().variables(json!({"id": "gid://shop/Product/123"}));
    client
        .request("query Product($id: ID!) { product(id: $id) { title } }", Some(options))
        .await
        .unwrap();

    let body: serde_json::Value = serde_json::from_str(&transport.requests()[0].body).unwrap();
    assert_eq!(body["variables"]["id"], "gid://shop/Product/123");
}

#[tokio::test]
async fn test_default_headers_merge_under_per_call_overrides() {
    let transport = MockTransport::new(vec![MockReply::json(200, "OK", r#"{"data":{}}"#)]);
    let config = ClientConfig::builder("https://shop.example.com/graphql")
        .header("X-Access-Token", "default-token")
        .header("X-Trace", vec!["a", "b"])
        .build()
        .unwrap();
    let client = GraphqlClient::new(config)
        .with_transport(Arc::clone(&transport) as Arc<dyn HttpTransport>);

    let options = RequestOptions::new().header("X-Access-Token", "override-token");
    client.request("query { shop { name } }", Some(options)).await.unwrap();

    let headers = transport.requests()[0].headers.clone();
    assert_eq!(
        headers.get("X-Access-Token").map(String::as_str),
        Some("override-token")
    );
    // List values are comma-joined on the wire.
    assert_eq!(headers.get("X-Trace").map(String::as_str), Some("a, b"));
}

#[tokio::test]
async fn test_per_call_url_override() {
    let transport = MockTransport::new(vec![MockReply::json(200, "OK", r#"{"data":{}}"#)]);
    let client = test_client(Arc::clone(&transport), 0);

    let options = RequestOptions::new().url("https://other.example.com/graphql");
    client.request("query { shop { name } }", Some(options)).await.unwrap();

    assert_eq!(transport.requests()[0].url, "https://other.example.com/graphql");
}

// ============================================================================
// Guard Tests
// ============================================================================

#[tokio::test]
async fn test_request_rejects_defer_operations_without_fetching() {
    let transport = MockTransport::new(vec![]);
    let client = test_client(Arc::clone(&transport), 0);

    let result = client
        .request("query { shop { id ... @defer { name } } }", None)
        .await;

    assert!(matches!(result, Err(ClientError::DeferredOperation)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_invalid_retries_never_reach_the_transport() {
    let transport = MockTransport::new(vec![]);
    let client = test_client(Arc::clone(&transport), 0);

    let options = RequestOptions::new().retries(4);
    let result = client.request("query { shop { name } }", Some(options)).await;

    assert!(matches!(
        result,
        Err(ClientError::InvalidRetries { retries: 4 })
    ));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_fetch_validates_retries_too() {
    let transport = MockTransport::new(vec![]);
    let client = test_client(Arc::clone(&transport), 0);

    let options = RequestOptions::new().retries(10);
    let result = client.fetch("query { shop { name } }", Some(options)).await;

    assert!(matches!(result, Err(ClientError::InvalidRetries { .. })));
    assert_eq!(transport.calls(), 0);
}

// ============================================================================
// Retry Policy Tests
// ============================================================================

#[tokio::test]
async fn test_retry_on_429_then_success() {
    let transport = MockTransport::new(vec![
        MockReply::json(429, "Too Many Requests", ""),
        MockReply::json(200, "OK", r#"{"data":{"shop":{"name":"shop1"}}}"#),
    ]);
    let logger = RecordingLogger::new();
    let config = ClientConfig::builder("https://shop.example.com/graphql")
        .retries(2)
        .retry_wait_time(TEST_RETRY_WAIT)
        .build()
        .unwrap();
    let client = GraphqlClient::new(config)
        .with_transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
        .with_logger(Arc::clone(&logger) as Arc<dyn Logger>);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(transport.calls(), 2);
    assert_eq!(response.data, Some(json!({"shop": {"name": "shop1"}})));
    assert!(response.errors.is_none());

    let events = logger.events();
    assert_eq!(events.len(), 2);
    match &events[0] {
        LogEvent::HttpRetry {
            retry_attempt,
            max_retries,
            last_response,
            ..
        } => {
            assert_eq!(*retry_attempt, 1);
            assert_eq!(*max_retries, 2);
            assert_eq!(last_response.as_ref().unwrap().status, 429);
        }
        other => panic!("expected HTTP-Retry event, got {other:?}"),
    }
    match &events[1] {
        LogEvent::HttpResponse { response, .. } => assert_eq!(response.status, 200),
        other => panic!("expected HTTP-Response event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_retry_exhaustion_on_503_returns_last_response() {
    let transport = MockTransport::new(vec![
        MockReply::json(503, "Service Unavailable", ""),
        MockReply::json(503, "Service Unavailable", ""),
    ]);
    let logger = RecordingLogger::new();
    let config = ClientConfig::builder("https://shop.example.com/graphql")
        .retries(1)
        .retry_wait_time(TEST_RETRY_WAIT)
        .build()
        .unwrap();
    let client = GraphqlClient::new(config)
        .with_transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
        .with_logger(Arc::clone(&logger) as Arc<dyn Logger>);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(transport.calls(), 2);
    let errors = response.errors.unwrap();
    assert_eq!(errors.network_status_code, Some(503));
    assert_eq!(
        errors.message.as_deref(),
        Some("GraphQL Client: Service Unavailable")
    );
    assert_eq!(errors.response.unwrap().status, 503);

    // Only the retry event is logged on this path; no HTTP-Response event
    // after retriable-status exhaustion.
    let events = logger.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], LogEvent::HttpRetry { retry_attempt: 1, .. }));
}

#[tokio::test]
async fn test_aborts_all_the_way_through() {
    let transport = MockTransport::new(vec![
        MockReply::Abort("connection closed"),
        MockReply::Abort("connection closed"),
        MockReply::Abort("connection closed"),
    ]);
    let client = test_client(Arc::clone(&transport), 2);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(transport.calls(), 3);
    let message = response.errors.unwrap().message.unwrap();
    assert!(message.starts_with(
        "GraphQL Client: Attempted maximum number of 2 network retries. Last message - "
    ));
    assert!(message.ends_with("connection closed"));
}

#[tokio::test]
async fn test_abort_with_zero_retries_fails_immediately() {
    let transport = MockTransport::new(vec![MockReply::Abort("connection closed")]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(
        response.errors.unwrap().message.as_deref(),
        Some("GraphQL Client: connection closed")
    );
}

#[tokio::test]
async fn test_terminal_statuses_are_not_retried() {
    for (status, status_text) in [(400, "Bad Request"), (500, "Internal Server Error")] {
        let transport = MockTransport::new(vec![MockReply::json(status, status_text, "")]);
        let client = test_client(Arc::clone(&transport), 3);

        let response = client.request("query { shop { name } }", None).await.unwrap();

        assert_eq!(transport.calls(), 1, "status {status} must not retry");
        let errors = response.errors.unwrap();
        assert_eq!(errors.network_status_code, Some(status));
        assert_eq!(
            errors.message,
            Some(format!("GraphQL Client: {status_text}"))
        );
    }
}

#[tokio::test]
async fn test_consecutive_attempts_are_separated_by_the_wait_time() {
    let transport = MockTransport::new(vec![
        MockReply::json(503, "Service Unavailable", ""),
        MockReply::json(503, "Service Unavailable", ""),
        MockReply::json(503, "Service Unavailable", ""),
    ]);
    let wait = Duration::from_millis(50);
    let config = ClientConfig::builder("https://shop.example.com/graphql")
        .retries(2)
        .retry_wait_time(wait)
        .build()
        .unwrap();
    let client = GraphqlClient::new(config)
        .with_transport(Arc::clone(&transport) as Arc<dyn HttpTransport>);

    let started = Instant::now();
    client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(transport.calls(), 3);
    assert!(started.elapsed() >= wait * 2);
}

#[test]
fn test_default_retry_wait_time_is_one_second() {
    assert_eq!(RETRY_WAIT_TIME, Duration::from_millis(1000));
    let config = ClientConfig::builder("https://shop.example.com/graphql")
        .build()
        .unwrap();
    assert_eq!(config.retry_wait_time(), RETRY_WAIT_TIME);
}

// ============================================================================
// Response Classification Tests
// ============================================================================

#[tokio::test]
async fn test_unexpected_content_type_is_terminal() {
    let transport = MockTransport::new(vec![MockReply::Response {
        status: 200,
        status_text: "OK",
        content_type: "text/html",
        body: MockBody::Text("<html></html>".to_string()),
    }]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    let errors = response.errors.unwrap();
    assert_eq!(errors.network_status_code, Some(200));
    assert_eq!(
        errors.message.as_deref(),
        Some("GraphQL Client: Response returned unexpected Content-Type: text/html")
    );
    assert!(errors.response.is_some());
}

#[tokio::test]
async fn test_graphql_errors_in_payload_keep_partial_data() {
    let transport = MockTransport::new(vec![MockReply::json(
        200,
        "OK",
        r#"{"data":{"shop":{"name":"Test shop"}},"errors":[{"message":"access denied"}]}"#,
    )]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(response.data, Some(json!({"shop": {"name": "Test shop"}})));
    let errors = response.errors.unwrap();
    assert_eq!(errors.network_status_code, Some(200));
    assert_eq!(
        errors.message.as_deref(),
        Some("GraphQL Client: An error occurred while fetching from the API. Review 'graphQLErrors' for details.")
    );
    assert_eq!(
        errors.graphql_errors.unwrap(),
        vec![json!({"message": "access denied"})]
    );
}

#[tokio::test]
async fn test_payload_without_data_or_errors() {
    let transport = MockTransport::new(vec![MockReply::json(200, "OK", r#"{"extensions":{}}"#)]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    let errors = response.errors.unwrap();
    assert_eq!(
        errors.message.as_deref(),
        Some("GraphQL Client: An unknown error has occurred. The API did not return a data object or any errors in its response.")
    );
}

#[tokio::test]
async fn test_extensions_are_passed_through() {
    let transport = MockTransport::new(vec![MockReply::json(
        200,
        "OK",
        r#"{"data":{"shop":{}},"extensions":{"cost":{"requestedQueryCost":1}}}"#,
    )]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(
        response.extensions,
        Some(json!({"cost": {"requestedQueryCost": 1}}))
    );
    assert!(response.errors.is_none());
}

#[tokio::test]
async fn test_fetch_returns_raw_response() {
    let transport = MockTransport::new(vec![MockReply::json(
        200,
        "OK",
        r#"{"data":{"shop":{"name":"Test shop"}}}"#,
    )]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.fetch("query { shop { name } }", None).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body.text().await.unwrap(),
        r#"{"data":{"shop":{"name":"Test shop"}}}"#
    );
}

#[tokio::test]
async fn test_fetch_returns_exhausted_retriable_response_without_error() {
    let transport = MockTransport::new(vec![MockReply::json(429, "Too Many Requests", "")]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.fetch("query { shop { name } }", None).await.unwrap();

    assert_eq!(response.status, 429);
}

#[tokio::test]
async fn test_body_delivered_through_pull_reader() {
    let transport = MockTransport::new(vec![MockReply::Response {
        status: 200,
        status_text: "OK",
        content_type: "application/json",
        body: MockBody::Reader(r#"{"data":{"shop":{"name":"Test shop"}}}"#.to_string()),
    }]);
    let client = test_client(Arc::clone(&transport), 0);

    let response = client.request("query { shop { name } }", None).await.unwrap();

    assert_eq!(response.data, Some(json!({"shop": {"name": "Test shop"}})));
}
