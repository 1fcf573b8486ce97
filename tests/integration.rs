//! Integration tests for influxdb2-orgs against a wiremock server.
//!
//! Run tests with: `cargo test --test integration`

use futures::StreamExt;
use influxdb2_orgs::{
    Body, ClientConfig, Error, ErrorKind, Influx, InfluxError, OrgFilter, OrgStatus, Request,
    classify, connect,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token-for-development-only";

fn org(id: &str, name: &str) -> serde_json::Value {
    json!({
        "links": {
            "self": format!("/api/v2/orgs/{id}"),
            "buckets": format!("/api/v2/buckets?org={name}"),
        },
        "id": id,
        "name": name,
        "description": "",
        "createdAt": "2023-11-14T22:13:20Z",
        "updatedAt": "2023-11-14T22:13:20.5Z",
        "status": "active"
    })
}

fn page(orgs: Vec<serde_json::Value>, next: Option<&str>) -> ResponseTemplate {
    let mut links = json!({ "self": "/api/v2/orgs" });
    if let Some(next) = next {
        links["next"] = json!(next);
    }
    ResponseTemplate::new(200).set_body_json(json!({ "links": links, "orgs": orgs }))
}

fn client(server: &MockServer) -> Influx {
    connect(server.uri(), TOKEN).unwrap()
}

// ============================================================================
// Connection
// ============================================================================

#[tokio::test]
async fn test_connect_makes_no_request() {
    let server = MockServer::start().await;

    let _client = client(&server);

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty(), "connect must not touch the network");
}

#[tokio::test]
async fn test_connect_rejects_bad_url() {
    let err = connect("not a url", TOKEN).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_connect_rejects_bad_token() {
    let server = MockServer::start().await;

    let err = connect(server.uri(), "bad\ntoken").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(!err.is_influx());

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_token_and_accept_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(header("Authorization", format!("Token {TOKEN}").as_str()))
        .and(header("Accept", "application/json"))
        .respond_with(page(vec![], None))
        .expect(1)
        .mount(&server)
        .await;

    let orgs = client(&server).orgs().all(OrgFilter::new()).await.unwrap();
    assert!(orgs.is_empty());
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_two_pages_with_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param_is_missing("after"))
        .respond_with(page(
            vec![org("0000000000000001", "a"), org("0000000000000002", "b")],
            Some("/api/v2/orgs?after=abc"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param("after", "abc"))
        .respond_with(page(vec![org("0000000000000003", "c")], None))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut iter = client.orgs().iterate(OrgFilter::new());

    let mut names = Vec::new();
    while let Some(org) = iter.next().await.unwrap() {
        names.push(org.name);
    }

    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(iter.pages_fetched(), 2);
    // Mock expectations (exactly one call each) are verified on drop.
}

#[tokio::test]
async fn test_error_on_second_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param_is_missing("offset"))
        .respond_with(page(
            vec![org("0000000000000001", "a"), org("0000000000000002", "b")],
            Some("/api/v2/orgs?offset=2&limit=2"),
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": "internal error",
            "message": "an internal error has occurred"
        })))
        .mount(&server)
        .await;

    let mut stream = client(&server).orgs().stream(OrgFilter::new());

    assert_eq!(stream.next().await.unwrap().unwrap().name, "a");
    assert_eq!(stream.next().await.unwrap().unwrap().name, "b");

    match stream.next().await.unwrap() {
        Err(Error::Influx(err @ InfluxError::Http { .. })) => {
            assert_eq!(err.status(), Some(500));
            let body = err.api_error().unwrap();
            assert_eq!(body.code, "internal error");
        }
        other => panic!("expected HTTP 500, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_filter_sent_on_every_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param("org", "myorg"))
        .and(query_param_is_missing("offset"))
        .respond_with(page(
            vec![org("0000000000000001", "myorg")],
            Some("/api/v2/orgs?offset=1&limit=1"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param("org", "myorg"))
        .and(query_param("offset", "1"))
        .respond_with(page(vec![], None))
        .expect(1)
        .mount(&server)
        .await;

    let orgs = client(&server)
        .orgs()
        .all(OrgFilter::new().org("myorg"))
        .await
        .unwrap();
    assert_eq!(orgs.len(), 1);
}

#[tokio::test]
async fn test_page_size_from_config() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param("limit", "25"))
        .respond_with(page(vec![org("0000000000000001", "a")], None))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::builder(server.uri(), TOKEN)
        .page_size(25)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let client = Influx::new(config).unwrap();

    let orgs = client.orgs().all(OrgFilter::new()).await.unwrap();
    assert_eq!(orgs.len(), 1);
    assert!(orgs[0].description.is_none());
    assert_eq!(orgs[0].status, OrgStatus::Active);
    assert_eq!(orgs[0].link("buckets"), Some("/api/v2/buckets?org=a"));
}

// ============================================================================
// Error Handling
// ============================================================================

#[tokio::test]
async fn test_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "unauthorized",
            "message": "unauthorized access"
        })))
        .mount(&server)
        .await;

    let err = client(&server).orgs().all(OrgFilter::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationDenied);
    assert!(err.is_influx());
}

#[tokio::test]
async fn test_not_found_carries_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs/0123456789abcdef"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not found",
            "message": "organization not found"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .orgs()
        .get("0123456789abcdef")
        .await
        .unwrap_err();
    match err {
        Error::Influx(InfluxError::Http { code, data }) => {
            assert_eq!(code, 404);
            assert_eq!(
                data,
                Body::Json(json!({"code": "not found", "message": "organization not found"}))
            );
        }
        other => panic!("expected HTTP 404, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_raw() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client(&server).orgs().all(OrgFilter::new()).await.unwrap_err();
    match err {
        Error::Influx(InfluxError::Http { code: 502, data }) => {
            assert_eq!(data, Body::Raw(b"Bad Gateway".to_vec()));
        }
        other => panic!("expected HTTP 502, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_gone_is_network_error() {
    // Grab a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = connect(uri, TOKEN)
        .unwrap()
        .orgs()
        .all(OrgFilter::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!err.is_influx());
}

#[tokio::test]
async fn test_request_timeout_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .respond_with(page(vec![], None).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = client(&server)
        .request(Request::get("/api/v2/orgs").timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

// ============================================================================
// Raw requests and CRUD
// ============================================================================

#[tokio::test]
async fn test_raw_request_returns_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"status": "fail"})))
        .mount(&server)
        .await;

    let response = client(&server).request(Request::get("/health")).await.unwrap();
    assert_eq!(response.code, 503);
    assert_eq!(response.data, Body::Json(json!({"status": "fail"})));
    assert_eq!(classify(response).unwrap_err().status(), Some(503));
}

#[tokio::test]
async fn test_create_update_delete() {
    let server = MockServer::start().await;
    let id = "0123456789abcdef";

    Mock::given(method("POST"))
        .and(path("/api/v2/orgs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(org(id, "new")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/api/v2/orgs/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(org(id, "renamed")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/v2/orgs/{id}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let orgs = client(&server).orgs();
    assert_eq!(orgs.create("new", Some("A new org")).await.unwrap().id, id);
    assert_eq!(orgs.update(id, "renamed", None).await.unwrap().name, "renamed");
    orgs.delete(id).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let created: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(created, json!({"name": "new", "description": "A new org"}));
}

#[tokio::test]
async fn test_secrets() {
    let server = MockServer::start().await;
    let id = "0123456789abcdef";

    Mock::given(method("GET"))
        .and(path(format!("/api/v2/orgs/{id}/secrets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "links": { "self": format!("/api/v2/orgs/{id}/secrets"), "org": format!("/api/v2/orgs/{id}") },
            "secrets": ["aws_key", "slack_token"]
        })))
        .mount(&server)
        .await;

    let secrets = client(&server).orgs().secrets(id).await.unwrap();
    let keys: Vec<_> = secrets.iter().map(|s| s.value().to_string()).collect();
    assert_eq!(keys, vec!["aws_key", "slack_token"]);
}
