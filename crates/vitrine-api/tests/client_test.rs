// Integration tests for `ResourceClient` using wiremock.
#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrine_api::{Error, Payload, ResourceClient, TransportConfig, WireId};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ResourceClient) {
    let server = MockServer::start().await;
    let client =
        ResourceClient::from_reqwest(&format!("{}/api/", server.uri()), reqwest::Client::new())
            .unwrap();
    (server, client)
}

fn payload(value: serde_json::Value) -> Payload {
    value.as_object().cloned().unwrap()
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "name": "Bravo", "price": 30 },
            { "id": "2", "name": "Alpha", "price": 10 },
        ])))
        .mount(&server)
        .await;

    let records = client.list("products").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, WireId::Text("1".into()));
    assert_eq!(records[1].fields["name"], json!("Alpha"));
}

#[tokio::test]
async fn test_list_enveloped() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 11, "title": "Consulting" }],
            "total": 1
        })))
        .mount(&server)
        .await;

    let records = client.list("services").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.to_string(), "11");
}

#[tokio::test]
async fn test_create_returns_server_record() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(body_json(json!({ "name": "X" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "srv-9", "name": "X" })),
        )
        .mount(&server)
        .await;

    let record = client
        .create("products", &payload(json!({ "name": "X" })))
        .await
        .unwrap();

    assert_eq!(record.id, WireId::Text("srv-9".into()));
}

#[tokio::test]
async fn test_update_accepts_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/products/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "3", "name": "Charlie", "price": 25 }
        })))
        .mount(&server)
        .await;

    let record = client
        .update("products", "3", &payload(json!({ "price": 25 })))
        .await
        .unwrap();

    assert_eq!(record.fields["price"], json!(25));
}

#[tokio::test]
async fn test_update_status_patches_status_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/applications/a1/status"))
        .and(body_json(json!({ "field": "status", "status": "approved" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "a1", "status": "approved" })),
        )
        .mount(&server)
        .await;

    let record = client
        .update_status("applications", "a1", "status", "approved")
        .await
        .unwrap();

    assert_eq!(record.fields["status"], json!("approved"));
}

#[tokio::test]
async fn test_delete_and_bulk_delete() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/products/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/products/bulk-delete"))
        .and(body_json(json!({ "ids": ["2", "3"] })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_record("products", "1").await.unwrap();
    client
        .bulk_delete("products", &["2".to_string(), "3".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bulk_status_with_and_without_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/products/bulk-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "status": "archived" }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/products/bulk-status"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let ids = vec!["1".to_string()];
    let first = client
        .bulk_update_status("products", &ids, "status", "archived")
        .await
        .unwrap();
    let second = client
        .bulk_update_status("products", &ids, "status", "archived")
        .await
        .unwrap();

    assert_eq!(first.map(|r| r.len()), Some(1));
    assert!(second.is_none());
}

#[tokio::test]
async fn test_bearer_token_sent() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        api_key: Some(SecretString::from("k-123".to_string())),
        ..TransportConfig::default()
    };
    let client = ResourceClient::new(&server.uri(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("authorization", "Bearer k-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list("products").await.unwrap().is_empty());
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_structured_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "name already taken",
            "code": "validation.duplicate"
        })))
        .mount(&server)
        .await;

    let err = client
        .create("products", &payload(json!({ "name": "dup" })))
        .await
        .unwrap_err();

    match err {
        Error::Api {
            status,
            message,
            code,
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "name already taken");
            assert_eq!(code.as_deref(), Some("validation.duplicate"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list("products").await.unwrap_err();
    assert!(matches!(err, Error::Authentication { status: 401, .. }));
}

#[tokio::test]
async fn test_not_found_raw_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/products/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such record"))
        .mount(&server)
        .await;

    let err = client.delete_record("products", "missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no such record"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list("products").await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("oops")),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}
