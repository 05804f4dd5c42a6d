// --- File: crates/relay_common/tests/dispatch_tests.rs ---
//! End-to-end dispatcher tests against a mock upstream.

use axum::body::Body;
use axum::http::Request;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay_common::{
    integration_routes, ApiClient, AuthScheme, BodyKind, CredentialBundle, CredentialSpec,
    EndpointSpec, IntegrationSpec, ParamLocation, ParamSpec, RelayError, RouterOptions,
};

static TEST_INTEGRATION: IntegrationSpec = IntegrationSpec {
    name: "testsvc",
    base_url: "https://api.testsvc.invalid",
    auth: AuthScheme::Bearer { cred: "api_key" },
    credentials: &[CredentialSpec::required(
        "api_key",
        "x-testsvc-api-key",
        "TESTSVC_API_KEY",
    )],
    endpoints: &[
        EndpointSpec {
            name: "get_item",
            method: Method::GET,
            path: "/items/{item_id}",
            params: &[
                ParamSpec::required("item_id", ParamLocation::Path),
                ParamSpec::comma_list("fields", ParamLocation::Query, false),
            ],
            body: BodyKind::Empty,
            response_key: "item",
            response_pick: None,
        },
        EndpointSpec {
            name: "create_item",
            method: Method::POST,
            path: "/items",
            params: &[
                ParamSpec::required("name", ParamLocation::Body),
                ParamSpec::optional("description", ParamLocation::Body),
                ParamSpec::optional("quantity", ParamLocation::Body),
            ],
            body: BodyKind::Json,
            response_key: "item",
            response_pick: None,
        },
        EndpointSpec {
            name: "create_charge",
            method: Method::POST,
            path: "/charges",
            params: &[
                ParamSpec::required("amount", ParamLocation::Body),
                ParamSpec::required("currency", ParamLocation::Body),
                ParamSpec::optional("description", ParamLocation::Body),
            ],
            body: BodyKind::Form,
            response_key: "charge",
            response_pick: None,
        },
    ],
};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(
        &TEST_INTEGRATION,
        reqwest::Client::new(),
        server.uri(),
        CredentialBundle::from_values([("api_key", "test-token".to_string())]),
    )
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn success_returns_upstream_payload_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/42"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 42, "name": "widget"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ep = TEST_INTEGRATION.endpoint("get_item").unwrap();
    let value = client.call(ep, &args(json!({"item_id": 42}))).await.unwrap();
    assert_eq!(value, json!({"id": 42, "name": "widget"}));
}

#[tokio::test]
async fn upstream_error_body_is_extracted_into_the_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No such item: 9"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ep = TEST_INTEGRATION.endpoint("get_item").unwrap();
    let err = client
        .call(ep, &args(json!({"item_id": "9"})))
        .await
        .unwrap_err();
    match err {
        RelayError::Upstream { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No such item: 9");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn optional_fields_are_omitted_not_sent_as_null() {
    let server = MockServer::start().await;
    // Exact-body match: a request carrying "description":null would not
    // match and the call would fail with 404.
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"name": "widget"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ep = TEST_INTEGRATION.endpoint("create_item").unwrap();
    let value = client
        .call(ep, &args(json!({"name": "widget", "description": null})))
        .await
        .unwrap();
    assert_eq!(value, json!({"id": 1}));
}

#[tokio::test]
async fn comma_list_query_params_are_joined() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/7"))
        .and(query_param("fields", "id,name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ep = TEST_INTEGRATION.endpoint("get_item").unwrap();
    let value = client
        .call(ep, &args(json!({"item_id": 7, "fields": ["id", "name"]})))
        .await
        .unwrap();
    assert_eq!(value, json!({"id": 7}));
}

#[tokio::test]
async fn form_bodies_are_urlencoded_and_sparse() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charges"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(wiremock::matchers::body_string("amount=500&currency=usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ch_1"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ep = TEST_INTEGRATION.endpoint("create_charge").unwrap();
    let value = client
        .call(ep, &args(json!({"amount": 500, "currency": "usd"})))
        .await
        .unwrap();
    assert_eq!(value, json!({"id": "ch_1"}));
}

#[tokio::test]
async fn batch_fan_out_fails_fast_on_any_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ep = TEST_INTEGRATION.endpoint("get_item").unwrap();
    let result = client
        .call_batch(
            ep,
            vec![args(json!({"item_id": 1})), args(json!({"item_id": 2}))],
        )
        .await;
    // No partial results: the whole batch is an error.
    assert!(matches!(
        result,
        Err(RelayError::Upstream { status: 500, .. })
    ));
}

// --- Route factory behavior over HTTP ---

async fn body_value(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn route_answers_200_envelope_for_upstream_success_and_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/2"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": "rate limited"})),
        )
        .mount(&server)
        .await;

    let app = integration_routes(
        &TEST_INTEGRATION,
        RouterOptions {
            base_url: Some(server.uri()),
            timeout_secs: 5,
            enabled: true,
        },
    );

    let ok = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/items/1")
                .header("x-testsvc-api-key", "test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    assert_eq!(
        body_value(ok).await,
        json!({"success": true, "item": {"id": 1}})
    );

    let failed = app
        .oneshot(
            Request::builder()
                .uri("/items/2")
                .header("x-testsvc-api-key", "test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Upstream failure is still HTTP 200; the envelope is the signal.
    assert_eq!(failed.status(), 200);
    assert_eq!(
        body_value(failed).await,
        json!({"success": false, "error": "rate limited"})
    );
}

#[tokio::test]
async fn missing_credential_is_a_400_before_any_upstream_call() {
    let app = integration_routes(
        &TEST_INTEGRATION,
        RouterOptions {
            base_url: Some("http://127.0.0.1:1".to_string()),
            timeout_secs: 5,
            enabled: true,
        },
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/items/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body = body_value(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("api_key"));
}

#[tokio::test]
async fn disabled_integration_answers_503() {
    let app = integration_routes(
        &TEST_INTEGRATION,
        RouterOptions {
            base_url: None,
            timeout_secs: 5,
            enabled: false,
        },
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/items/1")
                .header("x-testsvc-api-key", "test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}
