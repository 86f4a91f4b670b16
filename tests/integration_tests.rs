//! Integration tests using wiremock to simulate HTTP servers.

use dialpath::{CallOptions, CaseStyle, Client, Error, RequestEnvelope, RetryStrategy};
use http::HeaderValue;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .unwrap()
        .build()
        .unwrap()
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

#[tokio::test]
async fn nested_action_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/users/ban"))
        .and(body_json(json!({"userId": 456, "reason": "spam"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"banned": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .route("admin")
        .action("users")
        .unwrap()
        .sub("ban")
        .unwrap()
        .send_json(json!({"userId": 456, "reason": "spam"}))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.data, Some(json!({"banned": true})));
    assert_eq!(response.attempts, 1);
    assert!(!response.was_retried());
}

#[tokio::test]
async fn semantic_inference_reaches_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/getProfile"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Ada"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .route("users")
        .action("getProfile")
        .unwrap()
        .invoke()
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(
        response.data_as::<User>().unwrap(),
        User {
            id: 1,
            name: "Ada".to_string()
        }
    );
}

#[tokio::test]
async fn method_rules_override_semantics_on_the_wire() {
    let server = MockServer::start().await;

    // "getStats" would semantically be GET; the rule forces POST.
    Mock::given(method("POST"))
        .and(path("/metrics/getStats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .unwrap()
        .method_rule("getStats", http::Method::POST)
        .build()
        .unwrap();

    let response = client
        .route("metrics")
        .action("getStats")
        .unwrap()
        .invoke()
        .await
        .unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn parameterized_routes_cover_get_update_and_explicit_delete() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 123, "name": "Ada"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/123"))
        .and(body_json(json!({"name": "X"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .mount(&server)
        .await;
    // The reserved "method" key is stripped, leaving an empty body.
    Mock::given(method("DELETE"))
        .and(path("/users/123"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/123/follow"))
        .and(body_json(json!({"notify": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"following": true})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let user = client.route("users").id(123);

    let fetched = user.invoke().await.unwrap();
    assert_eq!(fetched.data, Some(json!({"id": 123, "name": "Ada"})));

    let updated = user.send_json(json!({"name": "X"})).await.unwrap();
    assert!(updated.success);

    let deleted = user.send_json(json!({"method": "DELETE"})).await.unwrap();
    assert_eq!(deleted.data, Some(json!({"deleted": true})));

    let followed = user
        .action("follow")
        .unwrap()
        .send_json(json!({"notify": true}))
        .await
        .unwrap();
    assert_eq!(followed.data, Some(json!({"following": true})));
}

#[tokio::test]
async fn non_2xx_statuses_are_unsuccessful_returns_not_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1) // never retried
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .unwrap()
        .retry_strategy(RetryStrategy::exponential(Duration::from_millis(1), 3))
        .build()
        .unwrap();

    let response = client.route("users").id(999).invoke().await.unwrap();
    assert!(!response.success);
    assert_eq!(response.status.as_u16(), 404);
    let error = response.error.unwrap();
    assert_eq!(error.code, Some(json!(404)));
    assert_eq!(error.message.as_deref(), Some("Not Found"));
}

#[tokio::test]
async fn bodies_with_their_own_success_envelope_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payments/charge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": "CARD_DECLINED", "message": "insufficient funds"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .route("payments")
        .action("charge")
        .unwrap()
        .send_json(json!({"amount": 100}))
        .await
        .unwrap();

    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, Some(json!("CARD_DECLINED")));
    assert_eq!(error.message.as_deref(), Some("insufficient funds"));
}

#[tokio::test]
async fn unparseable_bodies_are_flagged_with_the_fixed_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reports/fetchLatest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .route("reports")
        .action("fetchLatest")
        .unwrap()
        .invoke()
        .await
        .unwrap();

    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.message.as_deref(), Some(dialpath::PARSE_FAILURE_MESSAGE));
    assert_eq!(error.code, Some(json!(200)));
    assert_eq!(response.raw_body, "<html>not json</html>");
}

#[tokio::test]
async fn request_interceptors_and_default_headers_reach_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs/submit"))
        .and(header("user-agent", "dialpath-tests/1.0"))
        .and(header("x-request-id", "abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queued": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .unwrap()
        .default_header("User-Agent", "dialpath-tests/1.0")
        .unwrap()
        .build()
        .unwrap();

    client.add_request_interceptor_with_id("request-id", |mut envelope: RequestEnvelope| {
        envelope
            .headers
            .insert("x-request-id", HeaderValue::from_static("abc-123"));
        envelope
    });

    let response = client
        .route("jobs")
        .action("submit")
        .unwrap()
        .send_json(json!({"job": "reindex"}))
        .await
        .unwrap();
    assert!(response.success);

    assert!(client.remove_request_interceptor("request-id"));
    assert!(!client.remove_request_interceptor("request-id"));
}

#[tokio::test]
async fn query_params_are_encoded_and_nulls_filtered() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/findByEmail"))
        .and(query_param("email", "a+b@example.com"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .route("users")
        .action("findByEmail")
        .unwrap()
        .send(
            CallOptions::new()
                .with_query_param("email", "a+b@example.com")
                .with_query_param("page", "1")
                .with_optional_query_param("cursor", None),
        )
        .await
        .unwrap();

    assert!(response.success);
}

#[tokio::test]
async fn case_style_converts_paths_and_query_keys_on_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user_accounts/get_profile"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .unwrap()
        .case_style(CaseStyle::Snake)
        .build()
        .unwrap();

    let response = client
        .route("userAccounts")
        .action("getProfile")
        .unwrap()
        .send(CallOptions::new().with_query_param("pageSize", "10"))
        .await
        .unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn invoke_path_issues_the_same_request_as_the_fluent_chain() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/users/ban"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"banned": true})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let fluent = client
        .route("admin")
        .action("users")
        .unwrap()
        .sub("ban")
        .unwrap()
        .send_json(json!({"userId": 1}))
        .await
        .unwrap();
    let by_path = client
        .invoke_path("admin/users/ban", CallOptions::json(json!({"userId": 1})))
        .await
        .unwrap();

    assert!(fluent.success);
    assert!(by_path.success);
}

#[tokio::test]
async fn per_attempt_timeouts_classify_and_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow/loadAll"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    // Without retries the classified timeout surfaces directly.
    let client = Client::builder()
        .base_url(server.uri())
        .unwrap()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let result = client.route("slow").action("loadAll").unwrap().invoke().await;
    assert!(matches!(result, Err(Error::Timeout)));

    // With retries the timeout is retried until attempts run out.
    let retrying = Client::builder()
        .base_url(server.uri())
        .unwrap()
        .timeout(Duration::from_millis(50))
        .retry_strategy(RetryStrategy::ExponentialBackoff {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_retries: 2,
            jitter: false,
        })
        .build()
        .unwrap();

    let result = retrying.route("slow").action("loadAll").unwrap().invoke().await;
    match result {
        Err(Error::RetriesExhausted {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last_error, Error::Timeout));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn response_interceptors_see_only_the_terminal_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items/fetchAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.add_response_interceptor(|mut response: dialpath::ApiResponse| {
        response.data = Some(json!({"items": response.data}));
        response
    });

    let response = client
        .route("items")
        .action("fetchAll")
        .unwrap()
        .invoke()
        .await
        .unwrap();
    assert_eq!(response.data, Some(json!({"items": [1, 2, 3]})));
}
