mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::*;
use jobfeed::models::job::JobStatus;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn harness() -> TestHarness {
    TestHarness::new(
        StubExtractor::returning(golang_vacancy()),
        StubGenerator::with_responses(["Hello, I saw your Go role."]),
    )
}

#[tokio::test]
async fn health_endpoints_are_public() {
    let app = harness().router();
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requires_a_known_token() {
    let app = harness().router();

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/api/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/v1/jobs", "not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn collect_then_list_and_fetch() {
    let harness = harness();
    let (_, token) = harness.user("Ann").await;
    let app = harness.router();

    let (status, stats) = send(
        &app,
        post(
            "/api/v1/collect/messages",
            &token,
            json!({"messages": [
                {"text": SCENARIO_TEXT, "channelId": 1, "messageId": 5},
                {"text": SCENARIO_TEXT, "channelId": 1, "messageId": 6},
                {"text": "", "channelId": 1, "messageId": 7},
                {"text": "buy cheap stuff, casino and betting every single day of the week", "channelId": 1, "messageId": 8}
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({"submitted": 1, "filtered": 1, "duplicate": 1, "empty": 1, "failed": 0})
    );

    let (status, jobs) = send(&app, get("/api/v1/jobs?status=raw", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = jobs.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["status"], "raw");
    assert!(jobs[0].get("raw").is_none());

    let id = jobs[0]["id"].as_str().unwrap();
    let (status, job) = send(&app, get(&format!("/api/v1/jobs/{id}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["url"], "https://t.me/c/1/5");

    let (status, _) = send(
        &app,
        get(&format!("/api/v1/jobs/{}", uuid::Uuid::new_v4()), &token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn offer_flow_for_the_calling_user() {
    let harness = harness();
    let (user, token) = harness.user("Ann").await;
    let app = harness.router();

    let outcome = harness
        .collector
        .handle(message(1, 5, SCENARIO_TEXT))
        .await;
    let jobfeed::collectors::Outcome::Submitted(id) = outcome else {
        panic!("expected submission, got {outcome:?}");
    };

    let (status, _) = send(&app, post(&format!("/api/v1/jobs/{id}/offer"), &token, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    harness.jobs.process(id, &harness.shutdown).await.unwrap();
    assert_eq!(
        harness.jobs.find_job(id).await.unwrap().status(),
        JobStatus::Processed
    );

    let (status, body) =
        send(&app, post(&format!("/api/v1/jobs/{id}/offer"), &token, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offer"], "Hello, I saw your Go role.");

    let (status, stored) = send(&app, get(&format!("/api/v1/jobs/{id}/offer"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["user_id"], user.id.to_string());
    assert_eq!(stored["offer_text"], "Hello, I saw your Go role.");

    // Another user has no offer for this job yet.
    let (_, other_token) = harness.user("Bob").await;
    let (status, _) = send(&app, get(&format!("/api/v1/jobs/{id}/offer"), &other_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn process_endpoint_only_accepts_raw_jobs() {
    let harness = harness();
    let (_, token) = harness.user("Ann").await;
    let app = harness.router();

    let jobfeed::collectors::Outcome::Submitted(id) =
        harness.collector.handle(message(1, 5, SCENARIO_TEXT)).await
    else {
        panic!("expected submission");
    };

    let (status, body) =
        send(&app, post(&format!("/api/v1/jobs/{id}/process"), &token, json!({}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["job_id"], id.to_string());
    // No queue is attached in the harness.
    assert_eq!(body["queued"], false);

    harness.jobs.process(id, &harness.shutdown).await.unwrap();
    let (status, _) =
        send(&app, post(&format!("/api/v1/jobs/{id}/process"), &token, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
