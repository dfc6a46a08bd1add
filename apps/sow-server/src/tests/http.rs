//! The axum router driven end to end with `oneshot`.

use super::common::*;
use crate::handlers;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn send_sow_body() -> Value {
    json!({
        "data": {
            "project": { "title": "Website" },
            "pricing": { "total": "5000", "currency": "USD" },
            "theme": "dark"
        },
        "arcodic_signature": "A. Arcodic",
        "client_email": "jane@acme.com",
        "client_name": "Acme Corp"
    })
}

async fn test_app() -> (Router, std::sync::Arc<RecordingEmailProvider>) {
    let (server, email) = create_test_server().await;
    (handlers::router(server), email)
}

/// Pull the token out of `{base}/sign/{token}`.
fn token_of(signing_url: &Value) -> String {
    signing_url
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn send_sow_returns_id_and_link() {
    let (app, email) = test_app().await;

    let (status, body) = call(&app, Method::POST, "/api/send-sow", Some(send_sow_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["sow_id"].is_string());
    let url = body["signing_url"].as_str().unwrap();
    assert!(url.starts_with(&format!("{}/sign/", APP_URL)));
    assert_eq!(email.sent().len(), 1);
}

#[tokio::test]
async fn send_sow_validation_errors_are_400() {
    let (app, email) = test_app().await;

    let mut missing_email = send_sow_body();
    missing_email.as_object_mut().unwrap().remove("client_email");
    let (status, body) = call(&app, Method::POST, "/api/send-sow", Some(missing_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("client_email is required"));

    let mut bad_email = send_sow_body();
    bad_email["client_email"] = json!("not-an-email");
    let (status, _) = call(&app, Method::POST, "/api/send-sow", Some(bad_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/send-sow")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(email.sent().is_empty());
}

#[tokio::test]
async fn wrong_method_is_405() {
    let (app, _) = test_app().await;

    let (status, _) = call(&app, Method::GET, "/api/send-sow", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = call(&app, Method::GET, "/api/complete-sow", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = call(&app, Method::PUT, "/api/complete-sow", Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn signing_flow_over_http() {
    let (app, email) = test_app().await;
    let (_, created) = call(&app, Method::POST, "/api/send-sow", Some(send_sow_body())).await;
    let token = token_of(&created["signing_url"]);

    let (status, body) = call(&app, Method::GET, &format!("/api/sign/{}", token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], json!("ready"));
    assert_eq!(body["sow"]["id"], created["sow_id"]);
    assert_eq!(body["sow"]["status"], json!("sent"));
    assert_eq!(body["sow"]["arcodic_signature"], json!("A. Arcodic"));
    assert_eq!(body["sow"]["data"]["theme"], json!("dark"));

    let complete = json!({ "token": token, "client_signature": "Jane Doe" });
    let (status, body) = call(&app, Method::POST, "/api/complete-sow", Some(complete.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["sow_id"], created["sow_id"]);
    assert_eq!(body["email_delivered"], json!(true));
    assert_eq!(email.sent().len(), 3);

    let (status, body) = call(&app, Method::POST, "/api/complete-sow", Some(complete)).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], json!("This link has already been used"));
    assert_eq!(email.sent().len(), 3);

    let (status, body) = call(&app, Method::GET, &format!("/api/sign/{}", token), None).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["state"], json!("used"));
}

#[tokio::test]
async fn unknown_and_blank_signing_requests() {
    let (app, _) = test_app().await;

    let (status, body) = call(&app, Method::GET, "/api/sign/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["state"], json!("invalid"));
    assert_eq!(body["error"], json!("Invalid link"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/complete-sow",
        Some(json!({ "token": "nope", "client_signature": "Jane" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/complete-sow",
        Some(json!({ "token": "nope", "client_signature": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("client_signature is required"));
}

#[tokio::test]
async fn dashboard_over_http() {
    let (app, _) = test_app().await;
    let (_, created) = call(&app, Method::POST, "/api/send-sow", Some(send_sow_body())).await;
    let token = token_of(&created["signing_url"]);
    call(
        &app,
        Method::POST,
        "/api/complete-sow",
        Some(json!({ "token": token, "client_signature": "Jane Doe" })),
    )
    .await;

    let mut other = send_sow_body();
    other["client_name"] = json!("Globex");
    other["client_email"] = json!("hank@globex.com");
    call(&app, Method::POST, "/api/send-sow", Some(other)).await;

    let sow_id = created["sow_id"].as_str().unwrap();
    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/dashboard?search=acme&status=completed&open={}", sow_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sows"].as_array().unwrap().len(), 1);
    assert_eq!(body["sows"][0]["client_name"], json!("Acme Corp"));
    assert_eq!(
        body["counts"],
        json!({ "all": 2, "draft": 0, "sent": 1, "completed": 1 })
    );
    assert_eq!(body["selected"]["client_signature"], json!("Jane Doe"));

    let (status, _) = call(&app, Method::GET, "/api/dashboard?status=archived", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_accepts_empty_form_fields() {
    let (app, _) = test_app().await;
    call(&app, Method::POST, "/api/send-sow", Some(send_sow_body())).await;

    let (status, body) = call(&app, Method::GET, "/api/dashboard?search=&status=&open=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sows"].as_array().unwrap().len(), 1);
    assert_eq!(body["counts"]["all"], json!(1));
    assert!(body["selected"].is_null());

    let (status, _) = call(&app, Method::GET, "/api/dashboard?open=", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, "/api/dashboard?status=Sent", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sows"].as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::GET, "/api/dashboard?open=not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn nested_payload_is_stored_verbatim() {
    let (app, _) = test_app().await;
    let data = json!({
        "project": { "title": "Website", "deadline": "2026-12-01" },
        "pricing": { "total": 5000, "currency": "USD", "vat": true },
        "client": { "name": "Acme", "vat_no": "123" },
        "scope": { "pages": [{ "name": "Home" }] }
    });
    let mut request = send_sow_body();
    request["data"] = data.clone();

    let (status, created) = call(&app, Method::POST, "/api/send-sow", Some(request)).await;
    assert_eq!(status, StatusCode::OK);

    let sow_id = created["sow_id"].as_str().unwrap();
    let (status, body) = call(&app, Method::GET, &format!("/api/sows/{}", sow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], data);
}

#[tokio::test]
async fn email_failures_are_reported_not_fatal() {
    let (server, email) = create_test_server_with(RecordingEmailProvider::failing()).await;
    let app = handlers::router(server);

    let (status, created) = call(&app, Method::POST, "/api/send-sow", Some(send_sow_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["email_delivered"], json!(false));

    let token = token_of(&created["signing_url"]);
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/complete-sow",
        Some(json!({ "token": token, "client_signature": "Jane Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["email_delivered"], json!(false));
    assert!(email.sent().is_empty());
}

#[tokio::test]
async fn admin_record_routes() {
    let (app, email) = test_app().await;
    let (_, created) = call(&app, Method::POST, "/api/send-sow", Some(send_sow_body())).await;
    let sow_id = created["sow_id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, &format!("/api/sows/{}", sow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client_email"], json!("jane@acme.com"));

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/sows/{}/tokens", sow_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["signing_url"], created["signing_url"]);
    assert_eq!(email.sent().len(), 2);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/sows/{}", sow_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &format!("/api/sows/{}", sow_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/api/sows/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
