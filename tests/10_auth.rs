mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use evote_admin::auth::{Claims, TokenKeys};
use evote_admin::database::StoreFault;
use serde_json::json;

use common::{TestApp, ADMIN_ID, INACTIVE_ID, VOTER_ID};

fn with_authorization(value: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/auth/whoami")
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn missing_token_is_rejected_without_store_access() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth/whoami", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "token_missing");
    assert_eq!(app.store.accesses(), 0);
}

#[tokio::test]
async fn malformed_prefix_is_rejected_without_store_access() {
    let app = TestApp::new();
    let token = app.token_for(VOTER_ID);

    for value in [
        token.clone(),
        format!("bearer {}", token),
        format!("Token {}", token),
        "Bearer ".to_string(),
    ] {
        let (status, body) = app.send(with_authorization(&value)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", value);
        assert_eq!(body["reason"], "token_malformed", "{}", value);
    }
    assert_eq!(app.store.accesses(), 0);
}

#[tokio::test]
async fn wrong_secret_and_expiry_have_distinct_reasons() {
    let app = TestApp::new();

    let forged = TokenKeys::new(b"some-other-secret-entirely-000000", Duration::hours(1));
    let claims = Claims {
        sub: VOTER_ID.to_string(),
        role: "admin".to_string(),
        iat: Utc::now().timestamp(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    let (status, body) = app
        .get("/api/auth/whoami", Some(&forged.sign(&claims).unwrap()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "signature_invalid");

    let expired = Claims {
        iat: (Utc::now() - Duration::hours(2)).timestamp(),
        exp: (Utc::now() - Duration::hours(1)).timestamp(),
        ..claims
    };
    let (status, body) = app
        .get("/api/auth/whoami", Some(&app.keys.sign(&expired).unwrap()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "token_expired");

    assert_eq!(app.store.accesses(), 0);
}

#[tokio::test]
async fn inactive_and_unknown_users_look_the_same() {
    let app = TestApp::new();

    let inactive = app
        .get("/api/auth/whoami", Some(&app.token_for(INACTIVE_ID)))
        .await;
    let unknown = app.get("/api/auth/whoami", Some(&app.token_for(9_999))).await;

    assert_eq!(inactive.0, StatusCode::UNAUTHORIZED);
    assert_eq!(inactive, unknown);
    assert_eq!(inactive.1["reason"], "credentials_invalid");
}

#[tokio::test]
async fn whoami_returns_the_stored_identity() {
    let app = TestApp::new();

    let (status, body) = app
        .get("/api/auth/whoami", Some(&app.token_for(VOTER_ID)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], VOTER_ID);
    assert_eq!(body["data"]["role"], "voter");
    assert_eq!(app.store.accesses(), 1);
}

#[tokio::test]
async fn store_failure_is_a_server_fault_not_an_auth_failure() {
    let app = TestApp::new();
    app.store.break_with(StoreFault::TimedOut("pool timed out".into()));

    let (status, body) = app
        .get("/api/auth/whoami", Some(&app.token_for(VOTER_ID)))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"], "store_unavailable");

    app.store.break_with(StoreFault::Unknown("syntax error".into()));
    let (status, _) = app
        .get("/api/auth/whoami", Some(&app.token_for(VOTER_ID)))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn deactivated_user_is_rejected_on_the_next_request() {
    let app = TestApp::new();
    let voter_token = app.token_for(VOTER_ID);

    let (status, _) = app.get("/api/auth/whoami", Some(&voter_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(common::request(
            Method::PUT,
            &format!("/api/users/{}/status", VOTER_ID),
            Some(&app.token_for(ADMIN_ID)),
            Some(json!({ "status": "inactive" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/auth/whoami", Some(&voter_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "credentials_invalid");
}
