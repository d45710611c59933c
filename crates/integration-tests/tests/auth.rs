//! Registration, login and bearer-token behavior.

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{Value, json};

use kiosky_core::{Email, Role};
use kiosky_integration_tests::{PASSWORD, TestApp};

#[tokio::test]
async fn test_customer_registration_and_me() {
    let app = TestApp::spawn().await;
    let session = app.register_customer(" Alice@Example.com ").await;
    assert_eq!(session.email, "alice@example.com");
    assert_eq!(session.store_id, None);

    let response = app.get("/auth/me", Some(&session.token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["role"], "CUSTOMER");
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
async fn test_owner_registration_returns_store() {
    let app = TestApp::spawn().await;
    let session = app.register_owner("owner@x.com", "shop1").await;
    let store_id = session.store_id.unwrap();

    let store: Value = app
        .get(&format!("/stores/{store_id}"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(store["domain"], "shop1");
    assert_eq!(store["ownerId"], session.user_id);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_customer("a@x.com").await;

    let response = app
        .post(
            "/auth/register",
            None,
            &json!({ "fullName": "Again", "email": "A@X.COM", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_weak_password_is_rejected() {
    let app = TestApp::spawn().await;
    let response = app
        .post(
            "/auth/register",
            None,
            &json!({ "fullName": "Weak", "email": "w@x.com", "password": "password" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let app = TestApp::spawn().await;
    app.register_customer("a@x.com").await;

    let wrong_password = app
        .post(
            "/auth/login",
            None,
            &json!({ "email": "a@x.com", "password": "Wr0ngPassword" }),
        )
        .await;
    let unknown_email = app
        .post(
            "/auth/login",
            None,
            &json!({ "email": "nobody@x.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn test_login_issues_working_token() {
    let app = TestApp::spawn().await;
    app.register_owner("owner@x.com", "shop1").await;

    let session = app.login("OWNER@x.com").await;
    assert!(session.store_id.is_some());
    let response = app.get("/auth/me", Some(&session.token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_owner_registrations_same_domain() {
    let app = TestApp::spawn().await;

    let (first, second) = tokio::join!(
        app.register_owner_raw("one@x.com", "MyShop"),
        app.register_owner_raw("two@x.com", " myshop "),
    );

    let loser = if first.status() == StatusCode::CREATED {
        "two@x.com"
    } else {
        "one@x.com"
    };
    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let stores: Vec<Value> = app.get("/stores", None).await.json().await.unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["domain"], "myshop");

    // The losing registration left no account behind
    let exists: Value = app
        .get(&format!("/auth/email/exists?email={loser}"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(exists["exists"], false);
}

#[tokio::test]
async fn test_expired_token_is_unauthenticated() {
    let app = TestApp::spawn().await;
    let session = app.register_customer("a@x.com").await;

    let email = Email::parse(&session.email).unwrap();
    let issued_at = Utc::now() - chrono::Duration::seconds(3601);
    let expired = app
        .state
        .tokens()
        .issue_at(&email, Role::Customer, issued_at)
        .unwrap()
        .token;

    let response = app.get("/auth/me", Some(&expired)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_garbled_header_on_public_read() {
    let app = TestApp::spawn().await;
    app.register_owner("owner@x.com", "shop1").await;

    let response = app
        .client
        .get(format!("{}/stores", app.base_url))
        .header("Authorization", "Bearer %%%not-a-token%%%")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_availability_checks() {
    let app = TestApp::spawn().await;
    app.register_owner("owner@x.com", "shop1").await;

    let email: Value = app
        .get("/auth/email/exists?email=OWNER@x.com", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(email["exists"], true);

    let domain: Value = app
        .get("/stores/domain/exists?domain=other", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(domain["exists"], false);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;
    assert_eq!(app.get("/health", None).await.status(), StatusCode::OK);
    assert_eq!(app.get("/health/ready", None).await.status(), StatusCode::OK);

    let response = app.get("/health", None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
