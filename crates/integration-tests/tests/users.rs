//! User administration through the API.

use reqwest::StatusCode;
use serde_json::{Value, json};

use kiosky_integration_tests::TestApp;

#[tokio::test]
async fn test_only_admin_lists_users() {
    let app = TestApp::spawn().await;
    let customer = app.register_customer("c@x.com").await;
    let admin = app.admin("root@x.com").await;

    let response = app.get("/users", Some(&customer.token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/users", Some(&admin.token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn test_users_see_and_edit_only_themselves() {
    let app = TestApp::spawn().await;
    let alice = app.register_customer("alice@x.com").await;
    let bob = app.register_customer("bob@x.com").await;

    let response = app
        .get(&format!("/users/{}", alice.user_id), Some(&alice.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/users/{}", alice.user_id), Some(&bob.token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .put(
            &format!("/users/{}", alice.user_id),
            Some(&alice.token),
            &json!({ "fullName": "Alice Liddell" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["fullName"], "Alice Liddell");
    assert_eq!(user["email"], "alice@x.com");

    let response = app
        .put(
            &format!("/users/{}", alice.user_id),
            Some(&bob.token),
            &json!({ "fullName": "Mallory" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_assigns_roles() {
    let app = TestApp::spawn().await;
    let owner = app.register_owner("o@x.com", "shop1").await;
    let customer = app.register_customer("c@x.com").await;
    let admin = app.admin("root@x.com").await;
    let path = format!("/users/{}/role", customer.user_id);

    let body = json!({ "role": "employee", "employedAtStoreId": owner.store_id });
    let response = app.put(&path, Some(&customer.token), &body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.put(&path, Some(&admin.token), &body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "EMPLOYEE");
    assert_eq!(user["employedAtStoreId"], owner.store_id.unwrap());

    let response = app
        .put(&path, Some(&admin.token), &json!({ "role": "SUPERUSER" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .put(
            &format!("/users/{}/role", owner.user_id),
            Some(&admin.token),
            &json!({ "role": "CUSTOMER" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_store_owner_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let owner = app.register_owner("o@x.com", "shop1").await;
    let customer = app.register_customer("c@x.com").await;

    let response = app
        .delete(&format!("/users/{}", owner.user_id), Some(&owner.token))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .delete(&format!("/users/{}", customer.user_id), Some(&customer.token))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The token outlives the account but no longer authenticates
    let response = app.get("/auth/me", Some(&customer.token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
