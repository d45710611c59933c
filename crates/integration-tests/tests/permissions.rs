//! Store-scoped permissions enforced end to end.

use reqwest::StatusCode;
use serde_json::{Value, json};

use kiosky_core::Role;
use kiosky_integration_tests::{TestApp, id_of, product_body};

#[tokio::test]
async fn test_owner_flow_and_customer_denied() {
    let app = TestApp::spawn().await;
    app.register_owner("owner@x.com", "shop1").await;
    let owner = app.login("owner@x.com").await;
    let store_id = owner.store_id.unwrap();

    let category_id = app.create_category(&owner.token, store_id, "shoes").await;
    let response = app
        .post("/products", Some(&owner.token), &product_body(category_id, "runner"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product: Value = response.json().await.unwrap();
    assert_eq!(product["storeId"], store_id);
    assert_eq!(product["categoryId"], category_id);
    assert_eq!(product["price"], "19.99");

    let customer = app.register_customer("c@x.com").await;
    let response = app
        .post("/products", Some(&customer.token), &product_body(category_id, "sneaky"))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "FORBIDDEN");

    let products: Vec<Value> = app.get("/products", None).await.json().await.unwrap();
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn test_owner_cannot_delete_other_store() {
    let app = TestApp::spawn().await;
    let a = app.register_owner("a@x.com", "ashop").await;
    let b = app.register_owner("b@x.com", "bshop").await;
    let b_store = b.store_id.unwrap();

    let response = app
        .delete(&format!("/stores/{b_store}"), Some(&a.token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        app.get(&format!("/stores/{b_store}"), None).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_mutations_require_authentication() {
    let app = TestApp::spawn().await;
    let owner = app.register_owner("o@x.com", "shop1").await;
    let store_id = owner.store_id.unwrap();

    let response = app
        .post(
            "/categories",
            None,
            &json!({ "name": "Shoes", "slug": "shoes", "storeId": store_id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.delete("/stores/999", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_with_products_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let owner = app.register_owner("o@x.com", "shop1").await;
    let store_id = owner.store_id.unwrap();
    let category_id = app.create_category(&owner.token, store_id, "shoes").await;
    let product_id = app.create_product(&owner.token, category_id, "runner").await;

    let response = app
        .delete(&format!("/categories/{category_id}"), Some(&owner.token))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "RESOURCE_IN_USE");

    assert_eq!(
        app.get(&format!("/categories/{category_id}"), None).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        app.get(&format!("/products/{product_id}"), None).await.status(),
        StatusCode::OK
    );

    // Store deletion is refused while it has content
    let response = app
        .delete(&format!("/stores/{store_id}"), Some(&owner.token))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Emptying the store in order makes every delete succeed
    for path in [
        format!("/products/{product_id}"),
        format!("/categories/{category_id}"),
        format!("/stores/{store_id}"),
    ] {
        let response = app.delete(&path, Some(&owner.token)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{path}");
    }
}

#[tokio::test]
async fn test_missing_resources_are_forbidden_for_non_admins() {
    let app = TestApp::spawn().await;
    let owner = app.register_owner("o@x.com", "shop1").await;
    let admin = app.admin("root@x.com").await;

    let response = app.delete("/categories/9999", Some(&owner.token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.delete("/products/9999", Some(&owner.token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.delete("/categories/9999", Some(&admin.token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_employee_scoped_to_workplace() {
    let app = TestApp::spawn().await;
    let a = app.register_owner("a@x.com", "ashop").await;
    let b = app.register_owner("b@x.com", "bshop").await;
    let a_store = a.store_id.unwrap();
    let b_store = b.store_id.unwrap();
    let a_category = app.create_category(&a.token, a_store, "shoes").await;
    let b_category = app.create_category(&b.token, b_store, "hats").await;

    let employee = app.register_customer("e@x.com").await;
    app.set_role(employee.user_id, Role::Employee, Some(a_store)).await;

    let response = app
        .post("/products", Some(&employee.token), &product_body(a_category, "runner"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .post("/products", Some(&employee.token), &product_body(b_category, "cap"))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Working at a store is not owning it
    let response = app
        .delete(&format!("/stores/{a_store}"), Some(&employee.token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let store: Value = app
        .get(&format!("/stores/{a_store}"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(store["ownerId"], a.user_id);
}

#[tokio::test]
async fn test_moving_product_to_foreign_store_is_denied() {
    let app = TestApp::spawn().await;
    let a = app.register_owner("a@x.com", "ashop").await;
    let b = app.register_owner("b@x.com", "bshop").await;
    let a_category = app.create_category(&a.token, a.store_id.unwrap(), "shoes").await;
    let b_category = app.create_category(&b.token, b.store_id.unwrap(), "hats").await;
    let product_id = app.create_product(&a.token, a_category, "runner").await;

    let response = app
        .put(
            &format!("/products/{product_id}"),
            Some(&a.token),
            &json!({ "categoryId": b_category }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let product: Value = app
        .get(&format!("/products/{product_id}"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(product["storeId"], a.store_id.unwrap());
}

#[tokio::test]
async fn test_role_change_applies_to_existing_token() {
    let app = TestApp::spawn().await;
    let owner = app.register_owner("o@x.com", "shop1").await;
    let store_id = owner.store_id.unwrap();
    let customer = app.register_customer("c@x.com").await;

    let body = json!({ "name": "Shoes", "slug": "shoes", "storeId": store_id });
    let response = app.post("/categories", Some(&customer.token), &body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    app.set_role(customer.user_id, Role::Admin, None).await;

    let response = app.post("/categories", Some(&customer.token), &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_store_for_existing_user_promotes_to_owner() {
    let app = TestApp::spawn().await;
    let customer = app.register_customer("c@x.com").await;

    let response = app
        .post(
            &format!("/stores/user/{}", customer.user_id),
            Some(&customer.token),
            &json!({ "name": "Corner Shop", "domain": "corner" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let store_id = id_of(response).await;

    let me: Value = app
        .get("/auth/me", Some(&customer.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "OWNER");
    assert_eq!(me["storeId"], store_id);

    let response = app
        .put(
            &format!("/stores/{store_id}"),
            Some(&customer.token),
            &json!({ "name": "Corner Shop 2" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            reqwest::Method::PATCH,
            &format!("/stores/{store_id}/theme"),
            Some(&customer.token),
            Some(&json!({ "primary": "#222" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let store: Value = response.json().await.unwrap();
    assert_eq!(store["themeSettings"]["primary"], "#222");
    assert_eq!(store["name"], "Corner Shop 2");
}
