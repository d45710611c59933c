//! Integration test harness for Kiosky.
//!
//! Each [`TestApp`] serves the real router on an ephemeral port, backed by a
//! fresh in-memory database, and talks to it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kiosky-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};

use kiosky_api::config::ApiConfig;
use kiosky_api::db::{MemoryDatabase, UserRepository};
use kiosky_api::state::AppState;
use kiosky_core::{Role, StoreId, UserId};

/// Password that satisfies the registration policy.
pub const PASSWORD: &str = "Passw0rd!";

/// A running API server with its own database.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub state: AppState,
}

/// An account signed in through the API.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub token: String,
    /// Owned store for owners, workplace for employees.
    pub store_id: Option<i64>,
}

fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        jwt_secret: SecretString::from("kJ8#mN2$pQ5&rT9*vW3!xZ6@bC1%dF4^"),
        jwt_ttl: Duration::from_secs(3600),
        cors_origins: Vec::new(),
        auth_rate_limit: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

impl TestApp {
    /// Start a server on `127.0.0.1:0`.
    pub async fn spawn() -> Self {
        let state = AppState::new(test_config(), Arc::new(MemoryDatabase::new()));
        let app = kiosky_api::app(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            state,
        }
    }

    /// Send a request, optionally with a bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Response {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.expect("Request failed")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Response {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: &Value) -> Response {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response {
        self.request(Method::DELETE, path, token, None).await
    }

    /// Register a customer and return their session.
    pub async fn register_customer(&self, email: &str) -> Session {
        let response = self
            .post(
                "/auth/register",
                None,
                &json!({ "fullName": "Test Customer", "email": email, "password": PASSWORD }),
            )
            .await;
        session_from(response).await
    }

    /// Register an owner together with a store on `domain`.
    pub async fn register_owner(&self, email: &str, domain: &str) -> Session {
        let response = self.register_owner_raw(email, domain).await;
        session_from(response).await
    }

    /// Owner registration without asserting success.
    pub async fn register_owner_raw(&self, email: &str, domain: &str) -> Response {
        self.post(
            "/auth/register-owner",
            None,
            &json!({
                "fullName": "Test Owner",
                "email": email,
                "password": PASSWORD,
                "storeName": "Test Store",
                "domain": domain,
            }),
        )
        .await
    }

    /// Log in again and return a fresh session.
    pub async fn login(&self, email: &str) -> Session {
        let response = self
            .post(
                "/auth/login",
                None,
                &json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        session_from(response).await
    }

    /// Create a category and return its id.
    pub async fn create_category(&self, token: &str, store_id: i64, slug: &str) -> i64 {
        let response = self
            .post(
                "/categories",
                Some(token),
                &json!({ "name": slug, "slug": slug, "storeId": store_id }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        id_of(response).await
    }

    /// Create a product and return its id.
    pub async fn create_product(&self, token: &str, category_id: i64, slug: &str) -> i64 {
        let response = self
            .post(
                "/products",
                Some(token),
                &product_body(category_id, slug),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        id_of(response).await
    }
}

/// JSON body for creating a product.
#[must_use]
pub fn product_body(category_id: i64, slug: &str) -> Value {
    json!({
        "name": format!("Product {slug}"),
        "slug": slug,
        "price": "19.99",
        "categoryId": category_id,
    })
}

/// Parse a `LoginResponse`, asserting success.
pub async fn session_from(response: Response) -> Session {
    assert!(
        response.status().is_success(),
        "expected success, got {}",
        response.status()
    );
    let body: Value = response.json().await.expect("Invalid login response");
    Session {
        user_id: body["id"].as_i64().expect("missing id"),
        email: body["email"].as_str().expect("missing email").to_owned(),
        token: body["token"].as_str().expect("missing token").to_owned(),
        store_id: body["storeId"].as_i64(),
    }
}

/// Read the `id` field of a JSON response.
pub async fn id_of(response: Response) -> i64 {
    let body: Value = response.json().await.expect("Invalid JSON response");
    body["id"].as_i64().expect("missing id")
}

impl TestApp {
    /// Change a role directly in storage, bypassing the API.
    pub async fn set_role(&self, user_id: i64, role: Role, employed_at: Option<i64>) {
        self.state
            .db()
            .set_user_role(UserId::new(user_id), role, employed_at.map(StoreId::new))
            .await
            .expect("Failed to set role");
    }

    /// Register a customer and promote them to `ADMIN`.
    pub async fn admin(&self, email: &str) -> Session {
        let customer = self.register_customer(email).await;
        self.set_role(customer.user_id, Role::Admin, None).await;
        customer
    }
}
