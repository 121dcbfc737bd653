#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderName, Request, StatusCode, header, request::Builder},
};
use internhub::{
    ServerConfig, create_app,
    db::{Database, UserRole},
};
use serde_json::Value;
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
}

pub async fn create_test_app() -> TestApp {
    TestSetup::new().build().await
}

/// Builder for test setup with various options
pub struct TestSetup {
    no_signup: bool,
    rate_limit: bool,
    ip_header: Option<HeaderName>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            no_signup: false,
            rate_limit: false,
            ip_header: None,
        }
    }

    pub fn with_no_signup(mut self, no_signup: bool) -> Self {
        self.no_signup = no_signup;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: bool) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_ip_header(mut self, name: &'static str) -> Self {
        self.ip_header = Some(HeaderName::from_static(name));
        self
    }

    pub async fn build(self) -> TestApp {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let config = ServerConfig {
            db: db.clone(),
            jwt_secret: JWT_SECRET.to_vec(),
            no_signup: self.no_signup,
            rate_limit: self.rate_limit,
            ip_header: self.ip_header,
        };
        TestApp {
            app: create_app(&config),
            db,
        }
    }
}

impl TestApp {
    /// Start a request as if it came from `127.0.0.1` over TCP.
    pub fn builder(method: &str, uri: &str) -> Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    /// Send a prepared request and return the status with the parsed JSON
    /// body (`Value::Null` for empty or non-JSON bodies).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Self::builder(method, uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("DELETE", uri, token, None).await
    }

    pub async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/register",
            None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Log in and return the (access, refresh) pair.
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let (status, json) = self
            .post(
                "/api/token",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {json}");
        (
            json["access"].as_str().unwrap().to_string(),
            json["refresh"].as_str().unwrap().to_string(),
        )
    }

    /// Create a user with the given role directly in the store and log in.
    /// Returns (user id, access token).
    pub async fn user_with_role(&self, email: &str, role: UserRole) -> (i64, String) {
        let user = self
            .db
            .users()
            .create_with_role(email, "password123", role)
            .await
            .unwrap();
        let (access, _) = self.login(email, "password123").await;
        (user.id, access)
    }

    pub async fn user(&self, email: &str) -> (i64, String) {
        self.user_with_role(email, UserRole::User).await
    }

    pub async fn staff(&self, email: &str) -> (i64, String) {
        self.user_with_role(email, UserRole::Staff).await
    }

    pub async fn admin(&self, email: &str) -> (i64, String) {
        self.user_with_role(email, UserRole::Admin).await
    }
}
