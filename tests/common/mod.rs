#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use recruitment_ats::{config::Config, routes, store::MemoryStore, AppState};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "rh@example.com";
pub const ADMIN_PASSWORD: &str = "senha-super-secreta";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let uploads = std::env::temp_dir().join(format!("ats-uploads-{}", uuid::Uuid::new_v4()));
        let config = Config::for_memory("test_secret_key", &uploads.to_string_lossy());
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        state
            .auth_service
            .seed_admin(ADMIN_EMAIL, ADMIN_PASSWORD, "RH")
            .await
            .expect("seed admin");
        Self {
            router: routes::router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, JsonValue) {
        let resp = self.router.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, json)
    }

    pub async fn login(&self) -> String {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/auth/login",
                None,
                &serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().expect("token").to_string()
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &JsonValue,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}
