mod common;

use axum::http::StatusCode;
use common::{get_request, json_request, TestApp, ADMIN_EMAIL};
use serde_json::json;

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::spawn().await;
    let (status, body) = app.send(get_request("/api/candidates", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, body) = app
        .send(get_request("/api/candidates", Some("not-a-jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::spawn().await;
    let (status, body) = app.send(get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "email": ADMIN_EMAIL, "password": "errada" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let (status, me) = app.send(get_request("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ADMIN_EMAIL);

    let (status, _) = app
        .send(json_request("POST", "/api/auth/logout", Some(&token), &json!({})))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(get_request("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn theme_defaults_to_dark_and_persists() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let (status, prefs) = app
        .send(get_request("/api/me/preferences", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["theme"], "dark");

    let (status, prefs) = app
        .send(json_request(
            "PUT",
            "/api/me/preferences",
            Some(&token),
            &json!({ "theme": "light" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["theme"], "light");

    let (_, prefs) = app
        .send(get_request("/api/me/preferences", Some(&token)))
        .await;
    assert_eq!(prefs["theme"], "light");
}
