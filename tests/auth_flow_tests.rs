// SPDX-License-Identifier: MIT

//! Auth route tests: OAuth callback, password sign-in/up, logout.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

mod common;

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, "localhost:8080")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_callback_exchanges_code_and_sets_cookies() {
    let (app, ctx) = common::create_test_app();
    let session = ctx.identity.mint_session("u1", Some("u1@example.com"));
    ctx.identity
        .exchangeable
        .insert("code-1".to_string(), session.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/callback?code=code-1")
                .header(header::HOST, "localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "http://localhost:8080/");

    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("portal_token={}", session.access_token))));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("portal_refresh={}", session.refresh_token))));
}

#[tokio::test]
async fn test_callback_derives_origin_from_forwarding_headers() {
    let (app, ctx) = common::create_test_app();
    let session = ctx.identity.mint_session("u1", None);
    ctx.identity
        .exchangeable
        .insert("code-1".to_string(), session);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/callback?code=code-1")
                .header(header::HOST, "internal-hop:8080")
                .header("x-forwarded-host", "portal.example.com")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "https://portal.example.com/");
}

#[tokio::test]
async fn test_callback_with_invalid_code_redirects_to_login_with_error() {
    let (app, _ctx) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/callback?code=bogus")
                .header(header::HOST, "localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("http://localhost:8080/login?error="));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_callback_without_code_redirects_home() {
    let (app, _ctx) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/callback")
                .header(header::HOST, "localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "http://localhost:8080/");
}

#[tokio::test]
async fn test_password_login_sets_session_cookies() {
    let (app, ctx) = common::create_test_app();
    let session = ctx.identity.mint_session("u1", Some("u1@example.com"));
    ctx.identity
        .password_logins
        .insert("u1@example.com:hunter22".to_string(), session);

    let response = app
        .oneshot(form_post(
            "/auth/login",
            "email=u1%40example.com&password=hunter22",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("portal_token=")));
}

#[tokio::test]
async fn test_password_login_failure_redirects_with_error() {
    let (app, _ctx) = common::create_test_app();

    let response = app
        .oneshot(form_post(
            "/auth/login",
            "email=u1%40example.com&password=wrong",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("/login?error="));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_signup_creates_initial_profile_row() {
    let (app, ctx) = common::create_test_app();

    let response = app
        .oneshot(form_post(
            "/auth/signup",
            "email=new%40example.com&password=hunter22",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("portal_token=")));

    let row = ctx
        .profiles
        .rows
        .get("user-new@example.com")
        .expect("initial profile row inserted");
    assert!(!row.onboarding_completed);
    assert!(row.question_1_answer.is_none());
}

#[tokio::test]
async fn test_signup_pending_confirmation_redirects_to_login_notice() {
    let (app, ctx) = common::create_test_app();
    ctx.identity.confirm_required.store(true, Ordering::SeqCst);

    let response = app
        .oneshot(form_post(
            "/auth/signup",
            "email=new%40example.com&password=hunter22",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login?notice=confirm");
    assert!(set_cookies(&response).is_empty());
    assert!(ctx.profiles.rows.is_empty());
}

#[tokio::test]
async fn test_signup_rejects_short_password_before_provider_call() {
    let (app, ctx) = common::create_test_app();

    let response = app
        .oneshot(form_post(
            "/auth/signup",
            "email=new%40example.com&password=short",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("/login?error="));
    assert!(ctx.identity.users_by_token.is_empty());
}

#[tokio::test]
async fn test_oauth_start_redirects_to_provider_authorize_url() {
    let (app, _ctx) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/oauth/github")
                .header(header::HOST, "localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        "https://auth.test/authorize?provider=github&\
         redirect_to=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback"
    );
}

#[tokio::test]
async fn test_logout_signs_out_and_expires_cookies() {
    let (app, ctx) = common::create_test_app();
    let session = ctx.seed_user("u1", "u1@example.com", Some(true));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(
                    header::COOKIE,
                    format!("portal_token={}", session.access_token),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login");

    let cookies = set_cookies(&response);
    let token_cookie = cookies
        .iter()
        .find(|c| c.starts_with("portal_token="))
        .expect("token removal cookie");
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(cookies.iter().any(|c| c.starts_with("portal_refresh=")));
    assert!(ctx.identity.signed_out.contains_key(&session.access_token));
}
