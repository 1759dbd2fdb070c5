use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use companion_backend::auth::models::{LoginRequest, SignupRequest};
use sqlx::{Pool, Postgres};
use tower::ServiceExt; // for oneshot

mod common;

#[sqlx::test]
async fn test_signup_and_login_flow(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;

    // 1. Signup
    let signup_payload = SignupRequest {
        name: "Test User".into(),
        email: "test@example.com".into(),
        password: "password123".into(),
    };

    let response = app
        .router
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/v1/user/signup",
            serde_json::to_value(&signup_payload).unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("signup must set the session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "OK");
    assert_eq!(body["name"], "Test User");
    assert_eq!(body["email"], "test@example.com");

    // 2. Login
    let login_payload = LoginRequest {
        email: "test@example.com".into(),
        password: "password123".into(),
    };

    let response = app
        .router
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/v1/user/login",
            serde_json::to_value(&login_payload).unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let token = common::auth_cookie_token(&response);
    assert!(!token.is_empty());

    // 3. Login with wrong password
    let response = app
        .router
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/v1/user/login",
            serde_json::json!({
                "email": "test@example.com",
                "password": "wrongpassword",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 4. Login with unknown email
    let response = app
        .router
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/v1/user/login",
            serde_json::json!({
                "email": "nobody@example.com",
                "password": "password123",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
async fn test_duplicate_email_rejected(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;

    let payload = serde_json::json!({
        "name": "First",
        "email": "dup@example.com",
        "password": "password123",
    });

    let response = app
        .router
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/v1/user/signup",
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .router
        .clone()
        .oneshot(common::json_request("POST", "/api/v1/user/signup", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["error"], "User with this email already exists");
}

#[sqlx::test]
async fn test_signup_field_validation(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;

    let cases = [
        serde_json::json!({"name": "  ", "email": "a@example.com", "password": "password123"}),
        serde_json::json!({"name": "A", "email": "not-an-email", "password": "password123"}),
        serde_json::json!({"name": "A", "email": "a@example.com", "password": "short"}),
    ];

    for payload in cases {
        let response = app
            .router
            .clone()
            .oneshot(common::json_request(
                "POST",
                "/api/v1/user/signup",
                payload.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "payload should be rejected: {payload}"
        );
    }
}

#[sqlx::test]
async fn test_auth_status_with_cookie(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;
    let token = common::get_auth_token(&app.router, "status@example.com").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/user/auth-status")
                .method("GET")
                .header(header::COOKIE, format!("auth_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "OK");
    assert_eq!(body["email"], "status@example.com");
}

#[sqlx::test]
async fn test_protected_route_without_token(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/v1/user/auth-status")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
async fn test_invalid_token_rejected(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;

    let response = app
        .router
        .oneshot(common::authed_request(
            "GET",
            "/api/v1/user/auth-status",
            "not.a.jwt",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
async fn test_logout_clears_cookie(pool: Pool<Postgres>) {
    let app = common::spawn_app(pool).await;
    let token = common::get_auth_token(&app.router, "logout@example.com").await;

    let response = app
        .router
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/v1/user/logout",
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}
