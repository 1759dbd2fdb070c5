use axum::{
    body::Body,
    http::{header, Request, Response},
};
use companion_backend::{create_router, AppState, Config, GeminiClient};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub db: PgPool,
    pub state: Arc<AppState>,
}

pub const TEST_JWT_SECRET: &str = "test_secret";

pub fn test_config(gemini_base_url: &str) -> Config {
    Config {
        database_url: "postgres://...".to_string(), // pool is injected directly
        redis_url: "redis://127.0.0.1/".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiry_hours: 24,
        server_address: "127.0.0.1:0".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        gemini_api_key: Some("test-api-key".to_string()),
        gemini_model: "gemini-1.5-flash".to_string(),
        gemini_base_url: gemini_base_url.to_string(),
    }
}

pub async fn spawn_app_with_config(pool: PgPool, config: Config) -> TestApp {
    // AppState requires Redis; tests assume one is reachable on localhost,
    // the same assumption the docker-compose dev setup makes.
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).expect("invalid Redis URL");
    let redis = redis_client
        .get_connection_manager()
        .await
        .expect("failed to connect to Redis");

    let gemini = GeminiClient::new(&config);

    let state = Arc::new(AppState {
        db: pool.clone(),
        redis,
        config,
        gemini,
    });

    let router = create_router(state.clone());

    TestApp {
        router,
        db: pool,
        state,
    }
}

/// App whose Gemini client points at nothing; fine for tests that never
/// reach the generative path.
pub async fn spawn_app(pool: PgPool) -> TestApp {
    spawn_app_with_config(pool.clone(), test_config("http://127.0.0.1:9")).await
}

/// App whose Gemini client points at a wiremock server.
#[allow(dead_code)]
pub async fn spawn_app_with_gemini(pool: PgPool, gemini_base_url: &str) -> TestApp {
    spawn_app_with_config(pool.clone(), test_config(gemini_base_url)).await
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn authed_json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Token from the `Set-Cookie: auth_token=...` header of a signup/login
/// response.
pub fn auth_cookie_token(response: &Response<Body>) -> String {
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("no Set-Cookie header")
        .to_str()
        .unwrap();
    cookie
        .split(';')
        .next()
        .unwrap()
        .strip_prefix("auth_token=")
        .expect("cookie is not auth_token")
        .to_string()
}

/// Sign up a fresh user and return the session token from the cookie.
pub async fn get_auth_token(router: &axum::Router, email: &str) -> String {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/user/signup",
            serde_json::json!({
                "name": "Test User",
                "email": email,
                "password": "password123",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    auth_cookie_token(&response)
}

/// User id encoded in a session token.
#[allow(dead_code)]
pub fn user_id_for(token: &str) -> uuid::Uuid {
    let claims =
        companion_backend::auth::security::decode_jwt(token, TEST_JWT_SECRET).expect("bad token");
    uuid::Uuid::parse_str(&claims.sub).unwrap()
}
