use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use std::sync::Arc;

use crate::auth::models::Claims;
use crate::AppState;

/// Cookie carrying the session credential; HTTP-only so the SPA never
/// touches the token directly.
pub const AUTH_COOKIE: &str = "auth_token";

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

pub fn create_jwt(
    user_id: &str,
    name: &str,
    email: &str,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(expiry_hours))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// `Set-Cookie` value establishing the session.
pub fn auth_cookie(token: &str, expiry_hours: i64) -> String {
    format!(
        "{AUTH_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        expiry_hours * 3600
    )
}

/// `Set-Cookie` value clearing the session.
pub fn clear_auth_cookie() -> String {
    format!("{AUTH_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(AUTH_COOKIE))
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::to_string)
}

fn token_from_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// The credential is carried in the `auth_token` cookie; an
/// `Authorization: Bearer` header is accepted as a fallback. The cookie
/// wins when both are present.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    token_from_cookie(headers).or_else(|| token_from_bearer(headers))
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let token = extract_token(req.headers()).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Token not received"})),
        )
    })?;

    let claims = decode_jwt(&token, &state.config.jwt_secret).map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid or expired token"})),
        )
    })?;

    req.extensions_mut().insert(claims);

    Ok::<_, (StatusCode, Json<serde_json::Value>)>(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "my_secure_password";
        let hash = hash_password(password).expect("hashing failed");

        assert_ne!(password, hash);
        assert!(verify_password(password, &hash).expect("verification failed"));
        assert!(!verify_password("wrong_password", &hash).expect("verification failed"));
    }

    #[test]
    fn test_jwt_creation_and_decoding() {
        let secret = "super_secret_key";
        let user_id = "123-456";
        let name = "Test User";
        let email = "test@example.com";
        let expiry = 1;

        let token = create_jwt(user_id, name, email, secret, expiry).expect("creation failed");
        let claims = decode_jwt(&token, secret).expect("decoding failed");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.name, name);
        assert_eq!(claims.email, email);
    }

    #[test]
    fn test_jwt_expiration_validation() {
        let secret = "super_secret_key";
        // Create a JWT manually with past expiration
        let claims = Claims {
            sub: "123".to_string(),
            name: "test".to_string(),
            email: "test@example.com".to_string(),
            exp: (chrono::Utc::now().timestamp() - 3600) as usize, // 1 hour ago
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = decode_jwt(&token, secret);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=abc.def.ghi; lang=en"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("auth_token=cookie-token"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("header-token"));
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_name_must_match_exactly() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("auth_token_old=stale"),
        );
        assert_eq!(extract_token(&headers), None);
    }
}
