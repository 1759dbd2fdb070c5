use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    extractor::AuthenticatedUser,
    models::{AuthResponse, LoginRequest, SignupRequest, User},
    security::{auth_cookie, clear_auth_cookie, create_jwt, hash_password, verify_password},
};
use crate::AppState;

const MIN_PASSWORD_LENGTH: usize = 6;

type SetCookie = [(header::HeaderName, String); 1];

/// Extract the real client IP, preferring proxy-forwarded headers since we
/// are running behind nginx in prod.
fn extract_client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
        return ip.to_string();
    }
    if let Some(fwd) = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = fwd.split(',').next() {
            return first.trim().to_string();
        }
    }
    "unknown".to_string()
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, SetCookie, Json<AuthResponse>), (StatusCode, Json<serde_json::Value>)> {
    let client_ip = extract_client_ip(&headers);

    let name = payload.name.trim();
    let email = payload.email.trim();

    // Validate required fields before hitting the DB.
    if name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Name is required"})),
        ));
    }
    if email.is_empty() || !email.contains('@') {
        tracing::warn!(ip = %client_ip, "Signup validation failed - invalid email");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "A valid email is required"})),
        ));
    }
    if payload.password.trim().len() < MIN_PASSWORD_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Password should contain at least 6 characters"
            })),
        ));
    }

    let existing_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            tracing::error!(
                query = "SELECT * FROM users WHERE email = ?",
                error = %e,
                ip    = %client_ip,
                "DB error during signup email check"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Database error: {}", e)})),
            )
        })?;

    if existing_user.is_some() {
        tracing::warn!(
            email = %email,
            ip    = %client_ip,
            "Signup failed - email already exists"
        );
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "User with this email already exists"})),
        ));
    }

    let password_hash = hash_password(payload.password.trim()).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed during signup");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Password hashing error: {}", e)})),
        )
    })?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query = "INSERT INTO users ... RETURNING *",
            error = %e,
            email = %email,
            "DB error while creating user"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to create user: {}", e)})),
        )
    })?;

    let token = create_token(&state, &user)?;

    tracing::info!(
        user_id = %user.id,
        name    = %user.name,
        email   = %user.email,
        ip      = %client_ip,
        "New user signed up"
    );

    Ok((
        StatusCode::CREATED,
        [(
            header::SET_COOKIE,
            auth_cookie(&token, state.config.jwt_expiry_hours),
        )],
        Json(user.into()),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<(SetCookie, Json<AuthResponse>), (StatusCode, Json<serde_json::Value>)> {
    let client_ip = extract_client_ip(&headers);

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            tracing::error!(
                query = "SELECT * FROM users WHERE email = ?",
                error = %e,
                "DB error during login lookup"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Database error: {}", e)})),
            )
        })?
        .ok_or_else(|| {
            tracing::warn!(
                email = %payload.email,
                ip    = %client_ip,
                "Failed login attempt - user not found"
            );
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "Invalid credentials"})),
            )
        })?;

    let valid = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "Password verification error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Password verification error: {}", e)})),
        )
    })?;

    if !valid {
        tracing::warn!(
            user_id = %user.id,
            email   = %payload.email,
            ip      = %client_ip,
            "Failed login attempt - wrong password"
        );
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Invalid credentials"})),
        ));
    }

    let token = create_token(&state, &user)?;

    tracing::info!(
        user_id = %user.id,
        name    = %user.name,
        ip      = %client_ip,
        "Successful login"
    );

    // Cache user data for faster subsequent requests.
    let mut redis = state.redis.clone();
    let _ = crate::cache::CacheService::cache_user(&mut redis, &user.id.to_string(), &user).await;

    Ok((
        [(
            header::SET_COOKIE,
            auth_cookie(&token, state.config.jwt_expiry_hours),
        )],
        Json(user.into()),
    ))
}

pub async fn auth_status(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<AuthResponse>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        tracing::warn!(sub = %claims.sub, "auth_status - invalid user ID in token");
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    // Try cache first.
    let mut redis = state.redis.clone();
    let user = if let Ok(Some(cached_user)) =
        crate::cache::CacheService::get_user::<User>(&mut redis, &user_id.to_string()).await
    {
        cached_user
    } else {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| {
                tracing::error!(
                    query   = "SELECT * FROM users WHERE id = ?",
                    error   = %e,
                    user_id = %user_id,
                    "DB error in auth_status"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": format!("Database error: {}", e)})),
                )
            })?
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "User not registered OR Token malfunctioned"})),
                )
            })?;

        // Cache for next time.
        let _ =
            crate::cache::CacheService::cache_user(&mut redis, &user_id.to_string(), &user).await;
        user
    };

    Ok(Json(user.into()))
}

pub async fn logout(
    AuthenticatedUser(claims): AuthenticatedUser,
) -> (SetCookie, Json<serde_json::Value>) {
    tracing::info!(user_id = %claims.sub, "User logged out");

    (
        [(header::SET_COOKIE, clear_auth_cookie())],
        Json(serde_json::json!({"message": "OK"})),
    )
}

fn create_token(
    state: &AppState,
    user: &User,
) -> Result<String, (StatusCode, Json<serde_json::Value>)> {
    create_jwt(
        &user.id.to_string(),
        &user.name,
        &user.email,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )
    .map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "JWT generation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Token generation error: {}", e)})),
        )
    })
}
