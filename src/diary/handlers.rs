use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::extractor::AuthenticatedUser,
    diary::models::{CreateDiaryRequest, DiaryEntry, DiaryResponse},
    AppState,
};

pub async fn create_diary(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateDiaryRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    let title = payload.title.trim();
    let content = payload.content.trim();

    if title.is_empty() || content.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": "Title and content are required",
                "success": false,
            })),
        ));
    }

    let entry = sqlx::query_as::<_, DiaryEntry>(
        "INSERT INTO diary_entries (id, owner, title, content) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(content)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "INSERT INTO diary_entries ... RETURNING *",
            error   = %e,
            user_id = %user_id,
            "DB error creating diary entry"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "message": "Failed to create diary entry",
                "error": e.to_string(),
            })),
        )
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Diary entry created successfully",
            "success": true,
            "diary": DiaryResponse::from(entry),
        })),
    ))
}

pub async fn get_diaries(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    let entries = sqlx::query_as::<_, DiaryEntry>(
        "SELECT * FROM diary_entries WHERE owner = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "SELECT * FROM diary_entries WHERE owner = ?",
            error   = %e,
            user_id = %user_id,
            "DB error listing diary entries"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "message": "Failed to retrieve diaries",
                "error": e.to_string(),
            })),
        )
    })?;

    let diaries: Vec<DiaryResponse> = entries.into_iter().map(|e| e.into()).collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "diaries": diaries,
        "message": "Diaries retrieved successfully",
    })))
}
