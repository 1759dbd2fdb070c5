use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::extractor::AuthenticatedUser,
    journal::models::{CreateJournalRequest, JournalEntry, JournalResponse},
    AppState,
};

pub async fn create_journal(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateJournalRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    let content = payload.content.trim();

    if content.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": "Journal content is required",
                "success": false,
            })),
        ));
    }

    let entry = sqlx::query_as::<_, JournalEntry>(
        "INSERT INTO journal_entries (id, owner, content) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(content)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "INSERT INTO journal_entries ... RETURNING *",
            error   = %e,
            user_id = %user_id,
            "DB error creating journal entry"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "message": "Failed to save journal entry",
                "success": false,
            })),
        )
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Journal entry created successfully",
            "success": true,
            "journal": JournalResponse::from(entry),
        })),
    ))
}

pub async fn get_user_journals(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    let journals = sqlx::query_as::<_, JournalResponse>(
        "SELECT content, created_at FROM journal_entries WHERE owner = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "SELECT content, created_at FROM journal_entries WHERE owner = ?",
            error   = %e,
            user_id = %user_id,
            "DB error listing journal entries"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "message": "Failed to fetch journals",
                "success": false,
            })),
        )
    })?;

    Ok(Json(serde_json::json!({
        "message": "Journals fetched successfully",
        "success": true,
        "journals": journals,
    })))
}
