use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::extractor::AuthenticatedUser,
    chat::models::ChatTurn,
    gemini::GeminiError,
    mood::models::{AnalyzeConversationRequest, CreateMoodRequest, MoodEntry, MoodResponse},
    mood::sentiment::{
        conversation_text, excerpt, parse_sentiment, sentiment_prompt, Sentiment,
        SentimentParseError,
    },
    AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Provider(#[from] GeminiError),
    #[error(transparent)]
    MalformedSentiment(#[from] SentimentParseError),
    #[error("failed to store mood entry: {0}")]
    Db(#[from] sqlx::Error),
}

/// Run sentiment extraction over `turns` and persist the resulting mood
/// entry. Shared by the analyze-conversation endpoint and the background
/// conversation-window task. Fails closed: a malformed provider reply is an
/// error and nothing is stored.
pub async fn analyze_and_store(
    state: &AppState,
    owner: Uuid,
    turns: &[ChatTurn],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<Sentiment, AnalyzeError> {
    let text = conversation_text(turns);

    let raw = state.gemini.generate(&sentiment_prompt(&text)).await?;
    let sentiment = parse_sentiment(&raw)?;

    let notes = format!(
        "Chat conversation analysis ({} - {})",
        start_time.format("%H:%M:%S"),
        end_time.format("%H:%M:%S"),
    );

    sqlx::query(
        r#"
        INSERT INTO mood_entries (id, owner, mood, sentiment, notes, chat_context)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner)
    .bind(&sentiment.mood)
    .bind(sentiment.score)
    .bind(&notes)
    .bind(excerpt(&text))
    .execute(&state.db)
    .await?;

    Ok(sentiment)
}

pub async fn analyze_conversation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<AnalyzeConversationRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    if payload.messages.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "Messages are required",
            })),
        ));
    }

    let sentiment = analyze_and_store(
        &state,
        user_id,
        &payload.messages,
        payload.start_time,
        payload.end_time,
    )
    .await
    .map_err(|e| {
        tracing::error!(
            error   = %e,
            user_id = %user_id,
            "Conversation analysis failed"
        );
        let message = match &e {
            AnalyzeError::MalformedSentiment(_) => "Provider returned malformed sentiment",
            _ => "Failed to analyze conversation",
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "message": message,
                "error": e.to_string(),
            })),
        )
    })?;

    Ok(Json(serde_json::json!({
        "success": true,
        "sentiment": sentiment,
        "message": "Conversation analyzed and mood entry created",
    })))
}

pub async fn create_mood_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateMoodRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    if payload.mood.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "Mood is required",
            })),
        ));
    }

    if !(0.0..=1.0).contains(&payload.sentiment) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "Sentiment score must be between 0 and 1",
            })),
        ));
    }

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        INSERT INTO mood_entries (id, owner, mood, sentiment, notes, chat_context)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(payload.mood.trim())
    .bind(payload.sentiment)
    .bind(payload.notes.unwrap_or_default())
    .bind(payload.chat_context)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "INSERT INTO mood_entries ... RETURNING *",
            error   = %e,
            user_id = %user_id,
            "DB error creating mood entry"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "message": "Failed to create mood entry",
                "error": e.to_string(),
            })),
        )
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Mood entry created successfully",
            "entry": MoodResponse::from(entry),
        })),
    ))
}

pub async fn get_mood_history(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    let entries = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE owner = $1 ORDER BY date DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "SELECT * FROM mood_entries WHERE owner = ?",
            error   = %e,
            user_id = %user_id,
            "DB error listing mood history"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "message": "Failed to retrieve mood history",
                "error": e.to_string(),
            })),
        )
    })?;

    let mood_history: Vec<MoodResponse> = entries.into_iter().map(|e| e.into()).collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "moodHistory": mood_history,
        "message": "Mood history retrieved successfully",
    })))
}
