use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::extractor::AuthenticatedUser,
    cache::CacheService,
    chat::models::{ChatTurn, NewMessageRequest, ROLE_ASSISTANT, ROLE_USER},
    AppState,
};

pub const INITIAL_GREETING: &str = "Hi there! 👋 I'm your friendly AI companion. How are you feeling today? I'd love to hear about your day!";

const FRIENDLY_CONTEXT: &str = "You are a caring and empathetic friend who wants to help. \
If the user expresses negative emotions or problems, show genuine concern and offer practical advice. \
If they're happy, share their joy and encourage them to elaborate. \
Keep the conversation natural and supportive.";

/// A conversation that has been running this long is analyzed for sentiment
/// and its window marker reset. Mirrors the 10-minute timer the web client
/// used to run in browser memory; keeping the marker in Redis makes the
/// window survive page reloads.
const CONVERSATION_ANALYSIS_WINDOW_MINUTES: i64 = 10;

fn build_prompt(history: &[ChatTurn], message: &str) -> String {
    let conversation_history = history
        .iter()
        .map(|turn| {
            let speaker = if turn.role == ROLE_USER {
                "Human"
            } else {
                "Assistant"
            };
            format!("{}: {}", speaker, turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{FRIENDLY_CONTEXT}\n\nConversation history:\n{conversation_history}\n\nHuman: {message}\nAssistant:"
    )
}

pub async fn generate_chat_completion(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<NewMessageRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    let message = payload.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Message is required"})),
        ));
    }

    // The token may outlive its account; check before generating anything.
    let user_exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            tracing::error!(
                query   = "SELECT id FROM users WHERE id = ?",
                error   = %e,
                user_id = %user_id,
                "DB error looking up chat user"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Database error: {}", e)})),
            )
        })?;

    if user_exists.is_none() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": "User not registered OR Token malfunctioned"})),
        ));
    }

    let history = sqlx::query_as::<_, ChatTurn>(
        "SELECT role, content FROM chat_messages WHERE owner = $1 ORDER BY seq ASC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "SELECT role, content FROM chat_messages WHERE owner = ?",
            error   = %e,
            user_id = %user_id,
            "DB error loading chat history"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
    })?;

    let prompt = build_prompt(&history, message);

    // Nothing is persisted until the provider has answered, so a failed
    // call leaves the stored chat list untouched.
    let reply = state.gemini.generate(&prompt).await.map_err(|e| {
        tracing::error!(
            error   = %e,
            user_id = %user_id,
            "Generative call failed for chat message"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "message": "Error with AI service",
                "error": e.to_string(),
            })),
        )
    })?;

    // One statement for both turns: the list grows by exactly two rows or
    // not at all.
    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, owner, role, content)
        VALUES ($1, $2, $3, $4), ($5, $2, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(ROLE_USER)
    .bind(message)
    .bind(Uuid::new_v4())
    .bind(ROLE_ASSISTANT)
    .bind(&reply)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "INSERT INTO chat_messages ... VALUES (user), (assistant)",
            error   = %e,
            user_id = %user_id,
            "DB error appending chat turns"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to store chat turns: {}", e)})),
        )
    })?;

    track_conversation_window(&state, user_id).await;

    let chats = sqlx::query_as::<_, ChatTurn>(
        "SELECT role, content FROM chat_messages WHERE owner = $1 ORDER BY seq ASC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
    })?;

    Ok(Json(serde_json::json!({ "chats": chats })))
}

pub async fn get_all_chats(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    let mut chats = sqlx::query_as::<_, ChatTurn>(
        "SELECT role, content FROM chat_messages WHERE owner = $1 ORDER BY seq ASC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
    })?;

    // A fresh chat list is seeded with the greeting; the seed is persisted
    // so every later read sees the same opening message.
    if chats.is_empty() {
        let greeting = seed_greeting(&state, user_id).await?;
        chats.push(greeting);
    }

    Ok(Json(serde_json::json!({ "message": "OK", "chats": chats })))
}

pub async fn delete_chats(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid user ID"})),
        )
    })?;

    sqlx::query("DELETE FROM chat_messages WHERE owner = $1")
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            tracing::error!(
                query   = "DELETE FROM chat_messages WHERE owner = ?",
                error   = %e,
                user_id = %user_id,
                "DB error clearing chat list"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Database error: {}", e)})),
            )
        })?;

    seed_greeting(&state, user_id).await?;

    let mut redis = state.redis.clone();
    let _ = CacheService::clear_conversation(&mut redis, &user_id.to_string()).await;

    tracing::info!(user_id = %user_id, "Chat list reset to greeting");

    Ok(Json(serde_json::json!({ "message": "OK" })))
}

async fn seed_greeting(
    state: &AppState,
    user_id: Uuid,
) -> Result<ChatTurn, (StatusCode, Json<serde_json::Value>)> {
    sqlx::query(
        "INSERT INTO chat_messages (id, owner, role, content) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(ROLE_ASSISTANT)
    .bind(INITIAL_GREETING)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(
            query   = "INSERT INTO chat_messages (greeting)",
            error   = %e,
            user_id = %user_id,
            "DB error seeding greeting"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to seed greeting: {}", e)})),
        )
    })?;

    Ok(ChatTurn {
        role: ROLE_ASSISTANT.to_string(),
        content: INITIAL_GREETING.to_string(),
    })
}

/// First send after an idle window records a start marker; a send arriving
/// ten minutes or more after the marker closes the window and hands the
/// turns since then to the mood analyzer in the background. Window
/// bookkeeping is best-effort and never fails the send itself.
async fn track_conversation_window(state: &Arc<AppState>, user_id: Uuid) {
    let now = Utc::now();
    let mut redis = state.redis.clone();

    match CacheService::conversation_started_at(&mut redis, &user_id.to_string()).await {
        Ok(Some(started_at))
            if now - started_at >= Duration::minutes(CONVERSATION_ANALYSIS_WINDOW_MINUTES) =>
        {
            let _ = CacheService::clear_conversation(&mut redis, &user_id.to_string()).await;
            spawn_window_analysis(state.clone(), user_id, started_at, now);
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            let _ =
                CacheService::mark_conversation_start(&mut redis, &user_id.to_string(), now).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user_id, "Conversation window lookup failed");
        }
    }
}

fn spawn_window_analysis(
    state: Arc<AppState>,
    user_id: Uuid,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) {
    tokio::spawn(async move {
        let turns = match sqlx::query_as::<_, ChatTurn>(
            "SELECT role, content FROM chat_messages WHERE owner = $1 AND created_at >= $2 ORDER BY seq ASC",
        )
        .bind(user_id)
        .bind(started_at)
        .fetch_all(&state.db)
        .await
        {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(
                    error   = %e,
                    user_id = %user_id,
                    "Conversation window analysis aborted - failed to load turns"
                );
                return;
            }
        };

        if turns.is_empty() {
            return;
        }

        match crate::mood::handlers::analyze_and_store(&state, user_id, &turns, started_at, ended_at)
            .await
        {
            Ok(sentiment) => {
                tracing::info!(
                    user_id = %user_id,
                    mood    = %sentiment.mood,
                    score   = sentiment.score,
                    "Conversation window analyzed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error   = %e,
                    user_id = %user_id,
                    "Conversation window analysis failed"
                );
            }
        }
    });
}
