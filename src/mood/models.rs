use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::chat::models::ChatTurn;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub owner: Uuid,
    pub mood: String,
    pub sentiment: f64,
    pub notes: String,
    pub chat_context: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodResponse {
    pub id: Uuid,
    pub mood: String,
    pub sentiment: f64,
    pub notes: String,
    pub chat_context: Option<String>,
    pub date: DateTime<Utc>,
}

impl From<MoodEntry> for MoodResponse {
    fn from(entry: MoodEntry) -> Self {
        MoodResponse {
            id: entry.id,
            mood: entry.mood,
            sentiment: entry.sentiment,
            notes: entry.notes,
            chat_context: entry.chat_context,
            date: entry.date,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateMoodRequest {
    pub mood: String,
    pub sentiment: f64,
    pub notes: Option<String>,
    #[serde(rename = "chatContext")]
    pub chat_context: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AnalyzeConversationRequest {
    pub messages: Vec<ChatTurn>,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
}
