use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub owner: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The journal surface only ever exposes the text and its timestamp.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<JournalEntry> for JournalResponse {
    fn from(entry: JournalEntry) -> Self {
        JournalResponse {
            content: entry.content,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateJournalRequest {
    pub content: String,
}
