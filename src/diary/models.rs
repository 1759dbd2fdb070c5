use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<DiaryEntry> for DiaryResponse {
    fn from(entry: DiaryEntry) -> Self {
        DiaryResponse {
            id: entry.id,
            title: entry.title,
            content: entry.content,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateDiaryRequest {
    pub title: String,
    pub content: String,
}
