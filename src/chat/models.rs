use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// One `{role, content}` turn as stored on the user's chat list and as
/// exchanged with the client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NewMessageRequest {
    pub message: String,
}
