// Sentiment extraction over a chat transcript. The provider is asked for a
// JSON object and its answer is parsed strictly: a reply that is not valid
// `{mood, score}` JSON with a score in [0, 1] is an error, never a default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub mood: String,
    pub score: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SentimentParseError {
    #[error("provider response is not valid sentiment JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("provider response has an empty mood label")]
    EmptyMood,
    #[error("provider sentiment score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),
}

pub fn sentiment_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of this text and return a JSON with 'mood' (emotion label) and 'score' (0-1 where 1 is most positive). Text: \"{text}\""
    )
}

/// Serialize chat turns into the flat `role: content` transcript the
/// sentiment prompt operates on.
pub fn conversation_text(turns: &[crate::chat::models::ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First 100 characters of the transcript, stored alongside the mood entry
/// as provenance.
pub fn excerpt(text: &str) -> String {
    let mut excerpt: String = text.chars().take(100).collect();
    excerpt.push_str("...");
    excerpt
}

pub fn parse_sentiment(raw: &str) -> Result<Sentiment, SentimentParseError> {
    let body = strip_code_fence(raw.trim());

    let sentiment: Sentiment = serde_json::from_str(body)?;

    if sentiment.mood.trim().is_empty() {
        return Err(SentimentParseError::EmptyMood);
    }
    if !(0.0..=1.0).contains(&sentiment.score) {
        return Err(SentimentParseError::ScoreOutOfRange(sentiment.score));
    }

    Ok(sentiment)
}

// Models routinely wrap JSON answers in a Markdown fence even when asked
// not to; tolerate that one decoration before the strict parse.
fn strip_code_fence(text: &str) -> &str {
    let body = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    body.strip_suffix("```").unwrap_or(body).trim()
}
