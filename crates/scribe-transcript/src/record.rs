use scribe_core::event::Origin;
use scribe_core::{parse_timestamp, ConversationEvent, MessageContent, Role};
use serde_json::Value;

/// Why a transcript line did not become a [`ConversationEvent`].
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is not a JSON object")]
    NotObject,
    #[error("non-message record type {0:?}")]
    NotMessage(String),
    #[error("meta record")]
    Meta,
    #[error("missing or unparseable timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("missing message content")]
    MissingContent,
}

impl RecordError {
    /// Stable label used as a stats key.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::Json(_) | RecordError::NotObject => "parse_error",
            RecordError::NotMessage(_) => "non_message",
            RecordError::Meta => "meta",
            RecordError::InvalidTimestamp(_) => "invalid_timestamp",
            RecordError::MissingContent => "missing_content",
        }
    }
}

/// Parse one transcript line.
///
/// Only `user` and `assistant` records become events. Summary, system,
/// progress and snapshot records, and records flagged `isMeta`, are
/// reported as errors so callers can count them.
pub fn parse_record(line: &str, origin: Origin) -> Result<ConversationEvent, RecordError> {
    let value: Value = serde_json::from_str(line)?;
    if !value.is_object() {
        return Err(RecordError::NotObject);
    }

    let record_type = value.get("type").and_then(|v| v.as_str()).unwrap_or("");
    if !matches!(record_type, "user" | "assistant") {
        return Err(RecordError::NotMessage(record_type.to_string()));
    }
    if value.get("isMeta").and_then(|v| v.as_bool()) == Some(true) {
        return Err(RecordError::Meta);
    }

    let message = value.get("message");
    let role = message
        .and_then(|m| m.get("role"))
        .and_then(|r| r.as_str())
        .and_then(Role::parse)
        .or_else(|| Role::parse(record_type))
        .ok_or_else(|| RecordError::NotMessage(record_type.to_string()))?;

    let timestamp = value
        .get("timestamp")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let at = parse_timestamp(&timestamp)
        .ok_or_else(|| RecordError::InvalidTimestamp(timestamp.clone()))?;

    let content = message
        .and_then(|m| m.get("content"))
        .and_then(MessageContent::from_value)
        .ok_or(RecordError::MissingContent)?;

    let session_id = value
        .get("sessionId")
        .or_else(|| value.get("session_id"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let origin_project = value
        .get("cwd")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Ok(ConversationEvent {
        session_id,
        timestamp,
        at,
        origin_project,
        role,
        content,
        origin,
    })
}
