use std::time::Duration;

/// Any failure of a classification attempt. All of these are recovered by
/// the fallback selector; none reach the engine's caller.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("no reasoning service configured")]
    NotConfigured,
    #[error("reasoning service timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("reasoning service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("reasoning service returned no completion text")]
    EmptyCompletion,
    #[error("no JSON object in response")]
    NoJsonObject,
    #[error("malformed JSON in response: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("response has no `sessionIds` field")]
    MissingSessionIds,
    #[error("`sessionIds` is not a list")]
    SessionIdsNotList,
}

impl From<reqwest::Error> for ClassifyError {
    fn from(e: reqwest::Error) -> Self {
        ClassifyError::Transport(e.to_string())
    }
}
