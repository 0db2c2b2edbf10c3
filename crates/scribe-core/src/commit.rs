use serde::{Deserialize, Serialize};

/// Commit metadata supplied by the caller's git layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitContext {
    pub message: String,
    #[serde(default)]
    pub files: Vec<String>,
    /// Short human summary of the change, e.g. a `--stat` line.
    #[serde(default)]
    pub change_summary: String,
    /// Full diff text. Counted against the token budget, never trimmed here.
    #[serde(default)]
    pub diff: String,
}
