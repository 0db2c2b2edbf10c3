use scribe_core::{Role, Session};
use serde::Serialize;

/// Whether a session's tail shows an explicit commit action.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EvidenceSignal {
    pub present: bool,
    /// The matching tool command (latest match wins).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Look at the last `tail` events for an assistant tool invocation whose
/// command contains one of `keywords` (case-insensitive).
///
/// This is a hint for the classifier, not a selection: plenty of sessions
/// talk about commits without authoring the one being journaled.
pub fn detect_commit_evidence(
    session: &Session,
    tail: usize,
    keywords: &[String],
) -> EvidenceSignal {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return EvidenceSignal::default();
    }

    for event in session.tail(tail).iter().rev() {
        if event.role != Role::Assistant {
            continue;
        }
        for cmd in event.content.tool_commands() {
            let lowered = cmd.to_lowercase();
            if keywords.iter().any(|k| lowered.contains(k.as_str())) {
                return EvidenceSignal {
                    present: true,
                    command: Some(cmd.to_string()),
                    timestamp: Some(event.timestamp.clone()),
                };
            }
        }
    }
    EvidenceSignal::default()
}
