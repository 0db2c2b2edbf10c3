use scribe_core::event::sort_chronologically;
use scribe_core::{ConversationEvent, Session};
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

// ── Outcome types ──

/// How the final session set was chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    Ai,
    FallbackMostRecent,
    FallbackFirst,
    FallbackNone,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClassificationResult {
    pub selected_session_ids: Vec<String>,
    pub method: SelectionMethod,
}

/// Resolved selection: which sessions, how, and their merged events.
#[derive(Debug, Clone)]
pub struct Selection {
    pub result: ClassificationResult,
    pub events: Vec<ConversationEvent>,
}

// ── State machine ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectorState {
    MultiSessionEntry,
    AiAttempted,
    AiSuccessNonEmpty,
    AiSuccessEmpty,
    AiError,
    Resolved,
}

const VALID_TRANSITIONS: &[(SelectorState, &[SelectorState])] = &[
    (
        SelectorState::MultiSessionEntry,
        // classifier disabled counts as an error
        &[SelectorState::AiAttempted, SelectorState::AiError],
    ),
    (
        SelectorState::AiAttempted,
        &[
            SelectorState::AiSuccessNonEmpty,
            SelectorState::AiSuccessEmpty,
            SelectorState::AiError,
        ],
    ),
    (SelectorState::AiSuccessNonEmpty, &[SelectorState::Resolved]),
    (SelectorState::AiSuccessEmpty, &[SelectorState::Resolved]),
    (SelectorState::AiError, &[SelectorState::Resolved]),
];

pub fn is_valid_transition(from: SelectorState, to: SelectorState) -> bool {
    VALID_TRANSITIONS
        .iter()
        .any(|(f, targets)| *f == from && targets.contains(&to))
}

/// Recovery chain for multi-session correlation.
///
/// Resolution never fails: a non-empty classifier answer selects those
/// sessions, an empty answer selects the most recently active session, and
/// an error (or no attempt at all) selects the first session by start time.
#[derive(Debug)]
pub struct FallbackSelector {
    sessions: Vec<Session>,
    state: SelectorState,
    history: Vec<SelectorState>,
    selected: Vec<String>,
}

impl FallbackSelector {
    /// `sessions` must already be in group order (ascending start time).
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions,
            state: SelectorState::MultiSessionEntry,
            history: vec![SelectorState::MultiSessionEntry],
            selected: Vec::new(),
        }
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    /// Every state visited, starting with `MultiSessionEntry`.
    pub fn history(&self) -> &[SelectorState] {
        &self.history
    }

    fn advance(&mut self, to: SelectorState) -> bool {
        if !is_valid_transition(self.state, to) {
            tracing::warn!(from = ?self.state, to = ?to, "ignoring invalid selector transition");
            return false;
        }
        self.state = to;
        self.history.push(to);
        true
    }

    /// Mark that the classifier is being called.
    pub fn attempt(&mut self) -> bool {
        self.advance(SelectorState::AiAttempted)
    }

    /// Record the classifier outcome. Ids not naming a candidate session are
    /// ignored, so an answer made only of unknown ids counts as empty.
    pub fn record(&mut self, outcome: Result<Vec<String>, ClassifyError>) -> bool {
        if self.state == SelectorState::MultiSessionEntry {
            self.attempt();
        }
        match outcome {
            Ok(ids) => {
                self.selected = ids
                    .into_iter()
                    .filter(|id| self.sessions.iter().any(|s| s.id() == id))
                    .fold(Vec::new(), |mut acc, id| {
                        if !acc.contains(&id) {
                            acc.push(id);
                        }
                        acc
                    });
                if self.selected.is_empty() {
                    self.advance(SelectorState::AiSuccessEmpty)
                } else {
                    self.advance(SelectorState::AiSuccessNonEmpty)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "classifier failed; falling back to first session");
                self.advance(SelectorState::AiError)
            }
        }
    }

    /// Finish the chain and return the chosen events.
    pub fn resolve(mut self) -> Selection {
        if matches!(
            self.state,
            SelectorState::MultiSessionEntry | SelectorState::AiAttempted
        ) {
            self.advance(SelectorState::AiError);
        }
        let from = self.state;
        self.advance(SelectorState::Resolved);

        if self.sessions.is_empty() {
            return Selection {
                result: ClassificationResult {
                    selected_session_ids: Vec::new(),
                    method: SelectionMethod::FallbackNone,
                },
                events: Vec::new(),
            };
        }

        let (ids, method) = match from {
            SelectorState::AiSuccessNonEmpty => {
                (std::mem::take(&mut self.selected), SelectionMethod::Ai)
            }
            SelectorState::AiSuccessEmpty => (
                vec![most_recent(&self.sessions).id().to_string()],
                SelectionMethod::FallbackMostRecent,
            ),
            _ => (
                vec![self.sessions[0].id().to_string()],
                SelectionMethod::FallbackFirst,
            ),
        };
        tracing::info!(method = ?method, sessions = ids.len(), "selected sessions");

        let mut events: Vec<ConversationEvent> = self
            .sessions
            .into_iter()
            .filter(|s| ids.iter().any(|id| id == s.id()))
            .flat_map(Session::into_events)
            .collect();
        sort_chronologically(&mut events);

        Selection {
            result: ClassificationResult {
                selected_session_ids: ids,
                method,
            },
            events,
        }
    }
}

/// Session whose latest event is newest; ties go to the earlier session.
fn most_recent(sessions: &[Session]) -> &Session {
    let mut best = &sessions[0];
    for s in &sessions[1..] {
        if (s.last_activity(), s.last_timestamp()) > (best.last_activity(), best.last_timestamp()) {
            best = s;
        }
    }
    best
}

/// Run the chain in one go. `outcome` is `None` when the classifier was not
/// called.
pub fn select_with_fallback(
    sessions: Vec<Session>,
    outcome: Option<Result<Vec<String>, ClassifyError>>,
) -> Selection {
    let mut selector = FallbackSelector::new(sessions);
    if let Some(outcome) = outcome {
        selector.record(outcome);
    }
    selector.resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use scribe_core::event::Origin;
    use scribe_core::{parse_timestamp, MessageContent, Role};

    fn ev(session: &str, minute: u32) -> ConversationEvent {
        let ts = format!("2025-01-01T10:{minute:02}:00Z");
        ConversationEvent {
            session_id: Some(session.into()),
            at: parse_timestamp(&ts).unwrap(),
            timestamp: ts,
            origin_project: "/repo".into(),
            role: Role::User,
            content: MessageContent::Text(format!("{session}@{minute}")),
            origin: Origin::default(),
        }
    }

    /// `a` starts first; `b` starts later but `a` is active most recently.
    fn sessions() -> Vec<Session> {
        vec![
            Session::new("a-111", vec![ev("a-111", 1), ev("a-111", 9)]).unwrap(),
            Session::new("b-222", vec![ev("b-222", 3), ev("b-222", 5)]).unwrap(),
        ]
    }

    fn stamps(events: &[ConversationEvent]) -> Vec<&str> {
        events.iter().map(|e| e.timestamp.as_str()).collect()
    }

    #[test]
    fn transition_table() {
        use SelectorState::*;
        assert!(is_valid_transition(MultiSessionEntry, AiAttempted));
        assert!(is_valid_transition(AiAttempted, AiSuccessEmpty));
        assert!(is_valid_transition(AiError, Resolved));
        assert!(!is_valid_transition(MultiSessionEntry, Resolved));
        assert!(!is_valid_transition(Resolved, MultiSessionEntry));
        assert!(!is_valid_transition(AiSuccessEmpty, AiError));
    }

    #[test]
    fn nonempty_answer_merges_chronologically() {
        let sel = select_with_fallback(
            sessions(),
            Some(Ok(vec!["b-222".into(), "a-111".into()])),
        );
        assert_eq!(sel.result.method, SelectionMethod::Ai);
        assert_eq!(
            stamps(&sel.events),
            vec![
                "2025-01-01T10:01:00Z",
                "2025-01-01T10:03:00Z",
                "2025-01-01T10:05:00Z",
                "2025-01-01T10:09:00Z",
            ]
        );
    }

    #[test]
    fn single_match_returns_only_that_session() {
        let sel = select_with_fallback(sessions(), Some(Ok(vec!["b-222".into()])));
        assert_eq!(sel.result.selected_session_ids, vec!["b-222".to_string()]);
        assert!(sel.events.iter().all(|e| e.session_id.as_deref() == Some("b-222")));
    }

    #[test]
    fn empty_answer_picks_most_recent_activity() {
        let sel = select_with_fallback(sessions(), Some(Ok(vec![])));
        assert_eq!(sel.result.method, SelectionMethod::FallbackMostRecent);
        assert_eq!(sel.result.selected_session_ids, vec!["a-111".to_string()]);
        assert_eq!(sel.events.len(), 2);
    }

    #[test]
    fn unknown_ids_count_as_empty() {
        let mut selector = FallbackSelector::new(sessions());
        selector.record(Ok(vec!["zzz".into()]));
        assert_eq!(selector.state(), SelectorState::AiSuccessEmpty);
        assert_eq!(
            selector.resolve().result.method,
            SelectionMethod::FallbackMostRecent
        );
    }

    #[test]
    fn error_picks_first_session_deterministically() {
        for _ in 0..5 {
            let sel = select_with_fallback(
                sessions(),
                Some(Err(ClassifyError::Timeout(Duration::from_secs(30)))),
            );
            assert_eq!(sel.result.method, SelectionMethod::FallbackFirst);
            assert_eq!(sel.result.selected_session_ids, vec!["a-111".to_string()]);
            assert_eq!(
                stamps(&sel.events),
                vec!["2025-01-01T10:01:00Z", "2025-01-01T10:09:00Z"]
            );
        }
    }

    #[test]
    fn no_attempt_is_treated_as_error() {
        let selector = FallbackSelector::new(sessions());
        let sel = selector.resolve();
        assert_eq!(sel.result.method, SelectionMethod::FallbackFirst);
    }

    #[test]
    fn history_records_path() {
        let mut selector = FallbackSelector::new(sessions());
        assert!(selector.attempt());
        assert!(selector.record(Err(ClassifyError::EmptyCompletion)));
        assert!(!selector.attempt());
        assert_eq!(
            selector.history(),
            &[
                SelectorState::MultiSessionEntry,
                SelectorState::AiAttempted,
                SelectorState::AiError,
            ]
        );
    }

    #[test]
    fn no_sessions_resolves_to_none() {
        let sel = select_with_fallback(Vec::new(), Some(Ok(vec!["a".into()])));
        assert_eq!(sel.result.method, SelectionMethod::FallbackNone);
        assert!(sel.events.is_empty());
    }

    #[test]
    fn most_recent_tie_keeps_earlier_session() {
        let s = vec![
            Session::new("x", vec![ev("x", 1), ev("x", 7)]).unwrap(),
            Session::new("y", vec![ev("y", 2), ev("y", 7)]).unwrap(),
        ];
        assert_eq!(most_recent(&s).id(), "x");
    }
}
