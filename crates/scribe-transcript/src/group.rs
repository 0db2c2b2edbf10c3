use std::collections::BTreeMap;

use scribe_core::{ConversationEvent, Session};
use serde::Serialize;

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct GroupStats {
    pub sessions: usize,
    pub grouped_events: usize,
    /// Events with no session id; they cannot be attributed and are dropped.
    pub dropped_without_session: usize,
}

#[derive(Debug, Default)]
pub struct Grouping {
    /// Ordered by session start time.
    pub sessions: Vec<Session>,
    pub stats: GroupStats,
}

/// Partition events by session id.
///
/// Each session's events are sorted chronologically, and sessions are
/// ordered by their earliest event (ties broken by id). Identical input
/// always yields identical output.
pub fn group_sessions(events: Vec<ConversationEvent>) -> Grouping {
    let mut stats = GroupStats::default();
    let mut by_id: BTreeMap<String, Vec<ConversationEvent>> = BTreeMap::new();

    for event in events {
        match event.session_id.clone() {
            Some(id) => by_id.entry(id).or_default().push(event),
            None => stats.dropped_without_session += 1,
        }
    }

    let mut sessions: Vec<Session> = by_id
        .into_iter()
        .filter_map(|(id, events)| Session::new(id, events))
        .collect();
    sessions.sort_by(|a, b| {
        a.start_time()
            .cmp(&b.start_time())
            .then_with(|| a.start_timestamp().cmp(b.start_timestamp()))
            .then_with(|| a.id().cmp(b.id()))
    });

    stats.sessions = sessions.len();
    stats.grouped_events = sessions.iter().map(Session::event_count).sum();
    if stats.dropped_without_session > 0 {
        tracing::debug!(
            dropped = stats.dropped_without_session,
            "events without session id dropped"
        );
    }

    Grouping { sessions, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::event::Origin;
    use scribe_core::{parse_timestamp, MessageContent, Role};
    use std::collections::HashSet;

    fn ev(session: Option<&str>, ts: &str, line: usize) -> ConversationEvent {
        ConversationEvent {
            session_id: session.map(|s| s.to_string()),
            timestamp: ts.into(),
            at: parse_timestamp(ts).unwrap(),
            origin_project: "/repo".into(),
            role: Role::User,
            content: MessageContent::Text(format!("line {line}")),
            origin: Origin {
                file_index: 0,
                line,
            },
        }
    }

    fn sample() -> Vec<ConversationEvent> {
        vec![
            ev(Some("late"), "2025-01-01T11:00:00Z", 1),
            ev(Some("early"), "2025-01-01T10:05:00Z", 2),
            ev(None, "2025-01-01T10:06:00Z", 3),
            ev(Some("late"), "2025-01-01T10:30:00Z", 4),
            ev(Some("early"), "2025-01-01T10:01:00Z", 5),
        ]
    }

    #[test]
    fn sessions_ordered_by_start_time() {
        let g = group_sessions(sample());
        let ids: Vec<_> = g.sessions.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(g.sessions[0].start_timestamp(), "2025-01-01T10:01:00Z");
        assert_eq!(g.sessions[1].start_timestamp(), "2025-01-01T10:30:00Z");
        assert_eq!(g.stats.dropped_without_session, 1);
    }

    #[test]
    fn partition_has_no_overlap_and_no_loss() {
        let input = sample();
        let attributable: HashSet<usize> = input
            .iter()
            .filter(|e| e.session_id.is_some())
            .map(|e| e.origin.line)
            .collect();

        let g = group_sessions(input);
        let mut seen = HashSet::new();
        for s in &g.sessions {
            for e in s.events() {
                assert_eq!(e.session_id.as_deref(), Some(s.id()));
                assert!(seen.insert(e.origin.line), "event in two groups");
            }
        }
        assert_eq!(seen, attributable);
        assert_eq!(g.stats.grouped_events, attributable.len());
    }

    #[test]
    fn grouping_is_deterministic() {
        let mut reversed = sample();
        reversed.reverse();
        let a = group_sessions(sample());
        let b = group_sessions(reversed);
        assert_eq!(a.sessions, b.sessions);
    }

    #[test]
    fn empty_input_has_no_sessions() {
        let g = group_sessions(vec![]);
        assert!(g.sessions.is_empty());
        assert_eq!(g.stats, GroupStats::default());
    }
}
