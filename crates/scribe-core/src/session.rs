use serde::Serialize;
use time::OffsetDateTime;

use crate::event::{sort_chronologically, ConversationEvent};

/// A non-empty, chronologically sorted group of events sharing a session id.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    id: String,
    events: Vec<ConversationEvent>,
}

impl Session {
    /// Build a session, sorting its events. Returns `None` for an empty group.
    pub fn new(id: impl Into<String>, mut events: Vec<ConversationEvent>) -> Option<Self> {
        if events.is_empty() {
            return None;
        }
        sort_chronologically(&mut events);
        Some(Self {
            id: id.into(),
            events,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn events(&self) -> &[ConversationEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ConversationEvent> {
        self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn first(&self) -> &ConversationEvent {
        // Non-empty by construction.
        &self.events[0]
    }

    fn last(&self) -> &ConversationEvent {
        &self.events[self.events.len() - 1]
    }

    pub fn start_time(&self) -> OffsetDateTime {
        self.first().at
    }

    pub fn start_timestamp(&self) -> &str {
        &self.first().timestamp
    }

    /// Timestamp of the latest event.
    pub fn last_activity(&self) -> OffsetDateTime {
        self.last().at
    }

    pub fn last_timestamp(&self) -> &str {
        &self.last().timestamp
    }

    /// The last `n` events (fewer if the session is shorter).
    pub fn tail(&self, n: usize) -> &[ConversationEvent] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }
}
