use scribe_classify::ClassificationResult;
use scribe_core::{ConversationEvent, Role, Session, TimeWindow};
use scribe_redact::RedactionStats;
use scribe_transcript::{EvidenceSignal, GroupStats, ScanStats};
use serde::Serialize;

use crate::budget::BudgetReport;

/// One correlated event, reduced to normalized plain text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContextEvent {
    pub session_id: String,
    pub timestamp: String,
    pub role: Role,
    pub text: String,
    /// Carries only tool output; first to go under budget pressure.
    #[serde(skip)]
    pub tool_result_only: bool,
}

impl From<ConversationEvent> for ContextEvent {
    fn from(event: ConversationEvent) -> Self {
        Self {
            text: event.text(),
            tool_result_only: event.content.is_tool_result_only(),
            session_id: event.session_id.unwrap_or_default(),
            timestamp: event.timestamp,
            role: event.role,
        }
    }
}

/// A candidate session as seen by the disambiguation step.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub start: String,
    pub last_activity: String,
    pub event_count: usize,
    pub evidence: EvidenceSignal,
}

impl SessionSummary {
    pub fn new(session: &Session, evidence: EvidenceSignal) -> Self {
        Self {
            id: session.id().to_string(),
            start: session.start_timestamp().to_string(),
            last_activity: session.last_timestamp().to_string(),
            event_count: session.event_count(),
            evidence,
        }
    }
}

/// Everything the engine observed while building a [`CorrelatedContext`].
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationDiagnostics {
    pub window: TimeWindow,
    pub scan: ScanStats,
    pub grouping: GroupStats,
    pub candidate_sessions: Vec<SessionSummary>,
    pub classifier_called: bool,
    /// Absent when fewer than two sessions qualified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<ClassificationResult>,
    pub redaction: RedactionStats,
    pub budget: BudgetReport,
}

/// Engine output: chronologically ordered, redacted events plus diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelatedContext {
    pub events: Vec<ContextEvent>,
    pub diagnostics: CorrelationDiagnostics,
}

impl CorrelatedContext {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct session ids in output order.
    pub fn session_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for e in &self.events {
            if !ids.contains(&e.session_id.as_str()) {
                ids.push(&e.session_id);
            }
        }
        ids
    }
}
