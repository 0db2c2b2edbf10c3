use std::sync::Arc;

use scribe_classify::{
    classify_sessions, select_with_fallback, OpenAiChatService, ReasoningService,
};
use scribe_core::{
    CommitContext, ConversationEvent, EngineConfig, Session, TimeWindow, ValidationError,
};
use scribe_redact::{redact, redact_in_place, RedactionStats};
use scribe_transcript::{
    collect_window_events, detect_commit_evidence, discover_transcripts, group_sessions,
    EvidenceSignal, Grouping, ScanStats, WindowEvents,
};
use time::OffsetDateTime;

use crate::budget::apply_budget;
use crate::context::{ContextEvent, CorrelatedContext, CorrelationDiagnostics, SessionSummary};

/// Input for one correlation run.
#[derive(Debug, Clone)]
pub struct CorrelationRequest {
    pub current_commit_time: OffsetDateTime,
    /// `None` for the first commit in history.
    pub previous_commit_time: Option<OffsetDateTime>,
    /// Compared verbatim against each record's `cwd`.
    pub project_path: String,
    pub commit: CommitContext,
}

impl CorrelationRequest {
    pub fn new(project_path: impl Into<String>, current_commit_time: OffsetDateTime) -> Self {
        Self {
            current_commit_time,
            previous_commit_time: None,
            project_path: project_path.into(),
            commit: CommitContext::default(),
        }
    }

    pub fn since(mut self, previous_commit_time: OffsetDateTime) -> Self {
        self.previous_commit_time = Some(previous_commit_time);
        self
    }

    pub fn with_commit(mut self, commit: CommitContext) -> Self {
        self.commit = commit;
        self
    }
}

struct Gathered {
    window: TimeWindow,
    scan: ScanStats,
    grouping: Grouping,
}

/// Finds the conversation that produced a commit.
///
/// Stateless between requests; configuration is fixed at construction.
pub struct CorrelationEngine {
    config: EngineConfig,
    classifier: Option<Arc<dyn ReasoningService>>,
}

impl CorrelationEngine {
    /// `classifier: None` disables AI disambiguation; multi-session windows
    /// then resolve to the first session.
    pub fn new(config: EngineConfig, classifier: Option<Arc<dyn ReasoningService>>) -> Self {
        Self { config, classifier }
    }

    /// Build an engine with the HTTP classifier when an API key is configured.
    pub fn from_config(config: EngineConfig) -> Self {
        let classifier: Option<Arc<dyn ReasoningService>> =
            match OpenAiChatService::from_config(&config.classifier) {
                Ok(service) => Some(Arc::new(service)),
                Err(e) => {
                    tracing::info!(reason = %e, "classifier unavailable; using fallback only");
                    None
                }
            };
        Self::new(config, classifier)
    }

    async fn gather(&self, request: &CorrelationRequest) -> Result<Gathered, ValidationError> {
        if request.project_path.trim().is_empty() {
            return Err(ValidationError::EmptyProjectPath);
        }
        let window = TimeWindow::new(request.previous_commit_time, request.current_commit_time);
        if window.is_empty() {
            return Ok(Gathered {
                window,
                scan: ScanStats::default(),
                grouping: Grouping::default(),
            });
        }

        let files = discover_transcripts(&self.config.scan.projects_dir);
        let WindowEvents { events, stats } = collect_window_events(
            &files,
            window,
            &request.project_path,
            self.config.scan.concurrency,
        )
        .await;
        let grouping = group_sessions(events);
        tracing::debug!(
            files = stats.files_found,
            accepted = stats.records_accepted,
            sessions = grouping.stats.sessions,
            "window scan"
        );
        Ok(Gathered {
            window,
            scan: stats,
            grouping,
        })
    }

    fn evidence(&self, session: &Session) -> EvidenceSignal {
        detect_commit_evidence(
            session,
            self.config.scan.evidence_tail,
            &self.config.scan.commit_keywords,
        )
    }

    /// List the sessions active in the window, with commit evidence, without
    /// calling the classifier.
    pub async fn candidate_sessions(
        &self,
        request: &CorrelationRequest,
    ) -> Result<Vec<SessionSummary>, ValidationError> {
        let gathered = self.gather(request).await?;
        Ok(gathered
            .grouping
            .sessions
            .iter()
            .map(|s| SessionSummary::new(s, redact_evidence(self.evidence(s))))
            .collect())
    }

    /// Run the full pipeline.
    ///
    /// Only an empty project path fails. An empty window (previous commit at
    /// or after the current one) yields an empty context. Scan, parse and
    /// classifier failures degrade to skipped input or a fallback selection.
    pub async fn correlate(
        &self,
        request: &CorrelationRequest,
    ) -> Result<CorrelatedContext, ValidationError> {
        let Gathered {
            window,
            scan,
            grouping,
        } = self.gather(request).await?;
        let Grouping {
            sessions,
            stats: group_stats,
        } = grouping;

        let mut candidates = Vec::new();
        let mut classifier_called = false;
        let mut selection = None;

        let events: Vec<ConversationEvent> = match sessions.len() {
            0 => {
                tracing::info!("no conversation in window");
                Vec::new()
            }
            1 => {
                tracing::info!(session = sessions[0].id(), "single session in window");
                candidates.push(SessionSummary::new(&sessions[0], EvidenceSignal::default()));
                sessions.into_iter().flat_map(Session::into_events).collect()
            }
            n => {
                tracing::info!(sessions = n, "disambiguating sessions");
                let evidence: Vec<EvidenceSignal> =
                    sessions.iter().map(|s| self.evidence(s)).collect();
                candidates = sessions
                    .iter()
                    .zip(&evidence)
                    .map(|(s, e)| SessionSummary::new(s, redact_evidence(e.clone())))
                    .collect();
                if self.config.debug {
                    for c in &candidates {
                        tracing::debug!(
                            session = %c.id,
                            events = c.event_count,
                            start = %c.start,
                            last = %c.last_activity,
                            evidence = c.evidence.present,
                            "candidate session"
                        );
                    }
                }

                let outcome = match &self.classifier {
                    Some(service) => {
                        classifier_called = true;
                        Some(
                            classify_sessions(
                                service.as_ref(),
                                &self.config.classifier,
                                &request.commit,
                                &sessions,
                                &evidence,
                            )
                            .await,
                        )
                    }
                    None => None,
                };
                let chosen = select_with_fallback(sessions, outcome);
                selection = Some(chosen.result);
                chosen.events
            }
        };

        let mut redaction = RedactionStats::default();
        let mut events: Vec<ContextEvent> = events.into_iter().map(ContextEvent::from).collect();
        for e in &mut events {
            redact_in_place(&mut e.text, &mut redaction);
        }
        if redaction.total() > 0 {
            tracing::info!(
                keys = redaction.keys_redacted,
                jwts = redaction.jwts_redacted,
                tokens = redaction.tokens_redacted,
                emails = redaction.emails_redacted,
                "redacted sensitive data"
            );
        }

        let (events, budget) = apply_budget(events, &request.commit.diff, &self.config.budget);

        Ok(CorrelatedContext {
            events,
            diagnostics: CorrelationDiagnostics {
                window,
                scan,
                grouping: group_stats,
                candidate_sessions: candidates,
                classifier_called,
                selection,
                redaction,
                budget,
            },
        })
    }
}

fn redact_evidence(mut signal: EvidenceSignal) -> EvidenceSignal {
    signal.command = signal.command.map(|c| redact(&c).text);
    signal
}
