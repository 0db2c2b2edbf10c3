use scribe_core::{ClassifierConfig, CommitContext, Session};
use scribe_transcript::EvidenceSignal;

use crate::error::ClassifyError;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::response::{match_session_ids, parse_selection};
use crate::service::{CompletionRequest, ReasoningService};

/// Ask the reasoning service which candidate sessions produced the commit.
///
/// One call, bounded by `config.timeout()`, no retry. Any failure is
/// returned as-is for the fallback selector to handle. An empty result is
/// a legitimate answer.
pub async fn classify_sessions(
    service: &dyn ReasoningService,
    config: &ClassifierConfig,
    commit: &CommitContext,
    sessions: &[Session],
    evidence: &[EvidenceSignal],
) -> Result<Vec<String>, ClassifyError> {
    let request = CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: build_prompt(commit, sessions, evidence, config),
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
    };
    tracing::debug!(
        sessions = sessions.len(),
        prompt_chars = request.user.len(),
        "classifying sessions"
    );

    let timeout = config.timeout();
    let raw = tokio::time::timeout(timeout, service.complete(&request))
        .await
        .map_err(|_| ClassifyError::Timeout(timeout))??;

    let returned = parse_selection(&raw)?;
    let known: Vec<&str> = sessions.iter().map(Session::id).collect();
    let matched = match_session_ids(&returned, &known);
    tracing::info!(
        returned = returned.len(),
        matched = matched.len(),
        "classifier answered"
    );
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockReasoningService, MockReply};
    use scribe_core::event::Origin;
    use scribe_core::{parse_timestamp, ConversationEvent, MessageContent, Role};

    fn session(id: &str, minute: u32) -> Session {
        let ts = format!("2025-01-01T10:{minute:02}:00Z");
        Session::new(
            id,
            vec![ConversationEvent {
                session_id: Some(id.into()),
                at: parse_timestamp(&ts).unwrap(),
                timestamp: ts,
                origin_project: "/repo".into(),
                role: Role::User,
                content: MessageContent::Text("work".into()),
                origin: Origin::default(),
            }],
        )
        .unwrap()
    }

    fn sessions() -> Vec<Session> {
        vec![
            session("abc12345-6789-aaaa", 1),
            session("def00000-1111-bbbb", 2),
        ]
    }

    #[tokio::test]
    async fn prefix_reply_resolves_to_full_id() {
        let mock = MockReasoningService::new(vec![MockReply::Text(
            "```json\n{\"sessionIds\": [\"abc12345\"]}\n```".into(),
        )]);
        let got = classify_sessions(
            &mock,
            &ClassifierConfig::default(),
            &CommitContext::default(),
            &sessions(),
            &[],
        )
        .await
        .unwrap();
        assert_eq!(got, vec!["abc12345-6789-aaaa".to_string()]);
        assert_eq!(mock.calls(), 1);
        let req = mock.last_request().unwrap();
        assert_eq!(req.system, SYSTEM_PROMPT);
        assert!(req.user.contains("def00000-1111-bbbb"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_service_times_out() {
        let mock = MockReasoningService::new(vec![MockReply::Hang]);
        let err = classify_sessions(
            &mock,
            &ClassifierConfig::default(),
            &CommitContext::default(),
            &sessions(),
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClassifyError::Timeout(d) if d.as_secs() == 30));
    }

    #[tokio::test]
    async fn service_failure_propagates() {
        let mock = MockReasoningService::new(vec![MockReply::Fail("connection reset".into())]);
        let err = classify_sessions(
            &mock,
            &ClassifierConfig::default(),
            &CommitContext::default(),
            &sessions(),
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClassifyError::Transport(_)));
    }

    #[tokio::test]
    async fn malformed_reply_is_an_error() {
        let mock = MockReasoningService::new(vec![MockReply::Text("I think session one".into())]);
        let err = classify_sessions(
            &mock,
            &ClassifierConfig::default(),
            &CommitContext::default(),
            &sessions(),
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClassifyError::NoJsonObject));
    }
}
