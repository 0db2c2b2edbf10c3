use std::fmt::Write;

use scribe_core::{ClassifierConfig, CommitContext, Session};
use scribe_redact::redact;
use scribe_transcript::EvidenceSignal;

/// Fixes the response shape for the reasoning service.
pub const SYSTEM_PROMPT: &str = "You match git commits to the AI coding sessions that produced them. \
Respond with a single JSON object of the form {\"sessionIds\": [\"<full session id>\", ...]} and nothing else. \
Use the full session identifiers exactly as given. Return an empty list if no session produced the commit.";

const MAX_FILES: usize = 20;

fn truncate_chars(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut out: String = flat.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Build the user prompt for one classification call.
///
/// `evidence` is parallel to `sessions`; a missing entry counts as no
/// signal. All transcript and commit text is redacted before it is added.
pub fn build_prompt(
    commit: &CommitContext,
    sessions: &[Session],
    evidence: &[EvidenceSignal],
    config: &ClassifierConfig,
) -> String {
    let mut out = String::new();

    out.push_str("## Commit\n\n");
    let _ = writeln!(out, "Message: {}", redact(commit.message.trim()).text);
    if !commit.files.is_empty() {
        out.push_str("Files changed:\n");
        for file in commit.files.iter().take(MAX_FILES) {
            let _ = writeln!(out, "- {}", redact(file).text);
        }
        if commit.files.len() > MAX_FILES {
            let _ = writeln!(out, "- ... and {} more", commit.files.len() - MAX_FILES);
        }
    }
    if !commit.change_summary.trim().is_empty() {
        let _ = writeln!(out, "Summary: {}", redact(commit.change_summary.trim()).text);
    }

    out.push_str("\n## Candidate sessions\n");
    for (i, session) in sessions.iter().enumerate() {
        let _ = writeln!(out, "\n### Session {}", i + 1);
        let _ = writeln!(out, "ID: {}", session.id());
        let _ = writeln!(
            out,
            "Time: {} to {}",
            session.start_timestamp(),
            session.last_timestamp()
        );
        let _ = writeln!(out, "Messages: {}", session.event_count());
        if evidence.get(i).is_some_and(|e| e.present) {
            out.push_str("Evidence: last messages contain a commit action (strong signal)\n");
        }
        out.push_str("Last messages:\n");
        for event in session.tail(config.excerpt_messages) {
            let text = redact(&event.text()).text;
            let _ = writeln!(
                out,
                "- [{}] {}",
                event.role.as_str(),
                truncate_chars(&text, config.excerpt_chars)
            );
        }
    }

    out.push_str(
        "\n## Task\n\nWhich of these sessions produced this commit? \
Reply with JSON only: {\"sessionIds\": [...]} using the full IDs above. \
Several sessions may apply. Use [] if none apply.\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::event::Origin;
    use scribe_core::{parse_timestamp, ConversationEvent, MessageContent, Role};

    fn session(id: &str, texts: &[&str]) -> Session {
        let events = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let ts = format!("2025-01-01T10:0{i}:00Z");
                ConversationEvent {
                    session_id: Some(id.into()),
                    at: parse_timestamp(&ts).unwrap(),
                    timestamp: ts,
                    origin_project: "/repo".into(),
                    role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                    content: MessageContent::Text((*t).into()),
                    origin: Origin::default(),
                }
            })
            .collect();
        Session::new(id, events).unwrap()
    }

    fn commit() -> CommitContext {
        CommitContext {
            message: "fix parser edge case".into(),
            files: vec!["src/parser.rs".into()],
            change_summary: "1 file changed".into(),
            diff: String::new(),
        }
    }

    #[test]
    fn lists_full_ids_and_evidence() {
        let sessions = vec![
            session("abc12345-6789-aaaa", &["hi", "hello"]),
            session("def00000-1111-bbbb", &["x"]),
        ];
        let evidence = vec![
            EvidenceSignal {
                present: true,
                command: Some("git commit".into()),
                timestamp: None,
            },
            EvidenceSignal::default(),
        ];
        let p = build_prompt(&commit(), &sessions, &evidence, &ClassifierConfig::default());
        assert!(p.contains("ID: abc12345-6789-aaaa"));
        assert!(p.contains("ID: def00000-1111-bbbb"));
        assert!(p.contains("Messages: 2"));
        assert_eq!(p.matches("strong signal").count(), 1);
        assert!(p.contains("fix parser edge case"));
        assert!(p.contains("- src/parser.rs"));
        assert!(p.contains("\"sessionIds\""));
    }

    #[test]
    fn excerpts_are_redacted_and_truncated() {
        let long = "word ".repeat(200);
        let sessions = vec![
            session("s1", &["my key is sk-abcdef1234567890abcdef", &long]),
            session("s2", &["x"]),
        ];
        let p = build_prompt(&commit(), &sessions, &[], &ClassifierConfig::default());
        assert!(!p.contains("sk-abcdef1234567890abcdef"));
        assert!(p.contains("[REDACTED_KEY]"));
        assert!(p.contains("..."));
    }

    #[test]
    fn file_paths_are_redacted() {
        let mut c = commit();
        c.files = vec![
            "config/token=abcdefghijklmnop1234.env".into(),
            "docs/owner@example.com.md".into(),
        ];
        let p = build_prompt(&c, &[session("s1", &["x"])], &[], &ClassifierConfig::default());
        assert!(!p.contains("abcdefghijklmnop1234"));
        assert!(!p.contains("owner@example.com"));
        assert!(p.contains("- config/token=[REDACTED_KEY]"));
    }

    #[test]
    fn long_file_lists_are_capped() {
        let mut c = commit();
        c.files = (0..25).map(|i| format!("f{i}.rs")).collect();
        let p = build_prompt(&c, &[session("s1", &["x"])], &[], &ClassifierConfig::default());
        assert!(p.contains("- f19.rs"));
        assert!(!p.contains("- f20.rs"));
        assert!(p.contains("... and 5 more"));
    }
}
