use scribe_context::{CorrelationEngine, SessionSummary};
use scribe_core::EngineConfig;

use crate::config;
use crate::WindowArgs;

pub async fn execute(config: EngineConfig, window: &WindowArgs, json: bool) -> anyhow::Result<()> {
    let request = config::request(window)?;
    let engine = CorrelationEngine::new(config, None);
    let sessions = engine.candidate_sessions(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else if sessions.is_empty() {
        println!("No sessions in window for {}", request.project_path);
    } else {
        for s in &sessions {
            println!("{}", render_line(s));
        }
    }
    Ok(())
}

fn render_line(s: &SessionSummary) -> String {
    let marker = if s.evidence.present { " [commit]" } else { "" };
    format!(
        "{}  {} .. {}  {} events{}",
        s.id, s.start, s.last_activity, s.event_count, marker
    )
}
