use scribe_core::BudgetConfig;
use serde::Serialize;

use crate::context::ContextEvent;

/// Shortest text an event is truncated to.
const MIN_EVENT_CHARS: usize = 64;
const TRUNCATION_MARKER: &str = " ...[truncated]";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BudgetReport {
    pub max_chars: usize,
    pub chars_before: usize,
    pub chars_after: usize,
    pub estimated_tokens_before: usize,
    pub estimated_tokens_after: usize,
    pub events_removed: usize,
    pub tool_results_removed: usize,
    pub events_truncated: usize,
    pub chars_removed: usize,
    /// Still over the ceiling after every trimming stage.
    pub over_budget: bool,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate_to(text: &mut String, max: usize) -> usize {
    let before = char_len(text);
    if before <= max {
        return 0;
    }
    let keep = max.saturating_sub(char_len(TRUNCATION_MARKER));
    let cut = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(i, _)| i);
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    before - char_len(text)
}

/// Fit `events` plus `diff` under the configured character ceiling.
///
/// Trims in stages: tool-output-only events (oldest first), then any older
/// event, then the text of what is left. The newest `min_recent_events`
/// are never dropped, and a non-empty input never comes back empty.
pub fn apply_budget(
    mut events: Vec<ContextEvent>,
    diff: &str,
    config: &BudgetConfig,
) -> (Vec<ContextEvent>, BudgetReport) {
    let max_chars = config.max_chars();
    let cpt = config.chars_per_token.max(1);
    let diff_chars = char_len(diff);
    let mut total = diff_chars + events.iter().map(|e| char_len(&e.text)).sum::<usize>();

    let mut report = BudgetReport {
        max_chars,
        chars_before: total,
        ..BudgetReport::default()
    };

    if total > max_chars && !events.is_empty() {
        let protected = config.min_recent_events.max(1).min(events.len());
        let droppable = events.len() - protected;
        let mut keep = vec![true; events.len()];

        // Stage 1: tool output, oldest first.
        for (i, e) in events.iter().enumerate().take(droppable) {
            if total <= max_chars {
                break;
            }
            if e.tool_result_only {
                keep[i] = false;
                total -= char_len(&e.text);
                report.tool_results_removed += 1;
            }
        }
        // Stage 2: anything older than the protected tail.
        for (i, e) in events.iter().enumerate().take(droppable) {
            if total <= max_chars {
                break;
            }
            if keep[i] {
                keep[i] = false;
                total -= char_len(&e.text);
            }
        }

        let before = events.len();
        let mut flags = keep.into_iter();
        events.retain(|_| flags.next().unwrap_or(true));
        report.events_removed = before - events.len();

        // Stage 3: shorten what is left.
        if total > max_chars {
            let available = max_chars.saturating_sub(diff_chars);
            let per_event = (available / events.len()).max(MIN_EVENT_CHARS);
            for e in &mut events {
                let removed = truncate_to(&mut e.text, per_event);
                if removed > 0 {
                    report.events_truncated += 1;
                    total -= removed;
                }
            }
        }
        report.chars_removed = report.chars_before - total;
        report.over_budget = total > max_chars;

        tracing::info!(
            events_removed = report.events_removed,
            events_truncated = report.events_truncated,
            chars_removed = report.chars_removed,
            "applied token budget"
        );
    }

    report.chars_after = total;
    report.estimated_tokens_before = report.chars_before.div_ceil(cpt);
    report.estimated_tokens_after = total.div_ceil(cpt);
    (events, report)
}
