use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use scribe_core::event::{sort_chronologically, Origin};
use scribe_core::{ConversationEvent, TimeWindow};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::record::parse_record;

/// Side-channel counters for one scan. Not part of the result semantics.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ScanStats {
    pub files_found: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub lines_parsed: usize,
    pub records_accepted: usize,
    pub rejected_project: usize,
    pub rejected_window: usize,
    /// Lines that never became events, keyed by [`crate::RecordError::kind`].
    pub rejected_by_kind: BTreeMap<String, usize>,
}

impl ScanStats {
    fn merge(&mut self, other: ScanStats) {
        self.files_found += other.files_found;
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.lines_parsed += other.lines_parsed;
        self.records_accepted += other.records_accepted;
        self.rejected_project += other.rejected_project;
        self.rejected_window += other.rejected_window;
        for (kind, n) in other.rejected_by_kind {
            *self.rejected_by_kind.entry(kind).or_insert(0) += n;
        }
    }
}

/// Events that passed the project and window filters, in chronological order.
#[derive(Debug, Default)]
pub struct WindowEvents {
    pub events: Vec<ConversationEvent>,
    pub stats: ScanStats,
}

/// Filter the lines of one transcript file.
///
/// Every non-blank line is parsed on its own; a bad line never aborts the
/// rest of the file. A record is kept only when its `cwd` equals
/// `project_path` exactly and its timestamp is inside `window`.
pub fn filter_records(
    content: &str,
    file_index: usize,
    window: &TimeWindow,
    project_path: &str,
) -> (Vec<ConversationEvent>, ScanStats) {
    let mut stats = ScanStats::default();
    let mut events = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines_parsed += 1;

        let origin = Origin {
            file_index,
            line: idx + 1,
        };
        let event = match parse_record(line, origin) {
            Ok(ev) => ev,
            Err(e) => {
                *stats.rejected_by_kind.entry(e.kind().to_string()).or_insert(0) += 1;
                continue;
            }
        };

        if event.origin_project != project_path {
            stats.rejected_project += 1;
        } else if !window.contains(event.at) {
            stats.rejected_window += 1;
        } else {
            stats.records_accepted += 1;
            events.push(event);
        }
    }

    (events, stats)
}

/// Read and filter `files` concurrently, at most `concurrency` at a time.
///
/// Unreadable files are skipped and counted. Per-file results are merged
/// and re-sorted, so output order never depends on completion order.
/// Dropping the returned future aborts in-flight reads.
pub async fn collect_window_events(
    files: &[PathBuf],
    window: TimeWindow,
    project_path: &str,
    concurrency: usize,
) -> WindowEvents {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let project: Arc<str> = Arc::from(project_path);
    let mut tasks = JoinSet::new();

    for (file_index, path) in files.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let project = Arc::clone(&project);
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return None;
            };
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes);
                    Some(filter_records(&content, file_index, &window, &project))
                }
                Err(e) => {
                    tracing::debug!(file = %path.display(), error = %e, "skipping unreadable transcript");
                    None
                }
            }
        });
    }

    let mut out = WindowEvents {
        events: Vec::new(),
        stats: ScanStats {
            files_found: files.len(),
            ..ScanStats::default()
        },
    };

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some((events, stats))) => {
                out.stats.files_processed += 1;
                out.stats.merge(stats);
                out.events.extend(events);
            }
            Ok(None) => out.stats.files_skipped += 1,
            Err(e) => {
                tracing::warn!(error = %e, "transcript read task failed");
                out.stats.files_skipped += 1;
            }
        }
    }

    sort_chronologically(&mut out.events);
    tracing::debug!(
        files = out.stats.files_found,
        processed = out.stats.files_processed,
        skipped = out.stats.files_skipped,
        accepted = out.stats.records_accepted,
        "window scan complete"
    );
    out
}
