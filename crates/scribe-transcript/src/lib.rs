mod evidence;
mod group;
mod ingest;
mod record;
mod scan;

pub use evidence::{detect_commit_evidence, EvidenceSignal};
pub use group::{group_sessions, GroupStats, Grouping};
pub use ingest::{collect_window_events, filter_records, ScanStats, WindowEvents};
pub use record::{parse_record, RecordError};
pub use scan::discover_transcripts;
