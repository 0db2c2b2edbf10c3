use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Parse an RFC 3339 / ISO-8601 timestamp. Returns `None` on any failure.
pub fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s.trim(), &Rfc3339).ok()
}

pub fn format_timestamp(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| t.unix_timestamp().to_string())
}

/// The interval `(previous, current]` between two commits.
///
/// `previous` is `None` for the first commit in history, which leaves the
/// lower bound open. When `previous >= current` (same-second commits,
/// amends, clock skew) the window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    #[serde(serialize_with = "ser_opt_ts")]
    previous: Option<OffsetDateTime>,
    #[serde(serialize_with = "ser_ts")]
    current: OffsetDateTime,
}

impl TimeWindow {
    pub fn new(previous: Option<OffsetDateTime>, current: OffsetDateTime) -> Self {
        let window = Self { previous, current };
        if window.is_empty() {
            tracing::debug!(
                previous = %previous.map(format_timestamp).unwrap_or_default(),
                current = %format_timestamp(current),
                "empty commit window"
            );
        }
        window
    }

    /// No instant satisfies `previous < t <= current`.
    pub fn is_empty(&self) -> bool {
        self.previous.is_some_and(|prev| prev >= self.current)
    }

    pub fn previous(&self) -> Option<OffsetDateTime> {
        self.previous
    }

    pub fn current(&self) -> OffsetDateTime {
        self.current
    }

    /// `previous < t <= current`.
    pub fn contains(&self, t: OffsetDateTime) -> bool {
        let above_lower = self.previous.map_or(true, |prev| t > prev);
        above_lower && t <= self.current
    }
}

fn ser_ts<S: serde::Serializer>(t: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(*t))
}

fn ser_opt_ts<S: serde::Serializer>(t: &Option<OffsetDateTime>, s: S) -> Result<S::Ok, S::Error> {
    match t {
        Some(t) => s.serialize_some(&format_timestamp(*t)),
        None => s.serialize_none(),
    }
}
