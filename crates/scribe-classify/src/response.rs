use serde_json::Value;

use crate::error::ClassifyError;

/// Return the first balanced `{...}` block in `raw`, skipping braces that
/// appear inside JSON string literals. A `{` that never closes is passed
/// over and the scan resumes at the next `{`.
pub fn extract_first_object(raw: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(offset) = raw[from..].find('{') {
        let begin = from + offset;
        if let Some(end) = balanced_end(&raw[begin..]) {
            return Some(&raw[begin..begin + end]);
        }
        from = begin + 1;
    }
    None
}

/// Byte length of the balanced block opening at `s[0] == '{'`.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (index, ch) in s.char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the reasoning service's reply into the raw identifiers it chose.
///
/// Requires a `sessionIds` list. Non-string entries are ignored; an empty
/// list is a valid answer.
pub fn parse_selection(raw: &str) -> Result<Vec<String>, ClassifyError> {
    let block = extract_first_object(raw).ok_or(ClassifyError::NoJsonObject)?;
    let value: Value = serde_json::from_str(block)?;
    let ids = value
        .get("sessionIds")
        .ok_or(ClassifyError::MissingSessionIds)?
        .as_array()
        .ok_or(ClassifyError::SessionIdsNotList)?;
    Ok(ids
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .collect())
}

/// Resolve returned identifiers against the known session ids.
///
/// Exact match wins; otherwise a known id starting with the returned one is
/// accepted. When a prefix fits several sessions, the earliest in `known`
/// order is taken. Unmatched and duplicate ids are dropped.
pub fn match_session_ids(returned: &[String], known: &[&str]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for id in returned {
        if id.is_empty() {
            continue;
        }
        let hit = if let Some(exact) = known.iter().find(|k| **k == id.as_str()) {
            Some(*exact)
        } else {
            let candidates: Vec<&str> = known
                .iter()
                .copied()
                .filter(|k| k.starts_with(id.as_str()))
                .collect();
            if candidates.len() > 1 {
                tracing::warn!(
                    prefix = %id,
                    candidates = candidates.len(),
                    chosen = candidates[0],
                    "ambiguous session id prefix"
                );
            }
            candidates.first().copied()
        };
        match hit {
            Some(k) if !matched.iter().any(|m| m == k) => matched.push(k.to_string()),
            Some(_) => {}
            None => tracing::debug!(id = %id, "dropping unknown session id"),
        }
    }
    matched
}
