use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

/// What kind of secret a pattern masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Key,
    Jwt,
    Token,
    Email,
}

struct Pass {
    regex: Regex,
    replacement: &'static str,
    category: Category,
}

fn pass(pattern: &str, replacement: &'static str, category: Category) -> Pass {
    Pass {
        // Patterns are constants covered by tests.
        regex: Regex::new(pattern).unwrap(),
        replacement,
        category,
    }
}

/// Ordered passes. JWTs run first so the generic token patterns below
/// never see them; every placeholder is outside every pattern's alphabet,
/// which keeps redaction idempotent.
static PASSES: LazyLock<Vec<Pass>> = LazyLock::new(|| {
    vec![
        // JSON Web Tokens: three base64url segments, header starts with `eyJ`
        pass(
            r"\beyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}",
            "[REDACTED_JWT]",
            Category::Jwt,
        ),
        // Provider keys: OpenAI/Anthropic, GitHub, GitLab, Slack, AWS, Google
        pass(
            r"\b(?:sk-(?:ant-|proj-)?[A-Za-z0-9_-]{20,}|gh[posu]_[A-Za-z0-9]{36,}|github_pat_[A-Za-z0-9_]{22,}|glpat-[A-Za-z0-9_-]{20,}|xox[abprs]-[A-Za-z0-9-]{10,}|AKIA[A-Z0-9]{16}\b|AIza[A-Za-z0-9_-]{35})",
            "[REDACTED_KEY]",
            Category::Key,
        ),
        // Keys shortened for display: `sk-ant...x9Yz`
        pass(
            r"\b(?:sk|pk|rk)-[A-Za-z0-9_-]{2,}(?:\.\.\.|…)[A-Za-z0-9_-]{2,}",
            "[REDACTED_KEY]",
            Category::Key,
        ),
        // `api_key = ...`, `"password": "..."`, `SECRET_KEY=...`
        pass(
            r#"(?i)((?:api[_-]?key|secret[_-]?key|access[_-]?key|auth[_-]?token|access[_-]?token|token|secret|password|passwd)["']?\s*[:=]\s*["']?)[A-Za-z0-9_\-./+=]{12,}"#,
            "${1}[REDACTED_KEY]",
            Category::Key,
        ),
        // Authorization headers
        pass(
            r"(?i)\b(bearer\s+)[A-Za-z0-9._~+/=-]{16,}",
            "${1}[REDACTED_TOKEN]",
            Category::Token,
        ),
        pass(
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            "[REDACTED_EMAIL]",
            Category::Email,
        ),
    ]
});

/// Per-category match counts. Never holds the matched text.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RedactionStats {
    pub keys_redacted: usize,
    pub jwts_redacted: usize,
    pub tokens_redacted: usize,
    pub emails_redacted: usize,
}

impl RedactionStats {
    fn record(&mut self, category: Category, n: usize) {
        match category {
            Category::Key => self.keys_redacted += n,
            Category::Jwt => self.jwts_redacted += n,
            Category::Token => self.tokens_redacted += n,
            Category::Email => self.emails_redacted += n,
        }
    }

    #[cfg(test)]
    fn add(&mut self, other: &RedactionStats) {
        self.keys_redacted += other.keys_redacted;
        self.jwts_redacted += other.jwts_redacted;
        self.tokens_redacted += other.tokens_redacted;
        self.emails_redacted += other.emails_redacted;
    }

    pub fn total(&self) -> usize {
        self.keys_redacted + self.jwts_redacted + self.tokens_redacted + self.emails_redacted
    }
}

/// Redacted text plus what was masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub text: String,
    pub stats: RedactionStats,
}

/// Mask credential-shaped substrings and email addresses.
///
/// Applying this to its own output changes nothing.
pub fn redact(input: &str) -> Redaction {
    let mut text = input.to_string();
    let mut stats = RedactionStats::default();
    redact_in_place(&mut text, &mut stats);
    Redaction { text, stats }
}

/// Like [`redact`], accumulating counts into `stats`.
pub fn redact_in_place(text: &mut String, stats: &mut RedactionStats) {
    for p in PASSES.iter() {
        let mut hits = 0usize;
        let replaced = p.regex.replace_all(text, |caps: &Captures<'_>| {
            hits += 1;
            let mut out = String::new();
            caps.expand(p.replacement, &mut out);
            out
        });
        if hits > 0 {
            *text = replaced.into_owned();
            stats.record(p.category, hits);
        }
    }
}
