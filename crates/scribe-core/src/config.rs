use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration. Loaded once, then handed to the engine.
///
/// Every field has a default so a partial `scribe.json` is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scan: ScanConfig,
    pub classifier: ClassifierConfig,
    pub budget: BudgetConfig,
    /// Log each candidate session (ids, counts, evidence) at debug level.
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            classifier: ClassifierConfig::default(),
            budget: BudgetConfig::default(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root holding one subdirectory per project, each with `*.jsonl` logs.
    pub projects_dir: PathBuf,
    /// Upper bound on files read concurrently.
    pub concurrency: usize,
    /// Number of trailing events inspected for a commit action.
    pub evidence_tail: usize,
    /// Case-insensitive keywords that mark a tool command as a commit action.
    pub commit_keywords: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            concurrency: 8,
            evidence_tail: 3,
            commit_keywords: vec!["commit".to_string()],
        }
    }
}

/// `~/.claude/projects`, or a relative fallback when no home dir exists.
pub fn default_projects_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".claude").join("projects"),
        None => PathBuf::from(".claude/projects"),
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub api_base: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    /// Trailing messages quoted per session in the prompt.
    pub excerpt_messages: usize,
    /// Character cap per quoted message.
    pub excerpt_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.1,
            max_output_tokens: 200,
            timeout_secs: 30,
            excerpt_messages: 3,
            excerpt_chars: 200,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("excerpt_messages", &self.excerpt_messages)
            .field("excerpt_chars", &self.excerpt_chars)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Ceiling on estimated tokens for events + diff.
    pub max_tokens: usize,
    pub chars_per_token: usize,
    /// Most recent events that are never dropped.
    pub min_recent_events: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: 120_000,
            chars_per_token: 4,
            min_recent_events: 5,
        }
    }
}

impl BudgetConfig {
    pub fn max_chars(&self) -> usize {
        self.max_tokens.saturating_mul(self.chars_per_token.max(1))
    }
}

impl EngineConfig {
    /// Load from a JSON file. A missing file yields defaults only when
    /// `required` is false.
    pub fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default())
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SCRIBE_*` / `OPENAI_API_KEY` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment, or a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SCRIBE_PROJECTS_DIR").filter(|v| !v.is_empty()) {
            self.scan.projects_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("SCRIBE_MODEL").filter(|v| !v.is_empty()) {
            self.classifier.model = model;
        }
        if let Some(base) = lookup("SCRIBE_API_BASE").filter(|v| !v.is_empty()) {
            self.classifier.api_base = base;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.classifier.api_key = Some(key);
        }
        if let Some(v) = lookup("SCRIBE_CLASSIFIER_TIMEOUT_SECS") {
            self.classifier.timeout_secs = parse_env("SCRIBE_CLASSIFIER_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("SCRIBE_MAX_TOKENS") {
            self.budget.max_tokens = parse_env("SCRIBE_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("SCRIBE_DEBUG") {
            self.debug = matches!(v.as_str(), "1" | "true" | "yes");
        }
        tracing::debug!(config = ?self, "engine config resolved");
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_behavior() {
        let c = EngineConfig::default();
        assert_eq!(c.classifier.timeout(), Duration::from_secs(30));
        assert_eq!(c.scan.evidence_tail, 3);
        assert_eq!(c.scan.commit_keywords, vec!["commit".to_string()]);
        assert_eq!(c.budget.max_chars(), 480_000);
        assert!(c.scan.projects_dir.ends_with(".claude/projects"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scribe.json");
        std::fs::write(&path, r#"{"classifier": {"model": "local-model"}, "debug": true}"#)
            .unwrap();
        let c = EngineConfig::from_file(&path, true).unwrap();
        assert_eq!(c.classifier.model, "local-model");
        assert_eq!(c.classifier.max_output_tokens, 200);
        assert!(c.debug);
    }

    #[test]
    fn missing_optional_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let c = EngineConfig::from_file(&tmp.path().join("nope.json"), false).unwrap();
        assert_eq!(c.budget.max_tokens, 120_000);
    }

    #[test]
    fn missing_required_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = EngineConfig::from_file(&tmp.path().join("nope.json"), true).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scribe.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            EngineConfig::from_file(&path, true),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("SCRIBE_PROJECTS_DIR", "/tmp/projects"),
            ("OPENAI_API_KEY", "k"),
            ("SCRIBE_CLASSIFIER_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();
        let mut c = EngineConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(c.scan.projects_dir, PathBuf::from("/tmp/projects"));
        assert_eq!(c.classifier.api_key.as_deref(), Some("k"));
        assert_eq!(c.classifier.timeout_secs, 5);
    }

    #[test]
    fn bad_numeric_override_is_error() {
        let mut c = EngineConfig::default();
        let err = c
            .apply_overrides(|k| (k == "SCRIBE_MAX_TOKENS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "SCRIBE_MAX_TOKENS", .. }));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let mut c = ClassifierConfig::default();
        c.api_key = Some("sk-secret-value".into());
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret-value"));
    }
}
