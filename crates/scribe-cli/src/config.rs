use std::path::Path;

use anyhow::Context;
use scribe_context::CorrelationRequest;
use scribe_core::{parse_timestamp, EngineConfig};

use crate::WindowArgs;

const DEFAULT_CONFIG_FILE: &str = "scribe.json";

/// Load the engine config once: file, then environment overrides.
pub fn load(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(p) => EngineConfig::from_file(p, true)?,
        None => EngineConfig::from_file(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    config.apply_env()?;
    Ok(config)
}

/// Turn CLI window arguments into an engine request.
pub fn request(window: &WindowArgs) -> anyhow::Result<CorrelationRequest> {
    let current = parse_timestamp(&window.current)
        .with_context(|| format!("invalid --current timestamp {:?}", window.current))?;
    let project = match &window.project {
        Some(p) => p.clone(),
        None => std::env::current_dir()?.to_string_lossy().into_owned(),
    };
    let mut request = CorrelationRequest::new(project, current);
    if let Some(prev) = &window.previous {
        let previous =
            parse_timestamp(prev).with_context(|| format!("invalid --previous timestamp {prev:?}"))?;
        request = request.since(previous);
    }
    Ok(request)
}
