use std::path::PathBuf;

use anyhow::Context;
use scribe_context::CorrelationEngine;
use scribe_core::{CommitContext, EngineConfig};

use crate::config;
use crate::WindowArgs;

pub struct Options {
    pub message: String,
    pub files: Vec<String>,
    pub summary: String,
    pub diff_file: Option<PathBuf>,
    pub no_ai: bool,
    pub pretty: bool,
}

pub async fn execute(
    config: EngineConfig,
    window: &WindowArgs,
    opts: Options,
) -> anyhow::Result<()> {
    let diff = match &opts.diff_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read diff {}", path.display()))?,
        None => String::new(),
    };
    let request = config::request(window)?.with_commit(CommitContext {
        message: opts.message,
        files: opts.files,
        change_summary: opts.summary,
        diff,
    });

    let engine = if opts.no_ai {
        CorrelationEngine::new(config, None)
    } else {
        CorrelationEngine::from_config(config)
    };
    let context = engine.correlate(&request).await?;

    let out = if opts.pretty {
        serde_json::to_string_pretty(&context)?
    } else {
        serde_json::to_string(&context)?
    };
    println!("{out}");
    Ok(())
}
