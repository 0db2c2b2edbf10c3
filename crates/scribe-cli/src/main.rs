mod cmd_correlate;
mod cmd_redact;
mod cmd_sessions;
mod config;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scribe",
    version,
    about = "Find the coding-assistant conversation behind a git commit"
)]
struct Cli {
    /// Config file (JSON). Defaults to ./scribe.json when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

/// The commit window and project shared by `correlate` and `sessions`.
#[derive(Args)]
pub struct WindowArgs {
    /// Commit time of the commit being journaled (RFC 3339)
    #[arg(long)]
    pub current: String,
    /// Commit time of its parent; omit for the first commit
    #[arg(long)]
    pub previous: Option<String>,
    /// Project path as recorded in transcripts (default: current directory)
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Correlate a commit with its conversation and print it as JSON
    Correlate {
        #[command(flatten)]
        window: WindowArgs,
        /// Commit message
        #[arg(long, short, default_value = "")]
        message: String,
        /// Changed file (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
        /// Short change summary, e.g. `git diff --stat` output
        #[arg(long, default_value = "")]
        summary: String,
        /// File holding the commit diff, counted against the token budget
        #[arg(long)]
        diff_file: Option<PathBuf>,
        /// Skip AI disambiguation
        #[arg(long)]
        no_ai: bool,
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
    /// List the sessions active in a commit window
    Sessions {
        #[command(flatten)]
        window: WindowArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Redact secrets from stdin to stdout
    Redact,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("scribe v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.cmd {
        Command::Correlate {
            window,
            message,
            files,
            summary,
            diff_file,
            no_ai,
            pretty,
        } => {
            let config = config::load(cli.config.as_deref())?;
            let opts = cmd_correlate::Options {
                message,
                files,
                summary,
                diff_file,
                no_ai,
                pretty,
            };
            tokio::runtime::Runtime::new()?.block_on(cmd_correlate::execute(config, &window, opts))
        }
        Command::Sessions { window, json } => {
            let config = config::load(cli.config.as_deref())?;
            tokio::runtime::Runtime::new()?.block_on(cmd_sessions::execute(config, &window, json))
        }
        Command::Redact => cmd_redact::execute(),
    }
}
