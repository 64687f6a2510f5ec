//! Command-line interface for redraft.
//!
//! Provides commands for expanding transcripts, researching topics,
//! and inspecting configuration.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::adapters::webpage::FetchSettings;
use crate::adapters::{HttpPageFetcher, OpenAiGenerator};
use crate::config;
use crate::core::{
    ChannelProgressSink, ExpansionEngine, ProgressEvent, ResearchEngine,
};
use crate::domain::{Document, FetchStatus, TaskState};

/// redraft - iterative refinement engine for AI-drafted narration
#[derive(Parser, Debug)]
#[command(name = "redraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand a transcript toward a target word count
    Expand {
        /// Transcript file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Maximum number of expansion passes
        #[arg(short, long, default_value = "3")]
        loops: u32,

        /// Target word count (runs the full loop budget if omitted)
        #[arg(short, long)]
        target_words: Option<usize>,

        /// Output file (default: expanded_<input name>, or stdout for stdin input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Research a topic from a set of source URLs
    Research {
        /// Research topic
        #[arg(short, long)]
        topic: String,

        /// Source URLs (space-separated)
        #[arg(short, long, num_args = 1.., required = true)]
        urls: Vec<String>,

        /// Maximum number of research passes
        #[arg(short, long, default_value = "5")]
        loops: u32,

        /// Output file (default: <topic>.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the API key is configured
    Check,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Expand {
                input,
                loops,
                target_words,
                output,
            } => expand_transcript(input, loops, target_words, output).await,
            Commands::Research {
                topic,
                urls,
                loops,
                output,
            } => research_topic(&topic, urls, loops, output).await,
            Commands::Check => check_api_key(),
            Commands::Config => show_config(),
        }
    }
}

/// Run the expansion engine over a transcript file or stdin
async fn expand_transcript(
    input: Option<PathBuf>,
    loops: u32,
    target_words: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let cfg = config::config()?;
    let content = read_input(input.as_deref())?;
    let document = Document::from_text(content.trim());

    println!("Original word count: {}", document.word_count());

    let generator = OpenAiGenerator::new(
        cfg.api_url.as_str(),
        cfg.model.as_str(),
        cfg.api_key()?,
        cfg.limits.generation_timeout(),
    )?;
    let engine = ExpansionEngine::new(generator, cfg.limits.clone());

    let (sink, printer) = progress_printer();
    let cancel = cancel_on_ctrl_c();

    let report = engine
        .expand(document, loops, target_words, &sink, &cancel)
        .await?;
    drop(sink);
    let _ = printer.await;

    println!("Outcome: {}", report.outcome);
    println!(
        "Final word count: {} after {} passes",
        report.document.word_count(),
        report.passes_completed
    );
    if report.is_partial() {
        println!("Note: result is partial; the accumulated document was kept");
    }

    write_output(
        output.or_else(|| input.as_deref().map(expanded_path)),
        &report.document.text(),
    )?;

    if report.task.state == TaskState::Failed {
        anyhow::bail!("expansion failed: {}", report.outcome);
    }
    Ok(())
}

/// Run the research engine over a topic and source URLs
async fn research_topic(
    topic: &str,
    urls: Vec<String>,
    loops: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    let cfg = config::config()?;

    let generator = OpenAiGenerator::new(
        cfg.api_url.as_str(),
        cfg.model.as_str(),
        cfg.api_key()?,
        cfg.limits.generation_timeout(),
    )?;
    let fetcher = HttpPageFetcher::new(FetchSettings {
        request_timeout: cfg.limits.fetch_timeout(),
    })?;
    let engine = ResearchEngine::new(generator, fetcher, cfg.limits.clone());

    let (sink, printer) = progress_printer();
    let cancel = cancel_on_ctrl_c();

    let report = engine
        .research(topic, &urls, loops, &sink, &cancel)
        .await?;
    drop(sink);
    let _ = printer.await;

    println!("Outcome: {}", report.outcome);
    for source in &report.sources {
        let status = match source.status {
            FetchStatus::Fetched => "fetched",
            FetchStatus::FetchFailed => "failed",
            FetchStatus::NotFetched => "not fetched",
        };
        match &source.error {
            Some(error) => println!("  {} - {} ({})", source.url, status, error),
            None => println!("  {} - {}", source.url, status),
        }
    }
    if report.is_partial() {
        println!("Note: result is partial; failed or unfetched sources can be retried");
    }

    write_output(
        Some(output.unwrap_or_else(|| topic_filename(topic))),
        &report.synthesis.text(),
    )?;

    if report.task.state == TaskState::Failed {
        anyhow::bail!("research failed: {}", report.outcome);
    }
    Ok(())
}

/// Verify the API key is present, showing a redacted form
fn check_api_key() -> Result<()> {
    let cfg = config::config()?;
    match cfg.api_key() {
        Ok(key) => {
            println!("[OK] {} is set: {}", cfg.api_key_env, config::redacted(&key));
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] {}", e);
            Err(e)
        }
    }
}

/// Print the resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;
    println!("api_url: {}", cfg.api_url);
    println!("model: {}", cfg.model);
    println!("api_key_env: {}", cfg.api_key_env);
    println!(
        "generation_timeout_seconds: {}",
        cfg.limits.generation_timeout_seconds
    );
    println!("fetch_timeout_seconds: {}", cfg.limits.fetch_timeout_seconds);
    println!("max_context_bytes: {}", cfg.limits.max_context_bytes);
    match &cfg.config_file {
        Some(path) => println!("config_file: {}", path.display()),
        None => println!("config_file: (none, defaults)"),
    }
    Ok(())
}

/// Read input from a file, or stdin when no path is given
fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Write the result to a file, or stdout when no path applies
fn write_output(output: Option<PathBuf>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            println!("Saved to: {}", path.display());
            Ok(())
        }
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// Default output path next to the input: expanded_<name>
fn expanded_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "transcript.txt".to_string());
    input.with_file_name(format!("expanded_{}", name))
}

/// Default research output file derived from the topic
fn topic_filename(topic: &str) -> PathBuf {
    let sanitized: String = topic
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    PathBuf::from(format!(
        "{}.txt",
        sanitized.trim().replace(char::is_whitespace, "_")
    ))
}

/// Channel-backed progress sink plus a task printing events as they arrive
fn progress_printer() -> (ChannelProgressSink, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
    let sink = ChannelProgressSink::new(tx);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("  [{:>3}%] {}", event.percent, event.message);
        }
    });
    (sink, printer)
}

/// Cancellation token tripped by ctrl-c, letting a run stop between passes
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancellation requested, stopping after the current pass...");
            trigger.cancel();
        }
    });
    cancel
}
