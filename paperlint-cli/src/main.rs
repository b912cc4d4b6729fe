use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paperlint_cli::{default_output_path, load_content};
use paperlint_core::processor::{RequestMetadata, RequestPayload};
use paperlint_core::{AgentSettings, AuditProcessor, AuditRequest, FileTaskStore, RuleStore};

#[derive(Parser)]
#[command(name = "paperlint")]
#[command(about = "Audit academic paper formatting: labels, formula numbering, heading hierarchy, citations")]
struct Args {
    /// Paper to audit: a PDF, or a UTF-8 text chunk
    #[arg(short, long)]
    input: String,

    /// Rule config file (YAML). Missing file falls back to built-in defaults
    #[arg(short, long, default_value = "rules.yaml")]
    config: String,

    /// Output file path; prints to stdout when omitted
    #[arg(short, long)]
    output: Option<String>,

    /// Write the output next to the input as <stem>_audit.json / <stem>_layout.json
    #[arg(long)]
    save: bool,

    /// Only run layout analysis and print the layout payload
    #[arg(long)]
    layout_only: bool,

    /// With --layout-only, print front-end highlights instead of the full payload
    #[arg(long)]
    frontend: bool,

    /// Request id; a random UUID when omitted
    #[arg(long)]
    request_id: Option<String>,

    #[arg(long, default_value = "00000000-0000-0000-0000-000000000000")]
    paper_id: String,

    #[arg(long, default_value = "")]
    paper_title: String,

    #[arg(long, default_value = "chunk_0")]
    chunk_id: String,

    /// Persist a task record per audit under this directory
    #[arg(long)]
    task_dir: Option<String>,

    /// Log per-step pipeline timings (visible with LOG_LEVEL=debug)
    #[arg(long)]
    profile: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = AgentSettings::from_env();
    init_tracing(&settings);

    let input = Path::new(&args.input);
    if !input.exists() {
        bail!("Input not found: {}", args.input);
    }

    let rules = Arc::new(RuleStore::load(&args.config)?);
    let mut processor = AuditProcessor::from_settings(rules, settings).with_profiling(args.profile);
    if let Some(dir) = &args.task_dir {
        processor = processor.with_store(Box::new(FileTaskStore::new(dir)?));
        info!(task_dir = dir.as_str(), "persisting task records");
    }

    let content = load_content(input)?;
    info!(input = args.input.as_str(), chars = content.len(), "auditing");

    let (json, suffix) = if args.layout_only {
        let payload = processor
            .analyze_layout_bounded(&content, processor.settings().layout_timeout)
            .await;
        let json = if args.frontend {
            serde_json::to_string_pretty(&payload.frontend())?
        } else {
            serde_json::to_string_pretty(&payload)?
        };
        (json, "layout")
    } else {
        let request = AuditRequest {
            request_id: args
                .request_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            metadata: RequestMetadata {
                paper_id: args.paper_id.clone(),
                paper_title: args.paper_title.clone(),
                chunk_id: args.chunk_id.clone(),
            },
            payload: RequestPayload { content },
        };
        let report = processor.audit(request).await?;
        info!(
            score = report.result.score,
            audit_level = %report.result.audit_level,
            issues = report.issues.len(),
            "audit complete"
        );
        (serde_json::to_string_pretty(&report)?, "audit")
    };

    let output_path = match (&args.output, args.save) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(default_output_path(input, suffix)),
        (None, false) => None,
    };
    match output_path {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("💾 Results saved to: {path}");
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// RUST_LOG wins; otherwise LOG_LEVEL; logs go to stderr so stdout stays JSON
fn init_tracing(settings: &AgentSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
