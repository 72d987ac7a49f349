//! Tribunal - concurrent artifact auditor
//!
//! Loads a rubric, fans the built-in detectives and bench out over the
//! artifact, and writes the arbitrated verdict as a markdown report.

mod inspectors;
mod judges;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};

use tribunal_core::{
    init_tracing, write_report_md, ArtifactRef, AuditPipeline, PipelineConfig, ProducerSet,
    Rubric, RunOutcome,
};

use inspectors::{DocAnalyst, RepoInspector};

#[derive(Parser)]
#[command(name = "tribunal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audits a repository against a rubric with a concurrent detective/bench pipeline", long_about = None)]
struct Cli {
    /// Repository locator for the artifact under audit
    repo_url: String,

    /// Rubric definition (JSON)
    #[arg(short, long, env = "TRIBUNAL_RUBRIC")]
    rubric: PathBuf,

    /// Pre-materialized local checkout of the repository
    #[arg(short, long)]
    local: Option<PathBuf>,

    /// Companion document to cross-examine
    #[arg(short, long)]
    doc: Option<PathBuf>,

    /// Directory the rendered report is written into
    #[arg(short, long, default_value = "audit-reports")]
    out: PathBuf,

    /// Minimum evidence items required to proceed to review
    #[arg(long, default_value_t = 1)]
    min_evidence: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let raw = std::fs::read_to_string(&cli.rubric)
        .with_context(|| format!("read rubric {:?}", cli.rubric))?;
    let rubric: Rubric = serde_json::from_str(&raw).context("parse rubric JSON")?;
    rubric.validate().context("validate rubric")?;
    info!(dimensions = rubric.dimensions.len(), "rubric loaded");

    let mut artifact = ArtifactRef::new(&cli.repo_url);
    if let Some(local) = &cli.local {
        artifact = artifact.with_local_path(local);
    }
    if let Some(doc) = &cli.doc {
        artifact = artifact.with_doc(doc);
    }

    let mut producers = ProducerSet::new()
        .with_evidence(Arc::new(RepoInspector::new()))
        .with_evidence(Arc::new(DocAnalyst));
    for judge in judges::bench() {
        producers = producers.with_opinion(judge);
    }

    let config = PipelineConfig {
        min_evidence_items: cli.min_evidence,
        ..PipelineConfig::default()
    };

    let pipeline = AuditPipeline::new(producers, config);
    match pipeline.run(artifact, &rubric).await {
        RunOutcome::Completed(report) => {
            println!("{}\n", report.executive_summary);
            for criterion in &report.criteria {
                let dissent = if criterion.dissent.is_some() {
                    "  [dissent]"
                } else {
                    ""
                };
                println!(
                    "  {:<40} {:>3}{dissent}",
                    criterion.dimension_name, criterion.final_score
                );
            }

            let path = write_report_md(&cli.out, &report)?;
            println!("\nReport written to {}", path.display());
            Ok(())
        }
        RunOutcome::Aborted { errors } => {
            eprintln!("Audit aborted:");
            for error in &errors {
                eprintln!("  - {error}");
            }
            bail!("audit aborted with {} error(s)", errors.len());
        }
    }
}
