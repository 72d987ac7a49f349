//! Markdown rendering for audit reports.
//!
//! The rendering collaborator: turns an [`AuditReport`] value into a
//! persisted document. The pipeline itself never calls into this module.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::AuditReport;

/// Render an audit report as a markdown document.
pub fn render_report_md(report: &AuditReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Audit Report: {}\n\n", report.repo_url));
    out.push_str(&format!("**Run:** {}  \n", report.run_id));
    out.push_str(&format!("**Generated:** {}  \n", report.generated_at.to_rfc3339()));
    out.push_str(&format!("**Overall Score:** {:.1}%\n\n", report.overall_score));

    out.push_str("## Executive Summary\n");
    out.push_str(&report.executive_summary);
    out.push_str("\n\n## Criterion Breakdown\n\n");

    for criterion in &report.criteria {
        out.push_str(&format!("### {}\n", criterion.dimension_name));
        out.push_str(&format!("**Final Score:** {}\n\n", criterion.final_score));

        if let Some(dissent) = &criterion.dissent {
            out.push_str(&format!("> **Dissent:** {dissent}\n\n"));
        }

        out.push_str("| Role | Score | Argument |\n");
        out.push_str("| :--- | ---: | :--- |\n");
        for opinion in &criterion.opinions {
            let argument = opinion.argument.replace('\n', " ").replace('|', "\\|");
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                opinion.judge, opinion.score, argument
            ));
        }
        out.push('\n');
    }

    out.push_str("## Remediation Plan\n");
    out.push_str(&report.remediation_plan);
    out.push('\n');

    out
}

/// File name for a report, derived from the repository locator.
pub fn report_file_name(repo_url: &str) -> String {
    let safe: String = repo_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("audit_{safe}.md")
}

/// Render and write a report into `dir`, creating the directory if
/// needed. Returns the written path.
pub fn write_report_md(dir: &Path, report: &AuditReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create report dir {dir:?}"))?;
    let path = dir.join(report_file_name(&report.repo_url));
    std::fs::write(&path, render_report_md(report)).with_context(|| format!("write {path:?}"))?;
    Ok(path)
}
