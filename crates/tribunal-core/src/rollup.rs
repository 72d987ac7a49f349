//! Report assembly: fold per-dimension verdicts into one audit report.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{ArtifactRef, AuditReport, CriterionResult, Rubric};

/// Roll `results` up into an [`AuditReport`].
///
/// Raw points are the sum of final scores; possible points sum the
/// maximum declared level of each dimension that actually produced a
/// result, so a skipped dimension never counts against the artifact.
/// The overall percentage guards the zero-possible case.
pub fn assemble_report(
    run_id: Uuid,
    artifact: &ArtifactRef,
    rubric: &Rubric,
    results: Vec<CriterionResult>,
) -> AuditReport {
    let raw: i32 = results.iter().map(|r| r.final_score).sum();
    let possible: i32 = results
        .iter()
        .filter_map(|r| rubric.dimension(&r.dimension_id))
        .map(|d| d.max_score())
        .sum();

    let overall = if possible > 0 {
        f64::from(raw) / f64::from(possible) * 100.0
    } else {
        0.0
    };

    let executive_summary = format!(
        "Audit verdict for {}: {raw} of {possible} points ({overall:.1}%) across {} criteria.",
        artifact.repo_url,
        results.len()
    );

    let remediation_plan = results
        .iter()
        .map(|r| format!("### {}\n{}", r.dimension_name, r.remediation))
        .collect::<Vec<_>>()
        .join("\n\n");

    AuditReport {
        run_id,
        repo_url: artifact.repo_url.clone(),
        executive_summary,
        overall_score: overall,
        criteria: results,
        remediation_plan,
        generated_at: Utc::now(),
    }
}
