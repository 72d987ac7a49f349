//! Deterministic arbitration engine.
//!
//! Reduces the bench's conflicting opinions on one dimension into a
//! single [`CriterionResult`] by applying a fixed rule sequence:
//!
//! 1. baseline = mean of the raw scores
//! 2. **Rule of Evidence** — a sympathetic score above the configured
//!    threshold is capped at the technical score when the evidence audit
//!    shows missing sources or a flagged contradiction
//! 3. **Rule of Functionality** — architecture-critical dimensions weight
//!    the TechLead score into the baseline
//! 4. **Rule of Security** — a confirmed violation from the Prosecutor
//!    clamps the result to the dimension's floor level; applied last so
//!    no other rule can lift a confirmed defect back up
//! 5. level snapping, ties toward the lower level
//! 6. dissent detection over the raw (pre-adjustment) scores
//!
//! Every branch switches on typed signals ([`SecurityFinding`],
//! [`Evidence::contradicts_claim`], the aggregate stage's coverage item)
//! — never on free text. The engine reads opinions; it never mutates them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CriterionResult, Dimension, Evidence, JudgeRole, Opinion, SecurityFinding};
use crate::pipeline::aggregate::SOURCE_COVERAGE_GOAL;
use crate::state::AUDIT_SOURCE_KEY;

/// Remediation text used when no TechLead opinion is available.
pub const DEFAULT_REMEDIATION: &str = "No technical remediation recorded for this criterion.";

/// Thresholds and weights for the arbitration rules.
///
/// Defaults assume the fixed 0-10 scoring scale documented in DESIGN.md.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitrationConfig {
    /// A Prosecutor score at or below this, combined with a confirmed
    /// violation, triggers the security clamp.
    pub security_low_score: i32,

    /// Weight given to the TechLead score on architecture-critical
    /// dimensions. Must be >= 0.5 to keep the TechLead decisive.
    pub tech_weight: f64,

    /// A Defense score strictly above this is subject to the Rule of
    /// Evidence.
    pub sympathy_high_score: i32,

    /// Cap applied by the Rule of Evidence when no TechLead opinion
    /// exists.
    pub evidence_cap_default: i32,

    /// Dissent is flagged when max - min of the raw scores strictly
    /// exceeds this.
    pub dissent_threshold: i32,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            security_low_score: 3,
            tech_weight: 0.5,
            sympathy_high_score: 7,
            evidence_cap_default: 6,
            dissent_threshold: 2,
        }
    }
}

/// Arbitrate one dimension.
///
/// Returns `None` when no opinion targets the dimension — the dimension
/// is skipped, not an error. A missing role merely skips the rules that
/// need it.
pub fn arbitrate(
    dimension: &Dimension,
    opinions: &[Opinion],
    evidence: &BTreeMap<String, Vec<Evidence>>,
    config: &ArbitrationConfig,
) -> Option<CriterionResult> {
    // The run-state opinion list order depends on task completion order,
    // so impose a canonical total order before any rule runs.
    let mut bench: Vec<Opinion> = opinions
        .iter()
        .filter(|o| o.dimension_id == dimension.id)
        .cloned()
        .collect();
    if bench.is_empty() {
        return None;
    }
    bench.sort_by(|a, b| {
        a.judge
            .rank()
            .cmp(&b.judge.rank())
            .then(a.score.cmp(&b.score))
            .then(a.argument.cmp(&b.argument))
    });

    let prosecutor = bench.iter().find(|o| o.judge == JudgeRole::Prosecutor);
    let defense = bench.iter().find(|o| o.judge == JudgeRole::Defense);
    let tech = bench.iter().find(|o| o.judge == JudgeRole::TechLead);

    let raw_scores: Vec<i32> = bench.iter().map(|o| o.score).collect();
    let raw_min = *raw_scores.iter().min().unwrap_or(&0);
    let raw_max = *raw_scores.iter().max().unwrap_or(&0);
    let variance = raw_max - raw_min;

    let mut adjusted = mean(&raw_scores);

    // Rule of Evidence: fact supremacy over sentiment.
    if let Some(defense) = defense {
        if defense.score > config.sympathy_high_score && evidence_disputes_claims(evidence) {
            let cap = tech.map_or(config.evidence_cap_default, |t| t.score);
            let capped: Vec<i32> = bench
                .iter()
                .map(|o| {
                    if o.judge == JudgeRole::Defense {
                        o.score.min(cap)
                    } else {
                        o.score
                    }
                })
                .collect();
            adjusted = mean(&capped);
            debug!(
                dimension = %dimension.id,
                cap,
                "rule of evidence capped the defense contribution"
            );
        }
    }

    // Rule of Functionality: architecture correctness is a factual
    // property, so the TechLead score dominates on flagged dimensions.
    if dimension.architecture_critical {
        if let Some(tech) = tech {
            adjusted = config.tech_weight * f64::from(tech.score)
                + (1.0 - config.tech_weight) * adjusted;
        }
    }

    // Rule of Security: a confirmed violation cannot be averaged away.
    // The clamp runs last so no preceding rule can lift it; it only ever
    // lowers the score.
    if let Some(prosecutor) = prosecutor {
        if prosecutor.security == SecurityFinding::ConfirmedViolation
            && prosecutor.score <= config.security_low_score
        {
            let ceiling = f64::from(dimension.lowest_nonzero_score());
            if adjusted > ceiling {
                debug!(dimension = %dimension.id, ceiling, "security clamp applied");
                adjusted = ceiling;
            }
        }
    }

    let final_score = dimension.snap_to_level(adjusted);
    let dissent = dissent_summary(&bench, variance, config.dissent_threshold);
    let remediation = tech.map_or_else(|| DEFAULT_REMEDIATION.to_string(), |t| t.argument.clone());

    Some(CriterionResult {
        dimension_id: dimension.id.clone(),
        dimension_name: dimension.name.clone(),
        final_score,
        opinions: bench,
        dissent,
        remediation,
    })
}

fn mean(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64
}

/// Whether the merged evidence undermines optimistic claims: the
/// aggregate stage reported missing producer sources, or any finding is
/// flagged as contradicting the artifact's own claims.
fn evidence_disputes_claims(evidence: &BTreeMap<String, Vec<Evidence>>) -> bool {
    let coverage_gap = evidence
        .get(AUDIT_SOURCE_KEY)
        .is_some_and(|items| items.iter().any(|e| e.goal == SOURCE_COVERAGE_GOAL && !e.found));

    let contradiction = evidence
        .values()
        .flatten()
        .any(|e| e.contradicts_claim);

    coverage_gap || contradiction
}

/// Build the dissent note when the raw scores disagree strictly beyond
/// the threshold. Quotes the extremal opinions; `bench` is already in
/// canonical order, so the picks are deterministic.
fn dissent_summary(bench: &[Opinion], variance: i32, threshold: i32) -> Option<String> {
    if variance <= threshold {
        return None;
    }

    let low = bench.iter().min_by_key(|o| o.score)?;
    let high = bench.iter().max_by_key(|o| o.score)?;

    Some(format!(
        "Bench split by {} points: {} scored {} (\"{}\") while {} scored {} (\"{}\").",
        variance,
        low.judge,
        low.score,
        excerpt(&low.argument),
        high.judge,
        high.score,
        excerpt(&high.argument),
    ))
}

/// First 160 characters of an argument, flattened to one line.
fn excerpt(argument: &str) -> String {
    let flat = argument.replace('\n', " ");
    let mut out: String = flat.chars().take(160).collect();
    if flat.chars().count() > 160 {
        out.push('…');
    }
    out
}
