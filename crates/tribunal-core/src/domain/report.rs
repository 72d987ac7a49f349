//! Arbitration and rollup output models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::opinion::Opinion;

/// The reconciled verdict for one rubric dimension. Created exactly once
/// per dimension by the arbitration engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionResult {
    /// Dimension this verdict applies to.
    pub dimension_id: String,

    /// Display name carried over from the rubric.
    pub dimension_name: String,

    /// Final score after rule adjustment and level snapping.
    pub final_score: i32,

    /// Every contributing opinion, in canonical role order.
    pub opinions: Vec<Opinion>,

    /// Present when the raw opinions disagreed beyond the dissent
    /// threshold. Observational only — never changes `final_score`.
    #[serde(default)]
    pub dissent: Option<String>,

    /// Actionable instructions for reaching the next level.
    pub remediation: String,
}

/// The run-level audit rollup. Created once, after arbitration, and
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditReport {
    /// Identifier of the run that produced this report.
    pub run_id: Uuid,

    /// Repository locator the audit targeted.
    pub repo_url: String,

    /// Headline summary naming the artifact and the grade.
    pub executive_summary: String,

    /// Overall percentage score (raw points / possible points x 100).
    pub overall_score: f64,

    /// Per-dimension verdicts, in rubric order.
    pub criteria: Vec<CriterionResult>,

    /// Concatenated per-dimension remediation text.
    pub remediation_plan: String,

    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
}

impl AuditReport {
    /// Sum of final scores across all criteria.
    pub fn raw_points(&self) -> i32 {
        self.criteria.iter().map(|c| c.final_score).sum()
    }

    /// Number of criteria carrying a dissent note.
    pub fn dissent_count(&self) -> usize {
        self.criteria.iter().filter(|c| c.dissent.is_some()).count()
    }
}
