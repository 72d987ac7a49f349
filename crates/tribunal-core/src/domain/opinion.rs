//! Role-tagged opinions and their typed signals.

use serde::{Deserialize, Serialize};

/// The three bench roles. Arbitration addresses opinions by this tag:
/// the Prosecutor is the designated security opinion, the Defense the
/// sympathetic one, and the TechLead the technical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeRole {
    Prosecutor,
    Defense,
    TechLead,
}

impl JudgeRole {
    /// Canonical ordering used wherever opinion processing must be
    /// deterministic despite non-deterministic task completion order.
    pub fn rank(self) -> u8 {
        match self {
            JudgeRole::Prosecutor => 0,
            JudgeRole::Defense => 1,
            JudgeRole::TechLead => 2,
        }
    }
}

impl std::fmt::Display for JudgeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JudgeRole::Prosecutor => "prosecutor",
            JudgeRole::Defense => "defense",
            JudgeRole::TechLead => "tech_lead",
        };
        write!(f, "{s}")
    }
}

/// Typed security signal attached to an opinion.
///
/// Arbitration's Rule of Security switches on this field only — the
/// free-text argument is never pattern-matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityFinding {
    #[default]
    None,
    MinorConcern,
    ConfirmedViolation,
}

/// One scored judgment by one role on one rubric dimension.
/// Immutable after creation; arbitration only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opinion {
    /// Which bench role produced this opinion.
    pub judge: JudgeRole,

    /// Dimension this opinion scores.
    pub dimension_id: String,

    /// Integer score within the rubric's declared scale.
    pub score: i32,

    /// The role's argument for the score.
    pub argument: String,

    /// Evidence goals or locations the argument relies on.
    pub cited_evidence: Vec<String>,

    /// Typed security signal (see [`SecurityFinding`]).
    #[serde(default)]
    pub security: SecurityFinding,
}

impl Opinion {
    /// Zero-score opinion substituted when a producer exhausts its
    /// attempts; the failure reason becomes the argument so the verdict
    /// stays auditable.
    pub fn fallback(judge: JudgeRole, dimension_id: impl Into<String>, reason: &str) -> Self {
        Self {
            judge,
            dimension_id: dimension_id.into(),
            score: 0,
            argument: format!("opinion unavailable: {reason}"),
            cited_evidence: vec![],
            security: SecurityFinding::None,
        }
    }
}
