//! Built-in opinion producers: one deterministic heuristic reviewer,
//! instantiated three times with different bench roles.
//!
//! Each role maps the found-evidence ratio onto the dimension's level
//! ladder and then leans on it from its own direction: the Prosecutor
//! reads one level down, the Defense one level up, the TechLead takes it
//! as computed. The Prosecutor is also the designated security opinion
//! and raises its typed finding from evidence flags, never from text.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use tribunal_core::{
    Dimension, Evidence, JudgeRole, Opinion, OpinionProducer, ProducerResult, SecurityFinding,
    TargetArtifact,
};

/// A deterministic, evidence-ratio-driven reviewer.
pub struct HeuristicJudge {
    role: JudgeRole,
}

impl HeuristicJudge {
    pub fn new(role: JudgeRole) -> Self {
        Self { role }
    }
}

/// The standard three-role bench.
pub fn bench() -> Vec<Arc<dyn OpinionProducer>> {
    vec![
        Arc::new(HeuristicJudge::new(JudgeRole::Prosecutor)),
        Arc::new(HeuristicJudge::new(JudgeRole::Defense)),
        Arc::new(HeuristicJudge::new(JudgeRole::TechLead)),
    ]
}

#[async_trait]
impl OpinionProducer for HeuristicJudge {
    fn role(&self) -> JudgeRole {
        self.role
    }

    async fn review(
        &self,
        dimension: &Dimension,
        evidence: &BTreeMap<String, Vec<Evidence>>,
    ) -> ProducerResult<Opinion> {
        let all: Vec<&Evidence> = evidence.values().flatten().collect();
        let relevant: Vec<&Evidence> = all
            .iter()
            .copied()
            .filter(|e| e.goal == dimension.id)
            .collect();
        // Fall back to the whole record when nothing targets this
        // dimension directly.
        let basis: &[&Evidence] = if relevant.is_empty() { &all } else { &relevant };

        let found = basis.iter().filter(|e| e.found).count();
        let ratio = if basis.is_empty() {
            0.0
        } else {
            found as f64 / basis.len() as f64
        };

        let mut ladder: Vec<i32> = dimension.levels.iter().map(|l| l.score).collect();
        ladder.sort_unstable();
        ladder.dedup();

        let top = ladder.len().saturating_sub(1);
        let base = (ratio * top as f64).round() as usize;
        let index = match self.role {
            JudgeRole::Prosecutor => base.saturating_sub(1),
            JudgeRole::Defense => (base + 1).min(top),
            JudgeRole::TechLead => base,
        };
        let mut score = ladder.get(index).copied().unwrap_or(0);

        let security = if self.role == JudgeRole::Prosecutor {
            security_finding(dimension, &relevant, &all)
        } else {
            SecurityFinding::None
        };
        if security == SecurityFinding::ConfirmedViolation {
            score = score.min(dimension.lowest_nonzero_score());
        }

        let argument = argument_for(self.role, dimension, found, basis.len(), score);
        let cited_evidence = basis.iter().take(5).map(|e| e.goal.clone()).collect();

        Ok(Opinion {
            judge: self.role,
            dimension_id: dimension.id.clone(),
            score,
            argument,
            cited_evidence,
            security,
        })
    }
}

/// Derive the Prosecutor's typed finding from evidence flags.
///
/// A contradiction inside this dimension's own evidence, or any
/// contradiction at all on a document dimension (a document caught
/// citing phantom files), confirms a violation. A contradiction
/// elsewhere in the record registers as a minor concern.
fn security_finding(
    dimension: &Dimension,
    relevant: &[&Evidence],
    all: &[&Evidence],
) -> SecurityFinding {
    let local = relevant.iter().any(|e| e.contradicts_claim);
    let global = all.iter().any(|e| e.contradicts_claim);

    if local || (global && dimension.target == TargetArtifact::Document) {
        SecurityFinding::ConfirmedViolation
    } else if global {
        SecurityFinding::MinorConcern
    } else {
        SecurityFinding::None
    }
}

fn argument_for(
    role: JudgeRole,
    dimension: &Dimension,
    found: usize,
    total: usize,
    score: i32,
) -> String {
    match role {
        JudgeRole::Prosecutor => format!(
            "Only {found} of {total} forensic markers for {} hold up; absence of the rest is treated as absence of the work. Score {score}.",
            dimension.name
        ),
        JudgeRole::Defense => format!(
            "{found} of {total} markers for {} were located, and the gaps read as incomplete collection rather than missing effort. Score {score}.",
            dimension.name
        ),
        JudgeRole::TechLead => format!(
            "{found} of {total} markers verified for {}; scored strictly on what the checkout shows. Score {score}.",
            dimension.name
        ),
    }
}
