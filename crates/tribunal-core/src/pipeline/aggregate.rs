//! The synchronous evidence-audit stage.
//!
//! Runs once, between the two fan-outs, over the fully merged evidence
//! map. It files its own findings under the reserved
//! [`AUDIT_SOURCE_KEY`](crate::state::AUDIT_SOURCE_KEY) so arbitration
//! can consult them like any other evidence.

use std::collections::BTreeMap;

use crate::domain::Evidence;

/// Goal of the coverage item: `found == true` iff every registered
/// producer source key is present in the merged map. Arbitration's Rule
/// of Evidence reads this item.
pub const SOURCE_COVERAGE_GOAL: &str = "source_coverage";

/// Goal of the quality item: mean confidence and found/total tallies.
pub const QUALITY_AUDIT_GOAL: &str = "quality_audit";

/// Mean confidence below which the quality item is marked not-found.
const QUALITY_CONFIDENCE_FLOOR: f64 = 0.6;

/// Audit the merged evidence: one coverage item over the expected source
/// keys, plus one quality item when any evidence exists at all.
pub fn audit_evidence(
    evidence: &BTreeMap<String, Vec<Evidence>>,
    expected_sources: &[String],
) -> Vec<Evidence> {
    let mut items = Vec::new();

    let (present, missing): (Vec<&String>, Vec<&String>) = expected_sources
        .iter()
        .partition(|key| evidence.contains_key(key.as_str()));

    items.push(
        Evidence::new(
            SOURCE_COVERAGE_GOAL,
            missing.is_empty(),
            "aggregate",
            format!("audited {} of {} producer branches", present.len(), expected_sources.len()),
            1.0,
        )
        .with_content(format!("present: {present:?}, missing: {missing:?}")),
    );

    let all: Vec<&Evidence> = evidence.values().flatten().collect();
    if !all.is_empty() {
        let mean_confidence =
            all.iter().map(|e| e.confidence).sum::<f64>() / all.len() as f64;
        let found = all.iter().filter(|e| e.found).count();

        items.push(
            Evidence::new(
                QUALITY_AUDIT_GOAL,
                mean_confidence > QUALITY_CONFIDENCE_FLOOR,
                "aggregate",
                format!("mean confidence {mean_confidence:.2}"),
                mean_confidence,
            )
            .with_content(format!("{found} of {} markers found", all.len())),
        );
    }

    items
}
