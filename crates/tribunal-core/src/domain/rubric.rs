//! Rubric definitions: dimensions, discrete score levels, and level snapping.

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, TribunalError};

/// Which producer category a dimension applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetArtifact {
    /// Judged against the repository checkout.
    Repository,
    /// Judged against the companion document.
    Document,
}

/// One named, scorable level within a dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreLevel {
    /// Level name shown in reports (e.g. "missing", "adequate").
    pub name: String,

    /// Numeric score awarded at this level.
    pub score: i32,
}

/// One evaluation criterion with a discrete set of score levels.
///
/// Immutable once loaded; every arbitration decision for this dimension
/// snaps back onto the `levels` declared here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dimension {
    /// Stable identifier referenced by opinions and results.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Producer category this dimension is judged against.
    pub target: TargetArtifact,

    /// Declared score levels. Must be non-empty for a valid rubric.
    pub levels: Vec<ScoreLevel>,

    /// Free-text description of what a strong artifact looks like.
    #[serde(default)]
    pub success_pattern: Option<String>,

    /// Free-text description of known failure modes.
    #[serde(default)]
    pub failure_pattern: Option<String>,

    /// Architecture-critical dimensions weight the TechLead opinion during
    /// arbitration instead of relying on the plain mean.
    #[serde(default)]
    pub architecture_critical: bool,
}

impl Dimension {
    /// Highest declared level score, or 0 when no levels are declared.
    pub fn max_score(&self) -> i32 {
        self.levels.iter().map(|l| l.score).max().unwrap_or(0)
    }

    /// Lowest declared level score that is strictly positive — the "floor
    /// level" a confirmed security violation clamps to. Falls back to 0
    /// when every level is zero or none are declared.
    pub fn lowest_nonzero_score(&self) -> i32 {
        self.levels
            .iter()
            .map(|l| l.score)
            .filter(|s| *s > 0)
            .min()
            .unwrap_or(0)
    }

    /// Snap a continuous score onto the nearest declared level score.
    ///
    /// Ties break toward the **lower** level, so the snap never guesses
    /// upward. Scores already on a declared level snap to themselves.
    /// Returns 0 when no levels are declared (rejected by
    /// [`Rubric::validate`] before a run).
    pub fn snap_to_level(&self, raw: f64) -> i32 {
        let mut best: Option<i32> = None;
        let mut best_dist = f64::INFINITY;

        for level in &self.levels {
            let dist = (raw - f64::from(level.score)).abs();
            let closer = dist < best_dist;
            let tie_lower = dist == best_dist && best.is_some_and(|b| level.score < b);
            if closer || tie_lower {
                best = Some(level.score);
                best_dist = dist;
            }
        }

        best.unwrap_or(0)
    }
}

/// An ordered rubric: the full set of dimensions for one audit run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Rubric {
    pub dimensions: Vec<Dimension>,
}

impl Rubric {
    /// Look up a dimension by id.
    pub fn dimension(&self, id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }

    /// Reject rubrics the engine cannot score: empty dimension lists,
    /// duplicate ids, or dimensions without declared levels.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            return Err(TribunalError::InvalidRubric(
                "rubric declares no dimensions".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for dim in &self.dimensions {
            if !seen.insert(dim.id.as_str()) {
                return Err(TribunalError::InvalidRubric(format!(
                    "duplicate dimension id: {}",
                    dim.id
                )));
            }
            if dim.levels.is_empty() {
                return Err(TribunalError::InvalidRubric(format!(
                    "dimension {} declares no score levels",
                    dim.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimension(levels: &[(&str, i32)]) -> Dimension {
        Dimension {
            id: "state_rigor".to_string(),
            name: "State Management Rigor".to_string(),
            target: TargetArtifact::Repository,
            levels: levels
                .iter()
                .map(|(name, score)| ScoreLevel {
                    name: (*name).to_string(),
                    score: *score,
                })
                .collect(),
            success_pattern: None,
            failure_pattern: None,
            architecture_critical: false,
        }
    }

    fn ladder() -> Dimension {
        dimension(&[("missing", 0), ("weak", 3), ("solid", 7), ("exemplary", 10)])
    }

    #[test]
    fn test_snap_picks_nearest_level() {
        let dim = ladder();
        assert_eq!(dim.snap_to_level(6.0), 7);
        assert_eq!(dim.snap_to_level(1.4), 0);
        assert_eq!(dim.snap_to_level(8.9), 10);
    }

    #[test]
    fn test_snap_is_idempotent_on_declared_levels() {
        let dim = ladder();
        for level in &dim.levels {
            assert_eq!(dim.snap_to_level(f64::from(level.score)), level.score);
        }
    }

    #[test]
    fn test_snap_breaks_ties_toward_lower_level() {
        // 5.0 is equidistant between 3 and 7
        let dim = ladder();
        assert_eq!(dim.snap_to_level(5.0), 3);
    }

    #[test]
    fn test_snap_always_returns_declared_score() {
        let dim = ladder();
        let declared: Vec<i32> = dim.levels.iter().map(|l| l.score).collect();
        for raw in [-3.0, 0.0, 2.2, 4.999, 5.001, 7.5, 99.0] {
            assert!(declared.contains(&dim.snap_to_level(raw)));
        }
    }

    #[test]
    fn test_lowest_nonzero_score_skips_zero_level() {
        assert_eq!(ladder().lowest_nonzero_score(), 3);
        assert_eq!(dimension(&[("none", 0)]).lowest_nonzero_score(), 0);
    }

    #[test]
    fn test_max_score() {
        assert_eq!(ladder().max_score(), 10);
        assert_eq!(dimension(&[]).max_score(), 0);
    }

    #[test]
    fn test_validate_rejects_empty_rubric() {
        let rubric = Rubric { dimensions: vec![] };
        assert!(matches!(
            rubric.validate().unwrap_err(),
            TribunalError::InvalidRubric(_)
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let rubric = Rubric {
            dimensions: vec![ladder(), ladder()],
        };
        let err = rubric.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate dimension id"));
    }

    #[test]
    fn test_validate_rejects_dimension_without_levels() {
        let rubric = Rubric {
            dimensions: vec![dimension(&[])],
        };
        let err = rubric.validate().unwrap_err();
        assert!(err.to_string().contains("no score levels"));
    }

    #[test]
    fn test_rubric_deserializes_from_json() {
        let json = r#"{
            "dimensions": [{
                "id": "graph_orchestration",
                "name": "Graph Orchestration",
                "target": "repository",
                "levels": [
                    {"name": "missing", "score": 0},
                    {"name": "solid", "score": 7}
                ],
                "architecture_critical": true
            }]
        }"#;
        let rubric: Rubric = serde_json::from_str(json).unwrap();
        assert_eq!(rubric.dimensions.len(), 1);
        assert!(rubric.dimensions[0].architecture_critical);
        assert_eq!(rubric.dimensions[0].target, TargetArtifact::Repository);
        assert!(rubric.validate().is_ok());
    }
}
