//! Pipeline configuration.

use std::time::Duration;

use crate::arbitration::ArbitrationConfig;

/// Configuration for one audit pipeline. Passed in at construction —
/// the engine reads no environment state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Minimum producer-sourced evidence items required after the
    /// aggregate stage; fewer aborts the run.
    pub min_evidence_items: usize,

    /// Total attempts per (opinion producer, dimension) pair before the
    /// scheduler substitutes a zero-score fallback opinion.
    pub opinion_attempts: u32,

    /// Per-task timeout for a single producer call. A timeout is treated
    /// like any other producer failure.
    pub producer_timeout: Duration,

    /// Maximum concurrent producer tasks within one fan-out stage.
    pub max_concurrent: usize,

    /// Thresholds and weights for the arbitration rules.
    pub arbitration: ArbitrationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_evidence_items: 1,
            opinion_attempts: 3,
            producer_timeout: Duration::from_secs(60),
            max_concurrent: 4,
            arbitration: ArbitrationConfig::default(),
        }
    }
}
