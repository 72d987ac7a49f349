//! Producer contracts and wiring.
//!
//! The engine never inspects an artifact itself. It sees producers only
//! through two narrow contracts:
//!
//! - [`EvidenceProducer`] — inspect the artifact, return evidence keyed by
//!   source; side-effect-free on run state.
//! - [`OpinionProducer`] — read the merged evidence and score one rubric
//!   dimension; the scheduler owns retry and fallback.
//!
//! Both sets are injected through [`ProducerSet`] at construction time —
//! there is no environment-driven provider selection.

pub mod error;
pub mod registry;

pub use error::{ProducerError, ProducerResult};
pub use registry::{DimensionProbe, ProbeRegistry};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ArtifactRef, Dimension, Evidence, JudgeRole, Opinion};

/// A pluggable artifact inspector.
///
/// Implementations must be idempotent and must not write run state —
/// they return data and the scheduler merges it.
#[async_trait]
pub trait EvidenceProducer: Send + Sync {
    /// Stable key under which this producer's evidence is filed. Each
    /// producer owns a distinct key; [`crate::state::AUDIT_SOURCE_KEY`]
    /// is reserved.
    fn source_key(&self) -> &str;

    /// Inspect the artifact against the rubric and return evidence by
    /// source key.
    async fn collect(
        &self,
        artifact: &ArtifactRef,
        rubric: &[Dimension],
    ) -> ProducerResult<BTreeMap<String, Vec<Evidence>>>;
}

/// A pluggable, role-tagged reviewer.
#[async_trait]
pub trait OpinionProducer: Send + Sync {
    /// The bench role this producer argues from.
    fn role(&self) -> JudgeRole;

    /// Score one dimension against the merged evidence snapshot.
    async fn review(
        &self,
        dimension: &Dimension,
        evidence: &BTreeMap<String, Vec<Evidence>>,
    ) -> ProducerResult<Opinion>;
}

/// The full producer configuration for a pipeline, passed in at
/// construction.
#[derive(Clone, Default)]
pub struct ProducerSet {
    pub evidence: Vec<Arc<dyn EvidenceProducer>>,
    pub opinions: Vec<Arc<dyn OpinionProducer>>,
}

impl ProducerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an evidence producer.
    pub fn with_evidence(mut self, producer: Arc<dyn EvidenceProducer>) -> Self {
        self.evidence.push(producer);
        self
    }

    /// Register an opinion producer.
    pub fn with_opinion(mut self, producer: Arc<dyn OpinionProducer>) -> Self {
        self.opinions.push(producer);
        self
    }

    /// Source keys of every registered evidence producer, in registration
    /// order. The aggregate stage audits coverage against this list.
    pub fn source_keys(&self) -> Vec<String> {
        self.evidence
            .iter()
            .map(|p| p.source_key().to_string())
            .collect()
    }
}

impl std::fmt::Debug for ProducerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerSet")
            .field("evidence", &self.source_keys())
            .field(
                "opinions",
                &self.opinions.iter().map(|p| p.role()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
