//! Shared run state and its merge discipline.
//!
//! [`RunState`] is the single mutable aggregate that flows through the
//! pipeline. Concurrent producers never touch it directly: every write
//! goes through [`StateStore`], whose mutex serializes merges so no two
//! tasks interleave appends to the same list.
//!
//! Merge semantics:
//! - evidence lists only grow by append within a source key, never shrink
//!   or reorder; merging is commutative and associative across keys
//! - the opinion and error lists only grow by append; batch-internal
//!   order is preserved

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{ArtifactRef, AuditReport, Evidence, Opinion};

/// Reserved source key under which the aggregate stage files its own
/// audit evidence. Producers must not use it.
pub const AUDIT_SOURCE_KEY: &str = "audit";

/// The mutable aggregate for one audit run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunState {
    /// Artifact under audit.
    pub artifact: ArtifactRef,

    /// Evidence by source key. `BTreeMap` keeps iteration deterministic
    /// regardless of the order concurrent merges landed in.
    pub evidence: BTreeMap<String, Vec<Evidence>>,

    /// All opinions across producers and dimensions.
    pub opinions: Vec<Opinion>,

    /// Accumulated non-fatal producer failures, tagged with the failing
    /// producer's identity.
    pub errors: Vec<String>,

    /// Set once arbitration completes.
    pub report: Option<AuditReport>,
}

impl RunState {
    pub fn new(artifact: ArtifactRef) -> Self {
        Self {
            artifact,
            evidence: BTreeMap::new(),
            opinions: Vec::new(),
            errors: Vec::new(),
            report: None,
        }
    }

    /// Total evidence items across all source keys.
    pub fn evidence_count(&self) -> usize {
        self.evidence.values().map(Vec::len).sum()
    }

    /// Evidence items contributed by producers — the reserved audit key
    /// is excluded so the aggregate stage's own items never satisfy the
    /// minimum-evidence routing check.
    pub fn producer_evidence_count(&self) -> usize {
        self.evidence
            .iter()
            .filter(|(key, _)| key.as_str() != AUDIT_SOURCE_KEY)
            .map(|(_, items)| items.len())
            .sum()
    }
}

/// Mutex-guarded accumulator for [`RunState`].
///
/// All pipeline writes funnel through these methods. Reads via
/// [`StateStore::snapshot`] happen only after a fan-out barrier, so a
/// reader never observes a partially merged stage.
pub struct StateStore {
    inner: Mutex<RunState>,
}

impl StateStore {
    pub fn new(artifact: ArtifactRef) -> Self {
        Self {
            inner: Mutex::new(RunState::new(artifact)),
        }
    }

    /// Merge a producer's partial evidence map: each key's list is
    /// appended to the existing list at that key, creating the key if
    /// absent. Commutative across source keys.
    pub async fn merge_evidence(&self, partial: BTreeMap<String, Vec<Evidence>>) {
        let mut state = self.inner.lock().await;
        for (key, items) in partial {
            state.evidence.entry(key).or_default().extend(items);
        }
    }

    /// Append a batch of opinions, preserving batch-internal order.
    pub async fn append_opinions(&self, batch: Vec<Opinion>) {
        self.inner.lock().await.opinions.extend(batch);
    }

    /// Append a batch of error descriptions.
    pub async fn append_errors(&self, batch: Vec<String>) {
        self.inner.lock().await.errors.extend(batch);
    }

    /// Clone the current state. Callers invoke this only after a barrier.
    pub async fn snapshot(&self) -> RunState {
        self.inner.lock().await.clone()
    }

    /// Record the final report.
    pub async fn set_report(&self, report: AuditReport) {
        self.inner.lock().await.report = Some(report);
    }

    /// Consume the store, returning the final state.
    pub fn into_state(self) -> RunState {
        self.inner.into_inner()
    }
}
