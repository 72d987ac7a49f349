//! Pipeline execution: fan-out, barriers, routing, arbitration.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::arbitration::arbitrate;
use crate::domain::{ArtifactRef, AuditReport, Dimension, Evidence, Opinion, Rubric};
use crate::pipeline::aggregate::audit_evidence;
use crate::pipeline::config::PipelineConfig;
use crate::producers::{EvidenceProducer, OpinionProducer, ProducerSet};
use crate::rollup::assemble_report;
use crate::state::{StateStore, AUDIT_SOURCE_KEY};

/// Terminal result of one audit run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Arbitration completed and produced a report.
    Completed(Box<AuditReport>),

    /// A routing condition fired: no report, only the accumulated
    /// errors. Producer tasks that were still running finished normally;
    /// their late results were simply never read.
    Aborted { errors: Vec<String> },
}

impl RunOutcome {
    /// The report, when the run completed.
    pub fn report(&self) -> Option<&AuditReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::Aborted { .. } => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted { .. })
    }
}

/// Executes the fixed audit topology against one artifact.
///
/// Producers and configuration are injected at construction; `run` holds
/// no state between invocations, so one pipeline can audit several
/// artifacts sequentially.
pub struct AuditPipeline {
    producers: ProducerSet,
    config: PipelineConfig,
}

impl AuditPipeline {
    pub fn new(producers: ProducerSet, config: PipelineConfig) -> Self {
        Self { producers, config }
    }

    /// Run the full pipeline: evidence fan-out, routing, aggregation,
    /// opinion fan-out, arbitration, rollup.
    #[instrument(skip_all, fields(repo = %artifact.repo_url))]
    pub async fn run(&self, artifact: ArtifactRef, rubric: &Rubric) -> RunOutcome {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, producers = self.producers.evidence.len(), "audit run starting");

        let store = Arc::new(StateStore::new(artifact.clone()));
        let dimensions = Arc::new(rubric.dimensions.clone());

        // Stage 1: evidence fan-out, barrier inside.
        self.fan_out_evidence(&store, &artifact, &dimensions).await;

        // Stage 2: route. Abort only when every producer failed outright.
        let snapshot = store.snapshot().await;
        if snapshot.evidence.is_empty() && !snapshot.errors.is_empty() {
            warn!(run_id = %run_id, "aborting: no evidence collected and producers reported errors");
            let mut errors = snapshot.errors;
            errors.push(
                "run aborted: every evidence producer failed and no evidence was collected"
                    .to_string(),
            );
            return RunOutcome::Aborted { errors };
        }

        // Stage 3: aggregate audit, then the minimum-evidence route.
        let audit_items = audit_evidence(&snapshot.evidence, &self.producers.source_keys());
        store
            .merge_evidence(BTreeMap::from([(AUDIT_SOURCE_KEY.to_string(), audit_items)]))
            .await;

        let snapshot = store.snapshot().await;
        let collected = snapshot.producer_evidence_count();
        if collected < self.config.min_evidence_items {
            warn!(run_id = %run_id, collected, "aborting: insufficient evidence");
            let mut errors = snapshot.errors;
            errors.push(format!(
                "run aborted: {collected} producer evidence item(s) collected, minimum is {}",
                self.config.min_evidence_items
            ));
            return RunOutcome::Aborted { errors };
        }

        // Stage 4 + 5: opinion fan-out over the frozen evidence snapshot,
        // barrier inside. Never aborts.
        let evidence = Arc::new(snapshot.evidence);
        self.fan_out_opinions(&store, &dimensions, &evidence).await;

        // Stage 6: arbitrate per dimension in rubric order, then roll up.
        let state = store.snapshot().await;
        let results: Vec<_> = rubric
            .dimensions
            .iter()
            .filter_map(|dim| {
                arbitrate(dim, &state.opinions, &state.evidence, &self.config.arbitration)
            })
            .collect();

        let report = assemble_report(run_id, &artifact, rubric, results);
        info!(
            run_id = %run_id,
            overall = report.overall_score,
            criteria = report.criteria.len(),
            "audit run completed"
        );
        store.set_report(report.clone()).await;

        RunOutcome::Completed(Box::new(report))
    }

    /// Launch every evidence producer concurrently and wait for all of
    /// them. A failing or timed-out producer becomes an error entry and
    /// never cancels its siblings.
    async fn fan_out_evidence(
        &self,
        store: &Arc<StateStore>,
        artifact: &ArtifactRef,
        dimensions: &Arc<Vec<Dimension>>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let timeout = self.config.producer_timeout;

        let mut tasks = Vec::new();
        for producer in &self.producers.evidence {
            let producer = Arc::clone(producer);
            let store = Arc::clone(store);
            let artifact = artifact.clone();
            let dimensions = Arc::clone(dimensions);
            let semaphore = Arc::clone(&semaphore);

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let key = producer.source_key().to_string();

                match tokio::time::timeout(timeout, producer.collect(&artifact, &dimensions)).await
                {
                    Ok(Ok(partial)) => {
                        store.merge_evidence(partial).await;
                    }
                    Ok(Err(e)) => {
                        warn!(source = %key, error = %e, "evidence producer failed");
                        store.append_errors(vec![format!("{key}: {e}")]).await;
                    }
                    Err(_) => {
                        warn!(source = %key, "evidence producer timed out");
                        store
                            .append_errors(vec![format!(
                                "{key}: timed out after {}s",
                                timeout.as_secs()
                            )])
                            .await;
                    }
                }
            }));
        }

        join_all(tasks).await;
    }

    /// Launch every opinion producer concurrently; each iterates all
    /// rubric dimensions with retry-then-fallback, so exactly
    /// `producers x dimensions` opinions reach the store.
    async fn fan_out_opinions(
        &self,
        store: &Arc<StateStore>,
        dimensions: &Arc<Vec<Dimension>>,
        evidence: &Arc<BTreeMap<String, Vec<Evidence>>>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let attempts = self.config.opinion_attempts;
        let timeout = self.config.producer_timeout;

        let mut tasks = Vec::new();
        for producer in &self.producers.opinions {
            let producer = Arc::clone(producer);
            let store = Arc::clone(store);
            let dimensions = Arc::clone(dimensions);
            let evidence = Arc::clone(evidence);
            let semaphore = Arc::clone(&semaphore);

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let role = producer.role();

                let mut batch = Vec::with_capacity(dimensions.len());
                let mut errors = Vec::new();

                for dimension in dimensions.iter() {
                    match review_with_attempts(&producer, dimension, &evidence, attempts, timeout)
                        .await
                    {
                        Ok(opinion) => batch.push(opinion),
                        Err(reason) => {
                            warn!(%role, dimension = %dimension.id, %reason, "opinion producer exhausted attempts");
                            errors.push(format!("{role}: {}: {reason}", dimension.id));
                            batch.push(Opinion::fallback(role, &dimension.id, &reason));
                        }
                    }
                }

                store.append_opinions(batch).await;
                if !errors.is_empty() {
                    store.append_errors(errors).await;
                }
            }));
        }

        join_all(tasks).await;
    }
}

/// Call `review` up to `attempts` times, treating a timeout like any
/// other failure. Returns the last failure reason when every attempt
/// fails.
async fn review_with_attempts(
    producer: &Arc<dyn OpinionProducer>,
    dimension: &Dimension,
    evidence: &BTreeMap<String, Vec<Evidence>>,
    attempts: u32,
    timeout: Duration,
) -> Result<Opinion, String> {
    let mut last = String::new();
    for _ in 0..attempts.max(1) {
        match tokio::time::timeout(timeout, producer.review(dimension, evidence)).await {
            Ok(Ok(opinion)) => return Ok(opinion),
            Ok(Err(e)) => last = e.to_string(),
            Err(_) => last = format!("timed out after {}s", timeout.as_secs()),
        }
    }
    Err(last)
}
