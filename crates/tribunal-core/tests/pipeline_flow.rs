//! End-to-end pipeline behavior: routing, fallback, determinism.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use tribunal_core::{
    ArtifactRef, AuditPipeline, Dimension, Evidence, JudgeRole, Opinion, OpinionProducer,
    PipelineConfig, ProducerError, ProducerResult, ProducerSet, Rubric, RunOutcome, ScoreLevel,
    SecurityFinding, TargetArtifact,
};

use std::sync::Arc;

fn dimension(id: &str) -> Dimension {
    Dimension {
        id: id.to_string(),
        name: id.to_string(),
        target: TargetArtifact::Repository,
        levels: vec![
            ScoreLevel { name: "missing".to_string(), score: 0 },
            ScoreLevel { name: "weak".to_string(), score: 3 },
            ScoreLevel { name: "solid".to_string(), score: 7 },
            ScoreLevel { name: "exemplary".to_string(), score: 10 },
        ],
        success_pattern: None,
        failure_pattern: None,
        architecture_critical: false,
    }
}

fn rubric(ids: &[&str]) -> Rubric {
    Rubric {
        dimensions: ids.iter().map(|id| dimension(id)).collect(),
    }
}

fn artifact() -> ArtifactRef {
    ArtifactRef::new("https://example.com/acme/widget")
}

fn quick_config() -> PipelineConfig {
    PipelineConfig {
        producer_timeout: Duration::from_millis(500),
        ..PipelineConfig::default()
    }
}

/// Evidence producer returning canned items after an optional delay.
struct StaticEvidence {
    key: &'static str,
    goals: Vec<&'static str>,
    delay: Duration,
}

impl StaticEvidence {
    fn new(key: &'static str, goals: &[&'static str]) -> Self {
        Self {
            key,
            goals: goals.to_vec(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl tribunal_core::EvidenceProducer for StaticEvidence {
    fn source_key(&self) -> &str {
        self.key
    }

    async fn collect(
        &self,
        _artifact: &ArtifactRef,
        _rubric: &[Dimension],
    ) -> ProducerResult<BTreeMap<String, Vec<Evidence>>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let items = self
            .goals
            .iter()
            .map(|goal| Evidence::new(*goal, true, "src/lib.rs", "marker present", 0.9))
            .collect();
        Ok(BTreeMap::from([(self.key.to_string(), items)]))
    }
}

/// Evidence producer that always fails.
struct BrokenEvidence {
    key: &'static str,
}

#[async_trait]
impl tribunal_core::EvidenceProducer for BrokenEvidence {
    fn source_key(&self) -> &str {
        self.key
    }

    async fn collect(
        &self,
        _artifact: &ArtifactRef,
        _rubric: &[Dimension],
    ) -> ProducerResult<BTreeMap<String, Vec<Evidence>>> {
        Err(ProducerError::ArtifactUnavailable(
            "checkout not materialized".to_string(),
        ))
    }
}

/// Evidence producer that outlives any reasonable timeout.
struct StalledEvidence;

#[async_trait]
impl tribunal_core::EvidenceProducer for StalledEvidence {
    fn source_key(&self) -> &str {
        "stalled"
    }

    async fn collect(
        &self,
        _artifact: &ArtifactRef,
        _rubric: &[Dimension],
    ) -> ProducerResult<BTreeMap<String, Vec<Evidence>>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(BTreeMap::new())
    }
}

/// Opinion producer awarding a fixed score to every dimension.
struct FixedJudge {
    role: JudgeRole,
    score: i32,
}

#[async_trait]
impl OpinionProducer for FixedJudge {
    fn role(&self) -> JudgeRole {
        self.role
    }

    async fn review(
        &self,
        dimension: &Dimension,
        _evidence: &BTreeMap<String, Vec<Evidence>>,
    ) -> ProducerResult<Opinion> {
        Ok(Opinion {
            judge: self.role,
            dimension_id: dimension.id.clone(),
            score: self.score,
            argument: format!("{} holds at {}", dimension.id, self.score),
            cited_evidence: vec![],
            security: SecurityFinding::None,
        })
    }
}

/// Opinion producer that never succeeds.
struct BrokenJudge {
    role: JudgeRole,
}

#[async_trait]
impl OpinionProducer for BrokenJudge {
    fn role(&self) -> JudgeRole {
        self.role
    }

    async fn review(
        &self,
        _dimension: &Dimension,
        _evidence: &BTreeMap<String, Vec<Evidence>>,
    ) -> ProducerResult<Opinion> {
        Err(ProducerError::Transient("backend unreachable".to_string()))
    }
}

/// Opinion producer failing a fixed number of calls before recovering.
struct FlakyJudge {
    role: JudgeRole,
    failures: AtomicU32,
}

#[async_trait]
impl OpinionProducer for FlakyJudge {
    fn role(&self) -> JudgeRole {
        self.role
    }

    async fn review(
        &self,
        dimension: &Dimension,
        _evidence: &BTreeMap<String, Vec<Evidence>>,
    ) -> ProducerResult<Opinion> {
        if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ProducerError::Transient("flaky".to_string()));
        }
        Ok(Opinion {
            judge: self.role,
            dimension_id: dimension.id.clone(),
            score: 7,
            argument: "recovered".to_string(),
            cited_evidence: vec![],
            security: SecurityFinding::None,
        })
    }
}

fn full_bench() -> Vec<Arc<dyn OpinionProducer>> {
    vec![
        Arc::new(FixedJudge { role: JudgeRole::Prosecutor, score: 4 }),
        Arc::new(FixedJudge { role: JudgeRole::Defense, score: 6 }),
        Arc::new(FixedJudge { role: JudgeRole::TechLead, score: 8 }),
    ]
}

#[tokio::test]
async fn test_end_to_end_scenario_snaps_and_rolls_up() {
    // 3 dimensions, 2 evidence producers (one fails), bench scoring
    // [4, 6, 8]: mean 6 snaps to 7 on the 0/3/7/10 ladder.
    let mut producers = ProducerSet::new()
        .with_evidence(Arc::new(StaticEvidence::new("repo", &["readme", "tests"])))
        .with_evidence(Arc::new(BrokenEvidence { key: "doc" }));
    for judge in full_bench() {
        producers = producers.with_opinion(judge);
    }

    let pipeline = AuditPipeline::new(producers, quick_config());
    let outcome = pipeline.run(artifact(), &rubric(&["a", "b", "c"])).await;

    let report = outcome.report().expect("run must complete");
    assert_eq!(report.criteria.len(), 3);
    for criterion in &report.criteria {
        assert_eq!(criterion.final_score, 7);
        assert_eq!(criterion.opinions.len(), 3);
    }
    // raw 21 of possible 30
    assert_eq!(report.raw_points(), 21);
    assert!((report.overall_score - 70.0).abs() < 1e-9);
    // criteria come back in rubric order
    let ids: Vec<&str> = report.criteria.iter().map(|c| c.dimension_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    // the failed detective is on the record
    assert!(report.executive_summary.contains("21 of 30"));
}

#[tokio::test]
async fn test_report_is_stable_under_producer_completion_order() {
    // Same producers, swapped delays: the verdict must not change.
    let run = |first_delay: u64, second_delay: u64| async move {
        let mut producers = ProducerSet::new()
            .with_evidence(Arc::new(
                StaticEvidence::new("repo", &["readme"])
                    .delayed(Duration::from_millis(first_delay)),
            ))
            .with_evidence(Arc::new(
                StaticEvidence::new("doc", &["paths"])
                    .delayed(Duration::from_millis(second_delay)),
            ));
        for judge in full_bench() {
            producers = producers.with_opinion(judge);
        }
        let pipeline = AuditPipeline::new(producers, quick_config());
        pipeline.run(artifact(), &rubric(&["a", "b"])).await
    };

    let fast_repo = run(0, 50).await;
    let slow_repo = run(50, 0).await;

    let a = fast_repo.report().unwrap();
    let b = slow_repo.report().unwrap();
    assert_eq!(a.criteria, b.criteria);
    assert_eq!(a.overall_score, b.overall_score);
}

#[tokio::test]
async fn test_all_evidence_producers_failing_aborts_the_run() {
    let producers = ProducerSet::new()
        .with_evidence(Arc::new(BrokenEvidence { key: "repo" }))
        .with_evidence(Arc::new(BrokenEvidence { key: "doc" }));

    let pipeline = AuditPipeline::new(producers, quick_config());
    let outcome = pipeline.run(artifact(), &rubric(&["a"])).await;

    match outcome {
        RunOutcome::Aborted { errors } => {
            assert!(errors.iter().any(|e| e.starts_with("repo:")));
            assert!(errors.iter().any(|e| e.starts_with("doc:")));
            assert!(errors.last().unwrap().contains("every evidence producer failed"));
        }
        RunOutcome::Completed(_) => panic!("expected abort"),
    }
}

#[tokio::test]
async fn test_partial_evidence_survives_a_sibling_failure() {
    // One detective fails; the other's findings still reach the verdict.
    let mut producers = ProducerSet::new()
        .with_evidence(Arc::new(StaticEvidence::new("repo", &["readme"])))
        .with_evidence(Arc::new(BrokenEvidence { key: "doc" }));
    for judge in full_bench() {
        producers = producers.with_opinion(judge);
    }

    let pipeline = AuditPipeline::new(producers, quick_config());
    let outcome = pipeline.run(artifact(), &rubric(&["a"])).await;
    assert!(outcome.report().is_some());
}

#[tokio::test]
async fn test_minimum_evidence_routing_at_exact_boundary() {
    // min 2, exactly 2 items collected: proceeds.
    let config = PipelineConfig {
        min_evidence_items: 2,
        ..quick_config()
    };
    let producers = ProducerSet::new()
        .with_evidence(Arc::new(StaticEvidence::new("repo", &["readme", "tests"])));
    let outcome = AuditPipeline::new(producers, config.clone())
        .run(artifact(), &rubric(&["a"]))
        .await;
    assert!(!outcome.is_aborted(), "count == minimum must proceed");

    // min 2, only 1 item: aborts, and the aggregate stage's own audit
    // items must not rescue the count.
    let producers = ProducerSet::new()
        .with_evidence(Arc::new(StaticEvidence::new("repo", &["readme"])));
    let outcome = AuditPipeline::new(producers, config)
        .run(artifact(), &rubric(&["a"]))
        .await;
    match outcome {
        RunOutcome::Aborted { errors } => {
            assert!(errors.last().unwrap().contains("minimum is 2"));
        }
        RunOutcome::Completed(_) => panic!("expected insufficient-evidence abort"),
    }
}

#[tokio::test]
async fn test_no_producers_at_all_aborts_after_aggregation() {
    // Empty evidence map with an empty error list passes the first route
    // and falls to the minimum-evidence check.
    let pipeline = AuditPipeline::new(ProducerSet::new(), quick_config());
    let outcome = pipeline.run(artifact(), &rubric(&["a"])).await;

    match outcome {
        RunOutcome::Aborted { errors } => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("minimum is 1"));
        }
        RunOutcome::Completed(_) => panic!("expected abort"),
    }
}

#[tokio::test]
async fn test_timed_out_producer_is_recorded_like_a_failure() {
    let config = PipelineConfig {
        producer_timeout: Duration::from_millis(50),
        ..PipelineConfig::default()
    };
    let producers = ProducerSet::new().with_evidence(Arc::new(StalledEvidence));

    let outcome = AuditPipeline::new(producers, config)
        .run(artifact(), &rubric(&["a"]))
        .await;

    match outcome {
        RunOutcome::Aborted { errors } => {
            assert!(errors.iter().any(|e| e.contains("stalled") && e.contains("timed out")));
        }
        RunOutcome::Completed(_) => panic!("expected abort"),
    }
}

#[tokio::test]
async fn test_failed_opinions_are_replaced_one_for_one() {
    // 3 producers x 3 dimensions with one producer permanently failing:
    // every criterion still carries exactly 3 opinions, the broken
    // producer's as zero-score fallbacks.
    let mut producers =
        ProducerSet::new().with_evidence(Arc::new(StaticEvidence::new("repo", &["readme"])));
    producers = producers
        .with_opinion(Arc::new(FixedJudge { role: JudgeRole::Prosecutor, score: 4 }))
        .with_opinion(Arc::new(BrokenJudge { role: JudgeRole::Defense }))
        .with_opinion(Arc::new(FixedJudge { role: JudgeRole::TechLead, score: 8 }));

    let pipeline = AuditPipeline::new(producers, quick_config());
    let outcome = pipeline.run(artifact(), &rubric(&["a", "b", "c"])).await;

    let report = outcome.report().expect("fallbacks never abort the run");
    assert_eq!(report.criteria.len(), 3);
    for criterion in &report.criteria {
        assert_eq!(criterion.opinions.len(), 3);
        let fallback = criterion
            .opinions
            .iter()
            .find(|o| o.judge == JudgeRole::Defense)
            .unwrap();
        assert_eq!(fallback.score, 0);
        assert!(fallback.argument.contains("opinion unavailable"));
    }
}

#[tokio::test]
async fn test_flaky_opinion_producer_recovers_within_attempts() {
    let producers = ProducerSet::new()
        .with_evidence(Arc::new(StaticEvidence::new("repo", &["readme"])))
        .with_opinion(Arc::new(FlakyJudge {
            role: JudgeRole::TechLead,
            failures: AtomicU32::new(2),
        }));

    // Default three attempts absorb two failures.
    let outcome = AuditPipeline::new(producers, quick_config())
        .run(artifact(), &rubric(&["a"]))
        .await;

    let report = outcome.report().unwrap();
    let opinion = &report.criteria[0].opinions[0];
    assert_eq!(opinion.score, 7);
    assert_eq!(opinion.argument, "recovered");
}

#[tokio::test]
async fn test_flaky_opinion_producer_exhausts_reduced_attempts() {
    let config = PipelineConfig {
        opinion_attempts: 2,
        ..quick_config()
    };
    let producers = ProducerSet::new()
        .with_evidence(Arc::new(StaticEvidence::new("repo", &["readme"])))
        .with_opinion(Arc::new(FlakyJudge {
            role: JudgeRole::TechLead,
            failures: AtomicU32::new(2),
        }));

    let outcome = AuditPipeline::new(producers, config)
        .run(artifact(), &rubric(&["a"]))
        .await;

    let report = outcome.report().unwrap();
    assert_eq!(report.criteria[0].opinions[0].score, 0);
}
