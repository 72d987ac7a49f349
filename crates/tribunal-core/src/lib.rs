//! Tribunal Core Library
//!
//! A concurrent artifact-audit engine: evidence producers fan out against
//! a repository and its companion document, their findings merge into
//! shared run state under a single-writer discipline, three role-tagged
//! opinion producers fan out over the rubric, and a deterministic
//! arbitration layer reconciles the conflicting opinions into one
//! auditable verdict.

pub mod arbitration;
pub mod domain;
pub mod pipeline;
pub mod producers;
pub mod reporting;
pub mod rollup;
pub mod state;
pub mod telemetry;

pub use domain::{
    ArtifactRef, AuditReport, CriterionResult, Dimension, Evidence, JudgeRole, Opinion, Result,
    Rubric, ScoreLevel, SecurityFinding, TargetArtifact, TribunalError,
};

pub use arbitration::{arbitrate, ArbitrationConfig, DEFAULT_REMEDIATION};
pub use pipeline::aggregate::{audit_evidence, QUALITY_AUDIT_GOAL, SOURCE_COVERAGE_GOAL};
pub use pipeline::{AuditPipeline, PipelineConfig, RunOutcome};
pub use producers::{
    DimensionProbe, EvidenceProducer, OpinionProducer, ProbeRegistry, ProducerError,
    ProducerResult, ProducerSet,
};
pub use reporting::{render_report_md, report_file_name, write_report_md};
pub use rollup::assemble_report;
pub use state::{RunState, StateStore, AUDIT_SOURCE_KEY};
pub use telemetry::init_tracing;

/// Tribunal version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
