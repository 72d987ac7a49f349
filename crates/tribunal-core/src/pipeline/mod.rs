//! The audit pipeline: a fixed fan-out/fan-in topology with conditional
//! routing.
//!
//! # Module layout
//!
//! - [`config`] — `PipelineConfig`
//! - [`aggregate`] — the synchronous evidence audit stage
//! - [`runner`] — `AuditPipeline`, `RunOutcome`
//!
//! Stage order is fixed: evidence fan-out → barrier/route → aggregate →
//! opinion fan-out → barrier → arbitration. Only the routing decisions
//! vary: the run aborts when every evidence producer failed, or when
//! fewer producer evidence items than the configured minimum were
//! collected. Individual producer failures are recorded and never kill
//! sibling tasks.

pub mod aggregate;
pub mod config;
pub mod runner;

pub use config::PipelineConfig;
pub use runner::{AuditPipeline, RunOutcome};
