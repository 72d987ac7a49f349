//! Forensic evidence items.

use serde::{Deserialize, Serialize};

/// A single factual finding about the artifact, produced by an evidence
/// producer and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// What was being looked for.
    pub goal: String,

    /// Whether the artifact or pattern was found.
    pub found: bool,

    /// Extracted content, snippet, or excerpt.
    #[serde(default)]
    pub content: Option<String>,

    /// File path, document section, or other location descriptor.
    pub location: String,

    /// Brief explanation of the finding and its relevance.
    pub rationale: String,

    /// Confidence in the accuracy of this specific finding, in [0, 1].
    pub confidence: f64,

    /// Set when this finding contradicts a claim the artifact makes about
    /// itself (e.g. a document citing a file that does not exist).
    /// Arbitration's Rule of Evidence switches on this flag, never on the
    /// free-text rationale.
    #[serde(default)]
    pub contradicts_claim: bool,
}

impl Evidence {
    /// Create a finding. Confidence is clamped into [0, 1].
    pub fn new(
        goal: impl Into<String>,
        found: bool,
        location: impl Into<String>,
        rationale: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            goal: goal.into(),
            found,
            content: None,
            location: location.into(),
            rationale: rationale.into(),
            confidence: confidence.clamp(0.0, 1.0),
            contradicts_claim: false,
        }
    }

    /// Attach extracted content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Mark this finding as contradicting a claim made by the artifact.
    pub fn contradicting(mut self) -> Self {
        self.contradicts_claim = true;
        self
    }
}
