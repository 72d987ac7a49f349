//! Locator for the artifact under audit.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reference to the artifact being audited: a repository locator, an
/// optional companion document, and an optional pre-materialized checkout.
///
/// The engine never fetches anything itself — materializing `local_path`
/// is the caller's job. Producers that need a checkout and don't find one
/// report a failure instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactRef {
    /// Repository locator (URL or any stable identifier).
    pub repo_url: String,

    /// Companion document to cross-examine, if any.
    pub doc_path: Option<PathBuf>,

    /// Pre-materialized local checkout of the repository.
    pub local_path: Option<PathBuf>,
}

impl ArtifactRef {
    /// Create a reference with only a repository locator.
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            doc_path: None,
            local_path: None,
        }
    }

    /// Attach a companion document path.
    pub fn with_doc(mut self, path: impl Into<PathBuf>) -> Self {
        self.doc_path = Some(path.into());
        self
    }

    /// Attach a pre-materialized checkout path.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_attaches_paths() {
        let artifact = ArtifactRef::new("https://example.com/acme/widget")
            .with_doc("/tmp/report.md")
            .with_local_path("/tmp/widget");

        assert_eq!(artifact.repo_url, "https://example.com/acme/widget");
        assert_eq!(artifact.doc_path, Some(PathBuf::from("/tmp/report.md")));
        assert_eq!(artifact.local_path, Some(PathBuf::from("/tmp/widget")));
    }
}
