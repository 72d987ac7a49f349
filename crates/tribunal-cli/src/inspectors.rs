//! Built-in evidence producers: repository and companion-document
//! inspection. Deterministic and filesystem-only — no network, no model
//! calls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use tribunal_core::{
    ArtifactRef, Dimension, Evidence, EvidenceProducer, ProbeRegistry, ProducerError,
    ProducerResult, TargetArtifact,
};

/// Source key for the repository inspector.
pub const REPO_SOURCE_KEY: &str = "repo";

/// Source key for the document analyst.
pub const DOC_SOURCE_KEY: &str = "doc";

const MAX_FILES: usize = 512;
const MAX_FILE_BYTES: u64 = 256 * 1024;
const MAX_PATH_CLAIMS: usize = 50;

/// File extensions worth scanning for rubric keywords.
const TEXT_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "go", "java", "md", "toml", "yaml", "yml", "json", "txt",
];

// ---------------------------------------------------------------------------
// Repository inspector
// ---------------------------------------------------------------------------

/// Walks a local checkout and dispatches every repository dimension
/// through a [`ProbeRegistry`]: a layout probe where registered, keyword
/// scanning everywhere else.
pub struct RepoInspector {
    registry: ProbeRegistry,
}

impl RepoInspector {
    pub fn new() -> Self {
        Self {
            registry: default_registry(),
        }
    }
}

impl Default for RepoInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EvidenceProducer for RepoInspector {
    fn source_key(&self) -> &str {
        REPO_SOURCE_KEY
    }

    async fn collect(
        &self,
        artifact: &ArtifactRef,
        rubric: &[Dimension],
    ) -> ProducerResult<BTreeMap<String, Vec<Evidence>>> {
        let root = artifact.local_path.as_deref().ok_or_else(|| {
            ProducerError::ArtifactUnavailable(
                "no local checkout provided; materialize the repository first".to_string(),
            )
        })?;
        if !root.is_dir() {
            return Err(ProducerError::ArtifactUnavailable(format!(
                "checkout path {root:?} is not a directory"
            )));
        }

        let mut items = Vec::new();
        for dimension in rubric.iter().filter(|d| d.target == TargetArtifact::Repository) {
            debug!(dimension = %dimension.id, "inspecting checkout");
            items.extend(self.registry.resolve(&dimension.id).inspect(root, dimension));
        }

        Ok(BTreeMap::from([(REPO_SOURCE_KEY.to_string(), items)]))
    }
}

/// The default probe wiring: layout inspection for `project_layout`,
/// keyword scanning for everything else.
pub fn default_registry() -> ProbeRegistry {
    ProbeRegistry::new(Arc::new(keyword_probe)).register("project_layout", Arc::new(layout_probe))
}

/// Default probe: scan source files for keywords drawn from the
/// dimension's success pattern (or its name when no pattern exists).
fn keyword_probe(root: &Path, dimension: &Dimension) -> Vec<Evidence> {
    let text = dimension
        .success_pattern
        .as_deref()
        .unwrap_or(&dimension.name);
    let keywords = extract_keywords(text);
    if keywords.is_empty() {
        return vec![Evidence::new(
            &dimension.id,
            false,
            root.display().to_string(),
            "no scannable keywords in the rubric entry",
            0.3,
        )];
    }

    for file in walk_text_files(root) {
        let Ok(contents) = std::fs::read_to_string(&file) else {
            continue;
        };
        let lower = contents.to_lowercase();
        if let Some(hit) = keywords.iter().find(|k| lower.contains(k.as_str())) {
            let snippet = contents
                .lines()
                .find(|line| line.to_lowercase().contains(hit.as_str()))
                .unwrap_or_default()
                .trim()
                .to_string();
            let location = file
                .strip_prefix(root)
                .unwrap_or(&file)
                .display()
                .to_string();
            return vec![Evidence::new(
                &dimension.id,
                true,
                location,
                format!("keyword \"{hit}\" present"),
                0.6,
            )
            .with_content(snippet)];
        }
    }

    vec![Evidence::new(
        &dimension.id,
        false,
        root.display().to_string(),
        format!("none of {keywords:?} appear in the checkout"),
        0.5,
    )]
}

/// Specialized probe: structural markers a healthy project carries.
fn layout_probe(root: &Path, dimension: &Dimension) -> Vec<Evidence> {
    let manifest = ["Cargo.toml", "pyproject.toml", "package.json", "go.mod"]
        .iter()
        .find(|m| root.join(m).is_file());
    let readme = ["README.md", "README.rst", "README.txt", "README"]
        .iter()
        .find(|r| root.join(r).is_file());
    let tests = root.join("tests").is_dir() || root.join("test").is_dir();

    vec![
        Evidence::new(
            &dimension.id,
            manifest.is_some(),
            manifest.map_or_else(|| "checkout root".to_string(), |m| (*m).to_string()),
            "build manifest at the checkout root",
            0.9,
        ),
        Evidence::new(
            &dimension.id,
            readme.is_some(),
            readme.map_or_else(|| "checkout root".to_string(), |r| (*r).to_string()),
            "top-level readme",
            0.9,
        ),
        Evidence::new(
            &dimension.id,
            tests,
            "tests/",
            "dedicated test directory",
            0.8,
        ),
    ]
}

/// Keywords: lowercased words longer than four characters, first five.
fn extract_keywords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.len() > 4)
        .take(5)
        .collect()
}

/// Depth-first file walk, skipping VCS and build directories, capped at
/// [`MAX_FILES`] entries and [`MAX_FILE_BYTES`] per file.
fn walk_text_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            if files.len() >= MAX_FILES {
                return files;
            }
            let path = entry.path();
            if path.is_dir() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name != ".git" && name != "target" && name != "node_modules" {
                    stack.push(path);
                }
            } else if is_scannable(&path) {
                files.push(path);
            }
        }
    }

    files
}

fn is_scannable(path: &Path) -> bool {
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TEXT_EXTENSIONS.contains(&e));
    let small = std::fs::metadata(path).is_ok_and(|m| m.len() <= MAX_FILE_BYTES);
    ext_ok && small
}

// ---------------------------------------------------------------------------
// Document analyst
// ---------------------------------------------------------------------------

/// Reads the companion document, extracts file-path claims, and
/// cross-references them against the checkout. Claims that resolve to
/// nothing become evidence flagged as contradicting the document.
pub struct DocAnalyst;

#[async_trait]
impl EvidenceProducer for DocAnalyst {
    fn source_key(&self) -> &str {
        DOC_SOURCE_KEY
    }

    async fn collect(
        &self,
        artifact: &ArtifactRef,
        rubric: &[Dimension],
    ) -> ProducerResult<BTreeMap<String, Vec<Evidence>>> {
        let Some(doc_path) = artifact.doc_path.as_deref() else {
            return Ok(BTreeMap::from([(
                DOC_SOURCE_KEY.to_string(),
                vec![Evidence::new(
                    "companion_document",
                    false,
                    "n/a",
                    "no companion document provided",
                    1.0,
                )],
            )]));
        };

        let text = std::fs::read_to_string(doc_path)?;
        let mut items = Vec::new();

        // Cross-reference the document's path claims against the checkout.
        let claims = extract_path_claims(&text);
        match artifact.local_path.as_deref() {
            Some(root) if !claims.is_empty() => {
                let (verified, unverifiable): (Vec<&String>, Vec<&String>) =
                    claims.iter().partition(|c| root.join(c).exists());

                items.push(
                    Evidence::new(
                        "path_claims",
                        !verified.is_empty(),
                        doc_path.display().to_string(),
                        format!("cross-referenced {} path claims", claims.len()),
                        1.0,
                    )
                    .with_content(format!(
                        "verified: {verified:?}, unverifiable: {unverifiable:?}"
                    )),
                );

                if !unverifiable.is_empty() {
                    items.push(
                        Evidence::new(
                            "unverifiable_path_claims",
                            true,
                            doc_path.display().to_string(),
                            format!(
                                "{} cited path(s) do not exist in the checkout",
                                unverifiable.len()
                            ),
                            1.0,
                        )
                        .with_content(
                            unverifiable
                                .iter()
                                .map(|s| s.as_str())
                                .collect::<Vec<_>>()
                                .join(", "),
                        )
                        .contradicting(),
                    );
                }
            }
            _ => {
                items.push(Evidence::new(
                    "path_claims",
                    !claims.is_empty(),
                    doc_path.display().to_string(),
                    "path claims extracted but no checkout to cross-reference",
                    0.5,
                ));
            }
        }

        // Instruction-aware pass over document dimensions.
        let lower = text.to_lowercase();
        for dimension in rubric.iter().filter(|d| d.target == TargetArtifact::Document) {
            let pattern = dimension
                .success_pattern
                .as_deref()
                .unwrap_or(&dimension.name);
            let keywords = extract_keywords(pattern);
            let hit = keywords.iter().find(|k| lower.contains(k.as_str()));
            items.push(Evidence::new(
                &dimension.id,
                hit.is_some(),
                doc_path.display().to_string(),
                match hit {
                    Some(k) => format!("document discusses \"{k}\""),
                    None => format!("none of {keywords:?} appear in the document"),
                },
                0.6,
            ));
        }

        Ok(BTreeMap::from([(DOC_SOURCE_KEY.to_string(), items)]))
    }
}

/// Tokens that look like repository-relative file paths: contain a `/`,
/// end with a short extension, no URL scheme.
fn extract_path_claims(text: &str) -> Vec<String> {
    let mut claims = Vec::new();
    for token in text.split_whitespace() {
        let cleaned = token.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '/'));
        if cleaned.contains('/')
            && !cleaned.contains("://")
            && Path::new(cleaned)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| (1..=4).contains(&e.len()))
            && !claims.contains(&cleaned.to_string())
        {
            claims.push(cleaned.to_string());
            if claims.len() >= MAX_PATH_CLAIMS {
                break;
            }
        }
    }
    claims
}
