//! Repository walker.
//!
//! Clones a repository into a scoped temporary directory, picks the files
//! with a supported extension and analyzes them on a bounded pool. Budgets
//! on file count, file size and total bytes read keep a walk finite; files
//! that break a budget or fail to read are counted as skipped.
//!
//! # Flow
//!
//! ```text
//! fetch ──▶ enumerate ──▶ take max_files ──▶ pool (concurrency) ──▶ aggregate
//!                                              │
//!                                              └─▶ ProgressEvent::File per completed file
//! ```
//!
//! Cancellation is checked before each new file starts. Files already
//! in flight finish, and the temporary directory is removed on every exit
//! path when the `TempDir` guard drops.

mod fetch;
mod types;

pub use fetch::{GitFetcher, RepoFetcher};
pub use types::{
    CancellationFlag, GitFileAnalysis, GitRepositoryAnalysis, LanguageTally, ProgressEvent,
    WalkError, WalkerLimits,
};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analysis::{analyze_language, Language};
use crate::summary::{summarize, AnalyzeSummary};

/// A file eligible for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub language: Language,
}

/// Walks repositories with fixed limits.
pub struct RepositoryWalker {
    limits: WalkerLimits,
    fetcher: Arc<dyn RepoFetcher>,
}

impl RepositoryWalker {
    pub fn new(limits: WalkerLimits) -> Self {
        Self {
            limits,
            fetcher: Arc::new(GitFetcher),
        }
    }

    /// Replace the default `git` fetcher.
    pub fn fetcher(mut self, fetcher: Arc<dyn RepoFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn limits(&self) -> &WalkerLimits {
        &self.limits
    }

    /// Fetch and analyze a repository.
    ///
    /// Fails only when the limits are unusable, the temporary directory
    /// cannot be created, or the fetch fails.
    pub async fn walk(
        &self,
        url: &str,
        branch: Option<&str>,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
        cancel: &CancellationFlag,
    ) -> Result<GitRepositoryAnalysis, WalkError> {
        if self.limits.concurrency == 0 {
            return Err(WalkError::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.limits.max_files == 0 {
            return Err(WalkError::InvalidConfig("max_files must be at least 1".into()));
        }

        let temp = tempfile::Builder::new().prefix("code-analyzer-").tempdir()?;
        self.fetcher.fetch(url, branch, temp.path()).await?;

        let candidates = collect_candidates(temp.path(), &self.limits)?;
        on_progress(ProgressEvent::Start {
            total_candidates: candidates.len(),
        });

        let to_analyze: Vec<Candidate> = candidates.into_iter().take(self.limits.max_files).collect();
        let total = to_analyze.len();
        info!(url, total, "analyzing repository files");

        let root = temp.path().to_path_buf();
        let bytes_read = Arc::new(AtomicU64::new(0));
        let started = AtomicUsize::new(0);

        let mut results = stream::iter(to_analyze)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|candidate| {
                started.fetch_add(1, Ordering::SeqCst);
                let root = root.clone();
                let bytes_read = Arc::clone(&bytes_read);
                let limits = &self.limits;
                async move {
                    let outcome = process_file(&root, &candidate, limits, &bytes_read).await;
                    (candidate.path, outcome)
                }
            })
            .buffer_unordered(self.limits.concurrency);

        let mut files = Vec::new();
        let mut skipped = 0;
        let mut processed = 0;
        while let Some((path, outcome)) = results.next().await {
            processed += 1;
            match outcome {
                Some(file) => files.push(file),
                None => skipped += 1,
            }
            on_progress(ProgressEvent::File {
                path,
                analyzed: processed,
                total,
            });
        }
        drop(results);

        let cancelled = cancel.is_cancelled() && started.load(Ordering::SeqCst) < total;
        let analyzed = files.len();
        if cancelled {
            on_progress(ProgressEvent::Cancelled { analyzed, skipped });
        } else {
            on_progress(ProgressEvent::Done { analyzed, skipped });
        }
        info!(analyzed, skipped, cancelled, "repository walk finished");

        let analysis = GitRepositoryAnalysis::from_files(url, branch, files, skipped, cancelled);
        let temp_path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            warn!(path = %temp_path.display(), error = %e, "failed to remove temporary directory");
        }
        Ok(analysis)
    }
}

/// List files with a supported extension, sorted by relative path.
///
/// The `.git` directory and paths matching the exclusion set are skipped.
/// Unreadable entries below the root are ignored.
pub fn collect_candidates(root: &Path, limits: &WalkerLimits) -> Result<Vec<Candidate>, WalkError> {
    let mut candidates = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|e| {
        if e.depth() == 0 {
            return true;
        }
        if e.file_type().is_dir() && e.file_name() == ".git" {
            return false;
        }
        match e.path().strip_prefix(root) {
            Ok(rel) => !limits.excluded.is_match(rel),
            Err(_) => true,
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(WalkError::Walk {
                    path: root.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(language) = Language::from_path(entry.path()) else {
            continue;
        };
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        candidates.push(Candidate {
            path: relative_path(rel),
            language,
        });
    }

    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(candidates)
}

fn relative_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reserve `size` bytes of the total budget; false if it would overflow.
fn reserve_bytes(bytes_read: &AtomicU64, size: u64, max_total: u64) -> bool {
    bytes_read
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            current.checked_add(size).filter(|next| *next <= max_total)
        })
        .is_ok()
}

/// Analyze one file; `None` means it was skipped.
async fn process_file(
    root: &Path,
    candidate: &Candidate,
    limits: &WalkerLimits,
    bytes_read: &AtomicU64,
) -> Option<GitFileAnalysis> {
    let full: PathBuf = root.join(&candidate.path);

    let size = match tokio::fs::metadata(&full).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!(path = %candidate.path, error = %e, "skipping unreadable file");
            return None;
        }
    };
    if size > limits.max_file_size {
        debug!(path = %candidate.path, size, "skipping oversized file");
        return None;
    }
    if !reserve_bytes(bytes_read, size, limits.max_total_size) {
        debug!(path = %candidate.path, size, "total size budget exhausted");
        return None;
    }

    let bytes = match tokio::fs::read(&full).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %candidate.path, error = %e, "skipping unreadable file");
            return None;
        }
    };

    let language = candidate.language;
    let summary = tokio::task::spawn_blocking(move || {
        let source = String::from_utf8_lossy(&bytes);
        summarize(&analyze_language(language, &source))
    })
    .await;

    match summary {
        Ok(summary) => {
            let issues_count = summary.issues_count;
            Some(GitFileAnalysis {
                path: candidate.path.clone(),
                file_type: language,
                summary: AnalyzeSummary::new(summary),
                issues_count,
            })
        }
        Err(e) => {
            debug!(path = %candidate.path, error = %e, "analysis failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_candidates_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/b.py", "x = 1\n");
        write(root, "src/a.JS", "let a;\n");
        write(root, "README.md", "# hi\n");
        write(root, ".git/config.py", "ignored\n");
        write(root, "vendor/lib.go", "package lib\n");
        write(root, "web/index.html", "<p></p>\n");

        let mut limits = WalkerLimits::default();
        let mut builder = globset::GlobSetBuilder::new();
        builder.add(globset::Glob::new("vendor/**").unwrap());
        builder.add(globset::Glob::new("vendor").unwrap());
        limits.excluded = builder.build().unwrap();

        let candidates = collect_candidates(root, &limits).unwrap();
        let paths: Vec<_> = candidates.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.JS", "src/b.py", "web/index.html"]);
        assert_eq!(candidates[0].language, Language::Js);
    }

    #[test]
    fn test_reserve_bytes_never_overshoots() {
        let budget = AtomicU64::new(0);
        assert!(reserve_bytes(&budget, 60, 100));
        assert!(!reserve_bytes(&budget, 50, 100));
        assert!(reserve_bytes(&budget, 40, 100));
        assert_eq!(budget.load(Ordering::SeqCst), 100);
        assert!(!reserve_bytes(&budget, 1, 100));
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let rel = Path::new("a").join("b").join("c.py");
        assert_eq!(relative_path(&rel), "a/b/c.py");
    }
}
