//! Core types for repository walks.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use globset::GlobSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::Language;
use crate::summary::AnalyzeSummary;

/// Errors that abort a repository walk.
///
/// Problems with single files never show up here; those files are counted
/// as skipped.
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("failed to clone {url}: {reason}")]
    CloneFailure { url: String, reason: String },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },
    #[error("invalid walker limits: {0}")]
    InvalidConfig(String),
}

/// Budgets and filters applied to one walk.
#[derive(Debug, Clone)]
pub struct WalkerLimits {
    /// Candidate files considered (in path order)
    pub max_files: usize,
    /// Files larger than this are skipped
    pub max_file_size: u64,
    /// Files that would push the bytes read past this are skipped
    pub max_total_size: u64,
    /// Files processed concurrently
    pub concurrency: usize,
    /// Relative paths matching this set are left out of the walk
    pub excluded: GlobSet,
}

impl Default for WalkerLimits {
    fn default() -> Self {
        Self {
            max_files: 400,
            max_file_size: 200 * 1024,
            max_total_size: 6 * 1024 * 1024,
            concurrency: 5,
            excluded: GlobSet::empty(),
        }
    }
}

/// Progress notifications emitted during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum ProgressEvent {
    #[serde(rename_all = "camelCase")]
    Start { total_candidates: usize },
    /// One per completed file, analyzed or skipped.
    File {
        path: String,
        analyzed: usize,
        total: usize,
    },
    Done { analyzed: usize, skipped: usize },
    Cancelled { analyzed: usize, skipped: usize },
}

/// Cooperative cancellation signal shared between a walk and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result for one analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitFileAnalysis {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub file_type: Language,
    pub summary: AnalyzeSummary,
    pub issues_count: usize,
}

/// Per-language counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTally {
    pub files: usize,
    pub issues: usize,
}

/// Aggregated result of a repository walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepositoryAnalysis {
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub files_analyzed: usize,
    pub skipped: usize,
    pub total_issues: usize,
    /// Every supported language, including ones with no files.
    pub by_language: BTreeMap<Language, LanguageTally>,
    /// Sorted by path.
    pub files: Vec<GitFileAnalysis>,
    pub generated_at: String,
    #[serde(default)]
    pub cancelled: bool,
}

impl GitRepositoryAnalysis {
    /// Build the aggregate from per-file results in any completion order.
    pub fn from_files(
        repo_url: &str,
        branch: Option<&str>,
        mut files: Vec<GitFileAnalysis>,
        skipped: usize,
        cancelled: bool,
    ) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut by_language: BTreeMap<Language, LanguageTally> = Language::ALL
            .into_iter()
            .map(|lang| (lang, LanguageTally::default()))
            .collect();
        for file in &files {
            let tally = by_language.entry(file.file_type).or_default();
            tally.files += 1;
            tally.issues += file.issues_count;
        }

        Self {
            repo_url: repo_url.to_string(),
            branch: branch.map(str::to_string),
            files_analyzed: files.len(),
            skipped,
            total_issues: files.iter().map(|f| f.issues_count).sum(),
            by_language,
            files,
            generated_at: chrono::Utc::now().to_rfc3339(),
            cancelled,
        }
    }
}
