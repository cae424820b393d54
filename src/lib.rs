//! code-analyzer - heuristic multi-language code analysis.
//!
//! Turns source text into structured quality reports. Python, JavaScript,
//! HTML and CSS get dedicated rule sets; Ruby, PHP and Go get basic
//! statistics. Every pass is a regex-and-line-scanning heuristic rather
//! than a parser, so results are approximate by nature.
//!
//! # Architecture
//!
//! - `analysis`: language tags, per-language passes and the dispatcher
//! - `summary`: turns pass results into severity-tagged report sections
//! - `lint`: optional external lint findings for JavaScript
//! - `walker`: clones a repository and analyzes it on a bounded pool
//! - `config`: YAML configuration and environment overrides
//! - `report`: text, JSON and CSV output
//!
//! # Example
//!
//! ```
//! use code_analyzer::{analyze, summarize};
//!
//! let result = analyze("html", "<div><span></div>").unwrap();
//! let summary = summarize(&result);
//! assert_eq!(summary.issues_count, 1);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod lint;
pub mod report;
pub mod summary;
pub mod text;
pub mod walker;

pub use analysis::{analyze, analyze_language, AnalysisResult, AnalyzeError, Language};
pub use config::Config;
pub use lint::{CommandLinter, LintProblem, Linter};
pub use summary::{summarize, AnalyzeSummary, ReportSection, Severity, Summary};
pub use walker::{
    CancellationFlag, GitRepositoryAnalysis, ProgressEvent, RepositoryWalker, WalkError,
    WalkerLimits,
};
