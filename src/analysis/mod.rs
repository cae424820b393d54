//! Heuristic per-language source analysis.
//!
//! Every pass is a pure, line-indexed text scanner: it takes raw source text
//! and returns a language-specific record of findings. Nothing here builds
//! an AST or keeps state between calls, so passes are safe to run
//! concurrently on independent files.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌────────────────┐
//! │ tag + source │────▶│ analyze()    │────▶│ AnalysisResult │
//! └──────────────┘     │ (dispatcher) │     │ (per language) │
//!                      └──────────────┘     └────────────────┘
//!                                                   │
//!                                                   ▼
//!                                           ┌────────────────┐
//!                                           │ summary::      │
//!                                           │ summarize()    │
//!                                           └────────────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Add a variant to [`Language`] and its extension/tag mappings
//! 2. Create a pass in `src/analysis/languages/`
//! 3. Route it in [`analyze_language`] and add a section builder in `summary`

pub mod languages;
mod names;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use languages::{
    CssAnalysis, CssPropertyIssue, GenericAnalysis, HtmlAnalysis, JavaScriptAnalysis,
    PythonAnalysis,
};
pub(crate) use names::NameSet;

/// Errors raised by the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("unsupported language: {0:?} (expected one of py, js, html, css, rb, php, go)")]
    UnsupportedLanguage(String),
}

/// Supported language tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Py,
    Js,
    Html,
    Css,
    Rb,
    Php,
    Go,
}

impl Language {
    /// All supported languages, in tag order.
    pub const ALL: [Language; 7] = [
        Language::Py,
        Language::Js,
        Language::Html,
        Language::Css,
        Language::Rb,
        Language::Php,
        Language::Go,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Py => "py",
            Language::Js => "js",
            Language::Html => "html",
            Language::Css => "css",
            Language::Rb => "rb",
            Language::Php => "php",
            Language::Go => "go",
        }
    }

    /// Human-readable language name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Py => "Python",
            Language::Js => "JavaScript",
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Rb => "Ruby",
            Language::Php => "PHP",
            Language::Go => "Go",
        }
    }

    /// Determine the language from a file extension (with or without dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "py" => Some(Language::Py),
            "js" => Some(Language::Js),
            "html" => Some(Language::Html),
            "css" => Some(Language::Css),
            "rb" => Some(Language::Rb),
            "php" => Some(Language::Php),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    /// Determine the language from a path's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Languages handled by the generic fallback pass.
    pub fn is_generic(&self) -> bool {
        matches!(self, Language::Rb | Language::Php | Language::Go)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = AnalyzeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| AnalyzeError::UnsupportedLanguage(s.to_string()))
    }
}

/// Typed output of one analysis call.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Python(PythonAnalysis),
    JavaScript(JavaScriptAnalysis),
    Html(HtmlAnalysis),
    Css(CssAnalysis),
    Generic(GenericAnalysis),
}

impl AnalysisResult {
    /// The language this result was produced for.
    pub fn language(&self) -> Language {
        match self {
            AnalysisResult::Python(_) => Language::Py,
            AnalysisResult::JavaScript(_) => Language::Js,
            AnalysisResult::Html(_) => Language::Html,
            AnalysisResult::Css(_) => Language::Css,
            AnalysisResult::Generic(g) => g.language,
        }
    }
}

/// Analyze source text for a language tag.
///
/// Fails only when the tag is outside the supported set. Callers are
/// expected to validate tags up front; this is the last line of defense.
pub fn analyze(tag: &str, source: &str) -> Result<AnalysisResult, AnalyzeError> {
    let language: Language = tag.parse()?;
    Ok(analyze_language(language, source))
}

/// Analyze source text for an already-validated language.
pub fn analyze_language(language: Language, source: &str) -> AnalysisResult {
    match language {
        Language::Py => AnalysisResult::Python(languages::python::analyze(source)),
        Language::Js => AnalysisResult::JavaScript(languages::javascript::analyze(source)),
        Language::Html => AnalysisResult::Html(languages::html::analyze(source)),
        Language::Css => AnalysisResult::Css(languages::css::analyze(source)),
        Language::Rb | Language::Php | Language::Go => {
            AnalysisResult::Generic(languages::generic::analyze(source, language))
        }
    }
}
