//! Section builders that turn analysis results into report summaries.
//!
//! Each language has a fixed list of sections in a fixed order. A section
//! appears only when it has findings. When a language produced no warning
//! sections a synthetic success section is appended, so `issues_count` of a
//! clean file is always zero.

mod generic;
mod javascript;
mod markup;
mod python;
mod types;

pub use types::{AnalyzeSummary, ReportSection, Severity, Summary};

use crate::analysis::AnalysisResult;

/// Build the report sections for an analysis result.
pub fn summarize(result: &AnalysisResult) -> Summary {
    let sections = match result {
        AnalysisResult::Python(r) => python::sections(r),
        AnalysisResult::JavaScript(r) => javascript::sections(r),
        AnalysisResult::Html(r) => markup::html_sections(r),
        AnalysisResult::Css(r) => markup::css_sections(r),
        AnalysisResult::Generic(r) => generic::sections(r),
    };
    Summary::from_sections(sections)
}

/// Format a finding with its line number.
pub(crate) fn at_line(line: usize, message: &str) -> String {
    format!("Line {}: {}", line, message)
}

/// Format a named finding with its line number.
pub(crate) fn named_at_line(name: &str, line: usize) -> String {
    format!("{} (line {})", name, line)
}

fn push_if_any(sections: &mut Vec<ReportSection>, section: ReportSection) {
    if !section.items.is_empty() {
        sections.push(section);
    }
}
