//! Output formatting for analysis results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: the structured result and summary for programmatic consumption
//! - CSV: one `;`-separated row per section item, for spreadsheets

use std::io::{self, Write};

use colored::*;
use serde::Serialize;

use crate::analysis::{AnalysisResult, Language};
use crate::summary::{AnalyzeSummary, ReportSection, Severity};
use crate::walker::GitRepositoryAnalysis;

/// CSV header row, in column order.
pub const CSV_HEADER: [&str; 4] = ["section_id", "title", "severity", "item"];

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("unknown format {:?}, must be pretty, json or csv", s)),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Everything known about one analyzed file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_type: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub result: AnalysisResult,
    pub summary: AnalyzeSummary,
}

/// Serialize any report value as pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write any report value as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    writeln!(out, "{}", to_json(value)?)?;
    Ok(())
}

// =============================================================================
// CSV Format
// =============================================================================

/// Write a summary as CSV: a header, then one row per section item.
pub fn write_csv<W: Write>(out: W, summary: &AnalyzeSummary) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for section in &summary.sections {
        let severity = section.severity.to_string();
        for item in &section.items {
            writer.write_record([
                section.id.as_str(),
                section.title.as_str(),
                severity.as_str(),
                item.as_str(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "code-analyzer".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)
}

/// Write one file's summary in human-readable form.
pub fn write_pretty_file<W: Write>(out: &mut W, report: &FileReport) -> io::Result<()> {
    write_header(out)?;
    if let Some(name) = &report.file_name {
        writeln!(out, "  {}{}", "File:     ".dimmed(), name)?;
    }
    writeln!(
        out,
        "  {}{}",
        "Language: ".dimmed(),
        report.file_type.display_name()
    )?;
    writeln!(out)?;

    write_issue_line(out, report.summary.issues_count)?;
    writeln!(out)?;

    for section in &report.summary.sections {
        write_section(out, section)?;
    }
    Ok(())
}

fn write_issue_line<W: Write>(out: &mut W, issues: usize) -> io::Result<()> {
    let plural = if issues != 1 { "s" } else { "" };
    if issues == 0 {
        writeln!(out, "  {}", "✓ No issues".green())
    } else {
        writeln!(
            out,
            "  {}",
            format!("✗ {} issue{}", issues, plural).red()
        )
    }
}

fn write_severity_tag<W: Write>(out: &mut W, severity: Severity) -> io::Result<()> {
    match severity {
        Severity::Warning => write!(out, "    {} ", "WARN".yellow()),
        Severity::Info => write!(out, "    {} ", "INFO".blue()),
        Severity::Success => write!(out, "    {} ", "OK  ".green()),
    }
}

fn write_section<W: Write>(out: &mut W, section: &ReportSection) -> io::Result<()> {
    write_severity_tag(out, section.severity)?;
    writeln!(out, "{}  {}", section.title.bold(), section.id.dimmed())?;
    if let Some(description) = &section.description {
        writeln!(out, "         {}", description.dimmed())?;
    }
    for item in &section.items {
        writeln!(out, "         - {}", item)?;
    }
    if let Some(hint) = &section.hint {
        writeln!(out, "         {}", format!("hint: {}", hint).dimmed())?;
    }
    writeln!(out)
}

/// Write a repository analysis in human-readable form.
pub fn write_pretty_repository<W: Write>(
    out: &mut W,
    analysis: &GitRepositoryAnalysis,
) -> io::Result<()> {
    write_header(out)?;
    writeln!(out, "  {}{}", "Repository: ".dimmed(), analysis.repo_url)?;
    if let Some(branch) = &analysis.branch {
        writeln!(out, "  {}{}", "Branch:     ".dimmed(), branch)?;
    }
    writeln!(out)?;

    write!(
        out,
        "  Files analyzed: {}  Skipped: {}  ",
        analysis.files_analyzed, analysis.skipped
    )?;
    if analysis.cancelled {
        write!(out, "{}  ", "(cancelled)".yellow())?;
    }
    writeln!(out)?;
    write_issue_line(out, analysis.total_issues)?;
    writeln!(out)?;

    let languages: Vec<_> = analysis
        .by_language
        .iter()
        .filter(|(_, tally)| tally.files > 0)
        .collect();
    if !languages.is_empty() {
        writeln!(out, "  {}", "By language:".bold())?;
        for (language, tally) in languages {
            writeln!(
                out,
                "    {:<12} {:>4} files  {:>4} issues",
                language.display_name(),
                tally.files,
                tally.issues
            )?;
        }
        writeln!(out)?;
    }

    let with_issues: Vec<_> = analysis.files.iter().filter(|f| f.issues_count > 0).collect();
    if !with_issues.is_empty() {
        writeln!(out, "  {} ({}):", "Files with issues".bold(), with_issues.len())?;
        writeln!(out)?;
        for file in with_issues {
            writeln!(
                out,
                "    {}  {}",
                file.path.blue(),
                format!("{} issue(s)", file.issues_count).dimmed()
            )?;
            for section in file.summary.sections.iter().filter(|s| s.is_warning()) {
                writeln!(out, "      {} ({})", section.title, section.items.len())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_language;
    use crate::summary::summarize;

    fn report(language: Language, source: &str) -> FileReport {
        let result = analyze_language(language, source);
        let summary = AnalyzeSummary::new(summarize(&result));
        FileReport {
            file_type: language,
            file_name: Some("input".to_string()),
            result,
            summary,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_csv_rows() {
        let summary = report(Language::Css, ".a{color:red}.a{color:blue}").summary;
        let mut buf = Vec::new();
        write_csv(&mut buf, &summary).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("section_id;title;severity;item"));
        assert_eq!(
            lines.next(),
            Some("css-duplicated-selectors;Duplicated selectors;warning;.a")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_quotes_separator() {
        let summary = report(Language::Js, "let a = 1 == 2; eval('x;y')\n").summary;
        let mut buf = Vec::new();
        write_csv(&mut buf, &summary).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(buf.as_slice());
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), 4);
        }
    }

    #[test]
    fn test_json_file_report() {
        let json = to_json(&report(Language::Html, "<div><span></div>")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["fileType"], "html");
        assert_eq!(value["fileName"], "input");
        assert_eq!(value["result"]["unclosedTags"][0]["tag"], "span");
        assert_eq!(value["summary"]["issuesCount"], 1);
    }

    #[test]
    fn test_pretty_file() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_pretty_file(&mut buf, &report(Language::Html, "<div><span></div>")).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Language: HTML"));
        assert!(text.contains("1 issue"));
        assert!(text.contains("WARN Unclosed tags  html-unclosed"));
        assert!(text.contains("- <span> at line 1"));
    }
}
