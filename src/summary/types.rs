//! Core types for report summaries.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Severity of a report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Success => write!(f, "success"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "success" => Ok(Severity::Success),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// A named, severity-tagged bucket of findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Stable identifier, e.g. `python-unused-functions`.
    pub id: String,
    pub title: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ReportSection {
    pub fn new(id: &str, title: &str, severity: Severity, items: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            severity,
            description: None,
            items,
            hint: None,
        }
    }

    pub fn warning(id: &str, title: &str, items: Vec<String>) -> Self {
        Self::new(id, title, Severity::Warning, items)
    }

    pub fn info(id: &str, title: &str, items: Vec<String>) -> Self {
        Self::new(id, title, Severity::Info, items)
    }

    pub fn success(id: &str, title: &str, message: &str) -> Self {
        Self::new(id, title, Severity::Success, vec![message.to_string()])
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Sections for one file plus the derived issue count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub sections: Vec<ReportSection>,
    /// Number of warning-severity sections.
    pub issues_count: usize,
}

impl Summary {
    pub fn from_sections(sections: Vec<ReportSection>) -> Self {
        let issues_count = sections.iter().filter(|s| s.is_warning()).count();
        Self {
            sections,
            issues_count,
        }
    }

    pub fn section(&self, id: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.id == id)
    }
}

/// A summary stamped with its generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSummary {
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub issues_count: usize,
    pub sections: Vec<ReportSection>,
}

impl AnalyzeSummary {
    pub fn new(summary: Summary) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            issues_count: summary.issues_count,
            sections: summary.sections,
        }
    }
}

impl From<Summary> for AnalyzeSummary {
    fn from(summary: Summary) -> Self {
        Self::new(summary)
    }
}
