//! External lint enrichment for JavaScript results.
//!
//! The analyzer has no lint dependency of its own. A caller that wants lint
//! findings runs a [`Linter`] over the same source and attaches the problems
//! with [`JavaScriptAnalysis::with_lint_problems`] before summarizing.
//!
//! [`JavaScriptAnalysis::with_lint_problems`]: crate::analysis::JavaScriptAnalysis::with_lint_problems

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Severity value ESLint uses for errors.
pub const SEVERITY_ERROR: u8 = 2;
/// Severity value ESLint uses for warnings.
pub const SEVERITY_WARNING: u8 = 1;

/// One finding reported by an external lint tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintProblem {
    pub rule_id: Option<String>,
    /// 1 = warning, 2 = error.
    pub severity: u8,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl LintProblem {
    pub fn is_error(&self) -> bool {
        self.severity == SEVERITY_ERROR
    }

    pub fn is_warning(&self) -> bool {
        self.severity == SEVERITY_WARNING
    }
}

/// Errors from running an external lint tool.
#[derive(Error, Debug)]
pub enum LintError {
    #[error("lint command is empty")]
    EmptyCommand,
    #[error("failed to run lint command {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("lint command {program:?} exited with {status} without a report")]
    Failed { program: String, status: String },
    #[error("unparseable lint output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Something that can lint JavaScript source text.
pub trait Linter: Send + Sync {
    fn lint(&self, source: &str, file_name: &str) -> Result<Vec<LintProblem>, LintError>;
}

/// Runs an external command that reads source on stdin and prints an
/// ESLint-style JSON report on stdout.
///
/// The file name is appended as the last argument, so a command such as
/// `eslint --format json --stdin --stdin-filename` works unchanged.
#[derive(Debug, Clone)]
pub struct CommandLinter {
    command: Vec<String>,
}

impl CommandLinter {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Linter for CommandLinter {
    fn lint(&self, source: &str, file_name: &str) -> Result<Vec<LintProblem>, LintError> {
        let (program, args) = self.command.split_first().ok_or(LintError::EmptyCommand)?;
        debug!(program = %program, file = %file_name, "running lint command");

        let mut child = Command::new(program)
            .args(args)
            .arg(file_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LintError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Feed stdin from its own thread so a linter that writes before it
        // finishes reading cannot fill the stdout pipe and stall both sides
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_owned();
            thread::spawn(move || {
                // A linter that exits early closes the pipe; its report still counts
                if let Err(e) = stdin.write_all(input.as_bytes()) {
                    debug!(error = %e, "lint command closed stdin early");
                }
            })
        });

        let output = child.wait_with_output().map_err(|source| LintError::Spawn {
            program: program.clone(),
            source,
        })?;
        if let Some(writer) = writer {
            if writer.join().is_err() {
                debug!("lint stdin writer panicked");
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            if output.status.success() {
                return Ok(Vec::new());
            }
            return Err(LintError::Failed {
                program: program.clone(),
                status: output.status.to_string(),
            });
        }

        // ESLint exits non-zero whenever it reports problems
        let problems = parse_eslint_json(&stdout)?;
        debug!(count = problems.len(), "lint command finished");
        Ok(problems)
    }
}

#[derive(Deserialize)]
struct EslintFileReport {
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintMessage {
    #[serde(default)]
    rule_id: Option<String>,
    severity: u8,
    message: String,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    column: usize,
}

/// Parse ESLint's `--format json` output.
pub fn parse_eslint_json(output: &str) -> Result<Vec<LintProblem>, LintError> {
    let reports: Vec<EslintFileReport> = serde_json::from_str(output)?;
    Ok(reports
        .into_iter()
        .flat_map(|report| report.messages)
        .map(|m| LintProblem {
            rule_id: m.rule_id,
            severity: m.severity,
            message: m.message,
            line: m.line,
            column: m.column,
        })
        .collect())
}
