//! JavaScript analysis pass.
//!
//! Purely textual: each line is masked (string contents and `//` comments
//! blanked) and matched against a fixed set of patterns. Malformed input is
//! accepted as-is; unbalanced braces only show up as a syntax finding.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lint::LintProblem;
use crate::text::{normalize_line_endings, split_lines, CommentStyle, LineMasker};

/// Lines longer than this are reported.
const MAX_LINE_LENGTH: usize = 120;

lazy_static! {
    static ref FUNCTION_DECL_RE: Regex =
        Regex::new(r"\bfunction\b\s*\*?\s*([A-Za-z_]\w*)\s*\(").unwrap();
    static ref ARROW_DECL_RE: Regex = Regex::new(
        r"\b(?:const|let|var)\s+([A-Za-z_]\w*)\s*=\s*(?:async\s*)?(?:\([^)]*\)|[A-Za-z_]\w*)\s*=>"
    )
    .unwrap();
    static ref ANONYMOUS_DECL_RE: Regex = Regex::new(
        r"\b(?:const|let|var)\s+([A-Za-z_]\w*)\s*=\s*(?:async\s+)?function\b\s*\*?\s*\("
    )
    .unwrap();
    static ref VARIABLE_DECL_RE: Regex = Regex::new(r"\b(?:let|const|var)\s+([A-Za-z_]\w*)").unwrap();

    static ref VAR_RE: Regex = Regex::new(r"\bvar\b").unwrap();
    static ref LET_RE: Regex = Regex::new(r"\blet\b").unwrap();
    static ref CONST_RE: Regex = Regex::new(r"\bconst\b").unwrap();
    static ref EVAL_RE: Regex = Regex::new(r"\beval\s*\(").unwrap();
    static ref DOCUMENT_WRITE_RE: Regex = Regex::new(r"\bdocument\.write\s*\(").unwrap();
    static ref CONSOLE_LOG_RE: Regex = Regex::new(r"\bconsole\.log\s*\(").unwrap();
    static ref TODO_RE: Regex = Regex::new(r"(?i)//.*\b(?:TODO|FIXME)\b").unwrap();

    static ref NUMBER_RE: Regex = Regex::new(r"(?:^|[^\w.$])(-?\d+(?:\.\d+)?)").unwrap();
    static ref CALL_RE: Regex = Regex::new(r"\b([A-Za-z_]\w*)\s*\(").unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"\b[A-Za-z_]\w*\b").unwrap();
    static ref OPERATOR_RE: Regex = Regex::new(r"[=!<>]+").unwrap();
    static ref SEMICOLON_TAIL_RE: Regex = Regex::new(r#"[\w)\]'"`]$"#).unwrap();
}

/// A named declaration and the line it was (last) declared on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedLocation {
    pub name: String,
    pub line: usize,
}

/// A numeric literal other than `0`/`1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub value: String,
    pub line: usize,
}

/// A `// TODO` or `// FIXME` comment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoComment {
    pub comment: String,
    pub line: usize,
}

/// Result of the JavaScript pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaScriptAnalysis {
    pub declared_functions: Vec<NamedLocation>,
    pub unused_functions: Vec<NamedLocation>,
    pub declared_variables: Vec<NamedLocation>,
    pub unused_variables: Vec<NamedLocation>,
    /// Global brace/paren balance messages.
    pub syntax_errors: Vec<String>,
    pub var_usage: Vec<usize>,
    pub let_usage: Vec<usize>,
    pub const_usage: Vec<usize>,
    pub eval_usage: Vec<usize>,
    pub document_write_usage: Vec<usize>,
    pub todo_comments: Vec<TodoComment>,
    pub long_lines: Vec<usize>,
    pub magic_numbers: Vec<NumberLiteral>,
    pub semicolon_missing: Vec<usize>,
    pub arrow_functions: Vec<NamedLocation>,
    pub anonymous_functions: Vec<NamedLocation>,
    /// Lines using `==` or `!=`.
    pub double_equals: Vec<usize>,
    /// Lines using `===` or `!==`.
    pub triple_equals: Vec<usize>,
    pub console_log_usage: Vec<usize>,
    /// Findings from an external lint run, merged by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eslint_problems: Option<Vec<LintProblem>>,
}

impl JavaScriptAnalysis {
    /// Attach external lint findings to this result.
    pub fn with_lint_problems(mut self, problems: Vec<LintProblem>) -> Self {
        self.eslint_problems = Some(problems);
        self
    }
}

/// Insert or move a declaration, keeping first-insertion order.
fn upsert(entries: &mut Vec<NamedLocation>, name: &str, line: usize) {
    match entries.iter_mut().find(|entry| entry.name == name) {
        Some(entry) => entry.line = line,
        None => entries.push(NamedLocation {
            name: name.to_string(),
            line,
        }),
    }
}

/// Analyze JavaScript source text.
pub fn analyze(source: &str) -> JavaScriptAnalysis {
    let text = normalize_line_endings(source);
    let lines = split_lines(&text);

    let mut analysis = JavaScriptAnalysis::default();

    // name -> number of `function name(` declarations, which the call scan also matches
    let mut declaration_calls: HashMap<String, usize> = HashMap::new();
    let mut call_counts: HashMap<String, usize> = HashMap::new();
    let mut variable_declarations: HashMap<String, usize> = HashMap::new();
    let mut identifier_counts: HashMap<String, usize> = HashMap::new();

    let (mut open_braces, mut close_braces) = (0usize, 0usize);
    let (mut open_parens, mut close_parens) = (0usize, 0usize);
    let mut masker = LineMasker::new(CommentStyle::DoubleSlash);

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        let code = masker.mask(line);
        let code_trimmed = code.trim();

        for caps in FUNCTION_DECL_RE.captures_iter(&code) {
            upsert(&mut analysis.declared_functions, &caps[1], line_no);
            *declaration_calls.entry(caps[1].to_string()).or_default() += 1;
        }
        if let Some(caps) = ARROW_DECL_RE.captures(&code) {
            upsert(&mut analysis.declared_functions, &caps[1], line_no);
            analysis.arrow_functions.push(NamedLocation {
                name: caps[1].to_string(),
                line: line_no,
            });
        }
        if let Some(caps) = ANONYMOUS_DECL_RE.captures(&code) {
            upsert(&mut analysis.declared_functions, &caps[1], line_no);
            analysis.anonymous_functions.push(NamedLocation {
                name: caps[1].to_string(),
                line: line_no,
            });
        }
        for caps in VARIABLE_DECL_RE.captures_iter(&code) {
            upsert(&mut analysis.declared_variables, &caps[1], line_no);
            *variable_declarations.entry(caps[1].to_string()).or_default() += 1;
        }

        if VAR_RE.is_match(&code) {
            analysis.var_usage.push(line_no);
        }
        if LET_RE.is_match(&code) {
            analysis.let_usage.push(line_no);
        }
        if CONST_RE.is_match(&code) {
            analysis.const_usage.push(line_no);
        }
        if EVAL_RE.is_match(&code) {
            analysis.eval_usage.push(line_no);
        }
        if DOCUMENT_WRITE_RE.is_match(&code) {
            analysis.document_write_usage.push(line_no);
        }
        if TODO_RE.is_match(line) {
            analysis.todo_comments.push(TodoComment {
                comment: trimmed.to_string(),
                line: line_no,
            });
        }
        if line.chars().count() > MAX_LINE_LENGTH {
            analysis.long_lines.push(line_no);
        }

        for caps in NUMBER_RE.captures_iter(&code) {
            let value = &caps[1];
            if value != "0" && value != "1" {
                analysis.magic_numbers.push(NumberLiteral {
                    value: value.to_string(),
                    line: line_no,
                });
            }
        }

        if !code_trimmed.is_empty()
            && !trimmed.starts_with("//")
            && !code_trimmed.ends_with([';', '{', '}', ':'])
            && SEMICOLON_TAIL_RE.is_match(code_trimmed)
        {
            analysis.semicolon_missing.push(line_no);
        }

        let operators: Vec<&str> = OPERATOR_RE.find_iter(&code).map(|m| m.as_str()).collect();
        if operators.iter().any(|op| *op == "==" || *op == "!=") {
            analysis.double_equals.push(line_no);
        }
        if operators.iter().any(|op| *op == "===" || *op == "!==") {
            analysis.triple_equals.push(line_no);
        }

        if CONSOLE_LOG_RE.is_match(&code) {
            analysis.console_log_usage.push(line_no);
        }

        for caps in CALL_RE.captures_iter(&code) {
            *call_counts.entry(caps[1].to_string()).or_default() += 1;
        }
        for m in IDENT_RE.find_iter(&code) {
            *identifier_counts.entry(m.as_str().to_string()).or_default() += 1;
        }

        // Totals are taken over the raw text, strings and comments included
        open_braces += line.matches('{').count();
        close_braces += line.matches('}').count();
        open_parens += line.matches('(').count();
        close_parens += line.matches(')').count();
    }

    if open_braces != close_braces {
        analysis.syntax_errors.push(format!(
            "Count of '{{' ({}) differs from '}}' ({}).",
            open_braces, close_braces
        ));
    }
    if open_parens != close_parens {
        analysis.syntax_errors.push(format!(
            "Count of '(' ({}) differs from ')' ({}).",
            open_parens, close_parens
        ));
    }

    // A declaration's own `function name(` is matched by the call scan too
    analysis.unused_functions = analysis
        .declared_functions
        .iter()
        .filter(|entry| {
            let calls = call_counts.get(&entry.name).copied().unwrap_or(0);
            let own = declaration_calls.get(&entry.name).copied().unwrap_or(0);
            calls <= own
        })
        .cloned()
        .collect();

    analysis.unused_variables = analysis
        .declared_variables
        .iter()
        .filter(|entry| {
            let seen = identifier_counts.get(&entry.name).copied().unwrap_or(0);
            let declared = variable_declarations.get(&entry.name).copied().unwrap_or(0);
            seen <= declared
        })
        .cloned()
        .collect();

    analysis
}
