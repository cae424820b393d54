//! Python analysis pass.
//!
//! A single line-oriented pass with nested block collection. A `def` header
//! pulls in its indented body, which is scanned for reads, writes, calls,
//! loops and unreachable code; every other line is scanned as module-level
//! code. Declared-versus-used findings are resolved with set differences once
//! the whole file has been seen.
//!
//! The "uninitialized variable" check compares each function's reads against
//! the writes declared anywhere in the file, not against control flow. It can
//! both miss and over-report relative to real data-flow analysis.

use std::collections::HashSet;
use std::ops::Range;

use lazy_static::lazy_static;
use phf::{phf_map, phf_set};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::NameSet;
use crate::text::{
    indent_width, mask_strings_and_comments, normalize_line_endings, split_lines, CommentStyle,
};

/// Lines longer than this are a style issue.
const MAX_LINE_LENGTH: usize = 100;
/// More loop headers than this in one function triggers a refactor hint.
const MAX_LOOPS: usize = 2;
/// More call-like tokens than this in one function triggers a refactor hint.
const MAX_CALLS: usize = 10;

static PYTHON_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "False", "None", "True", "and", "as", "assert", "async", "await", "break",
    "class", "continue", "def", "del", "elif", "else", "except", "finally",
    "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
    "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
};

static PYTHON_BUILTINS: phf::Set<&'static str> = phf_set! {
    "abs", "all", "any", "ascii", "bin", "bool", "bytearray", "bytes", "callable",
    "chr", "classmethod", "compile", "complex", "dict", "dir", "divmod",
    "enumerate", "eval", "exec", "filter", "float", "format", "frozenset",
    "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "int",
    "isinstance", "issubclass", "iter", "len", "list", "locals", "map", "max",
    "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print",
    "property", "range", "repr", "reversed", "round", "set", "setattr", "slice",
    "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars",
    "zip", "__name__", "__file__", "__doc__", "__class__",
    "Exception", "BaseException", "ArithmeticError", "AssertionError",
    "AttributeError", "FileNotFoundError", "ImportError", "IndexError",
    "KeyError", "KeyboardInterrupt", "NotImplemented", "NotImplementedError",
    "OSError", "IOError", "PermissionError", "RuntimeError", "StopIteration",
    "TypeError", "ValueError", "ZeroDivisionError", "Ellipsis",
};

/// Known third-party function fingerprints.
///
/// Keys are the md5 of the whole definition (header included), each line
/// trimmed and joined with `\n`.
static THIRD_PARTY_FINGERPRINTS: phf::Map<&'static str, &'static str> = phf_map! {
    "86fb269d190d2c85f6e0468ceca42a20" => "Sample 'hello_world' function",
    "5dad2f67a423e441ec835bb67340b70c" => "Tutorial 'hello_world' function",
};

lazy_static! {
    static ref DEF_RE: Regex =
        Regex::new(r"^(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\((.*)\)\s*(?:->[^:]*)?:").unwrap();
    static ref CLASS_RE: Regex = Regex::new(r"^class\s+([A-Za-z_]\w*)").unwrap();
    static ref FROM_IMPORT_RE: Regex = Regex::new(r"^from\s+([\w.]+)\s+import\s+(.+)").unwrap();
    static ref IMPORT_ALIAS_RE: Regex = Regex::new(r"\s+as\s+").unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"\b[A-Za-z_]\w*\b").unwrap();
    static ref FULL_IDENT_RE: Regex = Regex::new(r"^[A-Za-z_]\w*$").unwrap();

    /// `name = `, `name += `, `name //= ` ... (comparison filtered afterwards)
    static ref ASSIGNMENT_RE: Regex =
        Regex::new(r"\b([A-Za-z_]\w*)\s*(?://|\*\*|>>|<<|[-+*/%&|^@])?=").unwrap();
    static ref ANNOTATED_RE: Regex = Regex::new(r"^\s*([A-Za-z_]\w*)\s*:[^=]*=").unwrap();
    static ref TUPLE_ASSIGN_RE: Regex =
        Regex::new(r"^\s*([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)+)\s*=").unwrap();
    static ref FOR_TARGET_RE: Regex = Regex::new(r"\bfor\s+([A-Za-z_][\w\s,()]*?)\s+in\b").unwrap();
    static ref AS_TARGET_RE: Regex = Regex::new(r"\bas\s+([A-Za-z_]\w*)\b").unwrap();
    static ref LAMBDA_RE: Regex = Regex::new(r"\blambda\b([^:]*):").unwrap();

    static ref CALL_RE: Regex = Regex::new(r"\b([A-Za-z_]\w*)\s*\(").unwrap();
    static ref PRINT_RE: Regex = Regex::new(r"^print\s*\(").unwrap();
    static ref IF_FALSE_RE: Regex = Regex::new(r"^if\s+False\b").unwrap();
    static ref INDEX_RE: Regex = Regex::new(r"[\w)\]]\s*\[[0-9]+\]").unwrap();
    static ref LOOP_RE: Regex = Regex::new(r"^(?:for|while)\b").unwrap();
    static ref RETURN_RE: Regex = Regex::new(r"^return\b").unwrap();
}

/// A finding attributed to one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineIssue {
    pub line: usize,
    pub message: String,
}

impl LineIssue {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A `print(...)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintStatement {
    pub line: usize,
    pub code: String,
}

/// Per-function complexity counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityInfo {
    pub function: String,
    pub line: usize,
    /// Number of `for`/`while` headers in the body.
    pub loops: usize,
    /// Number of call-like tokens (`name(`) in the body.
    pub depth: usize,
}

/// An imported name never referenced afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedImport {
    pub name: String,
    pub line: usize,
}

/// Names a function assigns but nothing in the file reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedWrites {
    pub function: String,
    pub variables: Vec<String>,
}

/// Result of the Python pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PythonAnalysis {
    pub declared_functions: Vec<String>,
    pub called_functions: Vec<String>,
    pub unused_functions: Vec<String>,
    pub declared_vars: Vec<String>,
    pub used_vars: Vec<String>,
    pub unused_vars: Vec<String>,
    pub print_statements: Vec<PrintStatement>,
    pub uninitialized_vars: Vec<String>,
    pub docstring_issues: Vec<LineIssue>,
    pub function_complexity: Vec<ComplexityInfo>,
    pub style_issues: Vec<LineIssue>,
    pub common_errors: Vec<LineIssue>,
    pub refactor_suggestions: Vec<LineIssue>,
    pub unused_imports: Vec<UnusedImport>,
    pub dead_code: Vec<LineIssue>,
    /// Groups of functions whose bodies hash identically.
    pub duplicate_functions: Vec<Vec<String>>,
    pub unused_writes: Vec<UnusedWrites>,
    pub third_party_code: Vec<LineIssue>,
    pub performance_issues: Vec<LineIssue>,
}

/// Analyze Python source text.
pub fn analyze(source: &str) -> PythonAnalysis {
    let text = normalize_line_endings(source);
    let lines = split_lines(&text);

    let mut scanner = Scanner::new(&lines);
    scanner.check_style();
    scanner.scan();
    scanner.finish()
}

/// Contiguous body of a `def`/`class`/loop header.
struct Block {
    body: Range<usize>,
    end: usize,
}

/// Every line after `header` that is blank or indented deeper than it.
fn collect_block(lines: &[&str], header: usize) -> Block {
    let base = indent_width(lines[header]);
    let mut end = header;
    for (idx, line) in lines.iter().enumerate().skip(header + 1) {
        if line.trim().is_empty() || indent_width(line) > base {
            end = idx;
            continue;
        }
        break;
    }
    Block {
        body: header + 1..end + 1,
        end,
    }
}

fn first_content_line(lines: &[&str], range: Range<usize>) -> Option<usize> {
    range.into_iter().find(|&idx| {
        let trimmed = lines[idx].trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    })
}

/// Tracks multi-line triple-quoted strings so their contents are not scanned.
#[derive(Default)]
struct TripleQuotes {
    open: Option<&'static str>,
}

impl TripleQuotes {
    /// Returns true when the line starts inside a triple-quoted string.
    ///
    /// Delimiters are counted on the masked line, so a `"""` inside a
    /// comment or an ordinary string literal does not open a block.
    fn skip(&mut self, line: &str) -> bool {
        if let Some(quote) = self.open {
            if line.contains(quote) {
                self.open = None;
            }
            return true;
        }
        let code = mask_strings_and_comments(line, CommentStyle::Hash);
        for quote in ["\"\"\"", "'''"] {
            if code.matches(quote).count() % 2 == 1 {
                self.open = Some(quote);
                break;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssignKind {
    /// Pure write: `x = ...`, `for x in`, `as x`, lambda parameter.
    Plain,
    /// Read-modify-write: `x += ...`.
    Compound,
    /// Keyword argument inside brackets: `f(x=1)`.
    Keyword,
}

#[derive(Debug, Clone)]
struct Assignment {
    name: String,
    start: usize,
    kind: AssignKind,
}

fn bracket_delta(code: &str) -> i32 {
    code.chars()
        .map(|c| match c {
            '(' | '[' | '{' => 1,
            ')' | ']' | '}' => -1,
            _ => 0,
        })
        .sum()
}

fn push_assignment(found: &mut Vec<Assignment>, name: &str, start: usize, kind: AssignKind) {
    if PYTHON_KEYWORDS.contains(name) || found.iter().any(|a| a.start == start) {
        return;
    }
    found.push(Assignment {
        name: name.to_string(),
        start,
        kind,
    });
}

/// Collect assignment targets from a masked line.
///
/// `base_depth` is the bracket depth carried over from previous lines, so
/// keyword arguments on continuation lines are not taken for assignments.
fn collect_assignments(code: &str, base_depth: i32) -> Vec<Assignment> {
    let mut found = Vec::new();
    let mut scan_from = 0;

    if base_depth == 0 {
        if let Some(caps) = ANNOTATED_RE.captures(code) {
            if let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) {
                if !code[whole.end()..].starts_with('=')
                    && !PYTHON_KEYWORDS.contains(target.as_str())
                {
                    push_assignment(&mut found, target.as_str(), target.start(), AssignKind::Plain);
                    scan_from = whole.end();
                }
            }
        }

        if let Some(caps) = TUPLE_ASSIGN_RE.captures(code) {
            if let (Some(whole), Some(targets)) = (caps.get(0), caps.get(1)) {
                if !code[whole.end()..].starts_with('=') {
                    for m in IDENT_RE.find_iter(targets.as_str()) {
                        push_assignment(
                            &mut found,
                            m.as_str(),
                            targets.start() + m.start(),
                            AssignKind::Plain,
                        );
                    }
                }
            }
        }
    }

    for caps in ASSIGNMENT_RE.captures_iter(code) {
        let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if target.start() < scan_from
            || code[whole.end()..].starts_with('=')
            || code[..target.start()].ends_with('.')
        {
            continue;
        }
        let operator = whole.as_str()[target.as_str().len()..].trim();
        let kind = if base_depth + bracket_delta(&code[..target.start()]) > 0 {
            AssignKind::Keyword
        } else if operator == "=" {
            AssignKind::Plain
        } else {
            AssignKind::Compound
        };
        push_assignment(&mut found, target.as_str(), target.start(), kind);
    }

    for caps in FOR_TARGET_RE.captures_iter(code) {
        if let Some(targets) = caps.get(1) {
            for m in IDENT_RE.find_iter(targets.as_str()) {
                push_assignment(
                    &mut found,
                    m.as_str(),
                    targets.start() + m.start(),
                    AssignKind::Plain,
                );
            }
        }
    }

    for caps in AS_TARGET_RE.captures_iter(code) {
        if let Some(target) = caps.get(1) {
            push_assignment(&mut found, target.as_str(), target.start(), AssignKind::Plain);
        }
    }

    for caps in LAMBDA_RE.captures_iter(code) {
        let Some(params) = caps.get(1) else {
            continue;
        };
        let text = params.as_str();
        for m in IDENT_RE.find_iter(text) {
            let before = &text[..m.start()];
            let in_default = before
                .rfind('=')
                .map_or(false, |eq| before.rfind(',').map_or(true, |comma| eq > comma));
            if !in_default {
                push_assignment(&mut found, m.as_str(), params.start() + m.start(), AssignKind::Plain);
            }
        }
    }

    found
}

/// Parameter names of a `def` header, minus `self`/`cls`.
fn extract_parameters(params: &str) -> Vec<String> {
    params
        .split(',')
        .filter_map(|segment| {
            let segment = segment.trim().trim_start_matches('*');
            let name = segment.split(['=', ':']).next()?.trim();
            let keep = FULL_IDENT_RE.is_match(name)
                && name != "self"
                && name != "cls"
                && !PYTHON_KEYWORDS.contains(name);
            keep.then(|| name.to_string())
        })
        .collect()
}

/// Name an import segment binds: the alias, or the root of a dotted module.
fn import_binding(segment: &str) -> Option<String> {
    let mut parts = IMPORT_ALIAS_RE.split(segment.trim());
    let original = parts.next()?.trim();
    let name = match parts.next() {
        Some(alias) => alias.trim(),
        None => original.split('.').next().unwrap_or(original),
    };
    FULL_IDENT_RE.is_match(name).then(|| name.to_string())
}

fn strip_string_prefix(content: &str) -> &str {
    let stripped = content.trim_start_matches(['r', 'R', 'u', 'U', 'b', 'B', 'f', 'F']);
    if stripped.len() + 2 >= content.len() && (stripped.starts_with('"') || stripped.starts_with('\'')) {
        stripped
    } else {
        content
    }
}

fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// `_`-prefixed names are intentionally unused by convention.
fn is_throwaway(name: &str) -> bool {
    name.starts_with('_')
}

/// What one scanned line contributed to the enclosing function.
struct LineScan {
    reads: Vec<String>,
    writes: Vec<String>,
    calls: usize,
}

struct Scanner<'a> {
    lines: &'a [&'a str],
    analysis: PythonAnalysis,
    declared_functions: NameSet,
    called_functions: NameSet,
    declared_vars: NameSet,
    used_vars: NameSet,
    /// Every identifier seen, keywords and attributes included.
    used_names: HashSet<String>,
    /// Names bound by `def`, `class` and `import`.
    bound_names: HashSet<String>,
    uninitialized: NameSet,
    imports: Vec<UnusedImport>,
    body_hashes: Vec<(String, Vec<String>)>,
    writes_by_function: Vec<(String, NameSet)>,
    /// Bracket depth carried across lines.
    depth: i32,
}

impl<'a> Scanner<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            analysis: PythonAnalysis::default(),
            declared_functions: NameSet::new(),
            called_functions: NameSet::new(),
            declared_vars: NameSet::new(),
            used_vars: NameSet::new(),
            used_names: HashSet::new(),
            bound_names: HashSet::new(),
            uninitialized: NameSet::new(),
            imports: Vec::new(),
            body_hashes: Vec::new(),
            writes_by_function: Vec::new(),
            depth: 0,
        }
    }

    fn check_style(&mut self) {
        for (idx, line) in self.lines.iter().enumerate() {
            let line_no = idx + 1;
            if line.ends_with(' ') || line.ends_with('\t') {
                self.analysis
                    .style_issues
                    .push(LineIssue::new(line_no, "trailing whitespace."));
            }
            if line.contains('\t') {
                self.analysis
                    .style_issues
                    .push(LineIssue::new(line_no, "tab character found (prefer spaces)."));
            }
            if line.chars().count() > MAX_LINE_LENGTH {
                self.analysis.style_issues.push(LineIssue::new(
                    line_no,
                    format!("line longer than {} characters.", MAX_LINE_LENGTH),
                ));
            }
        }
    }

    fn scan(&mut self) {
        let mut strings = TripleQuotes::default();
        let mut idx = 0;

        while idx < self.lines.len() {
            let line = self.lines[idx];
            if strings.skip(line) {
                idx += 1;
                continue;
            }
            let trimmed = line.trim();

            if self.register_imports(idx, trimmed) {
                idx += 1;
                continue;
            }

            if let Some(caps) = DEF_RE.captures(trimmed) {
                let name = caps[1].to_string();
                let params = caps[2].to_string();
                idx = self.scan_function(idx, &name, &params) + 1;
                continue;
            }

            if let Some(caps) = CLASS_RE.captures(trimmed) {
                let name = caps[1].to_string();
                self.bound_names.insert(name.clone());
                self.depth = 0;
                let block = collect_block(self.lines, idx);
                self.check_docstring("Class", &name, idx, &block);
            }

            self.scan_line(idx);
            idx += 1;
        }
    }

    /// Register `import`/`from ... import` bindings. Returns true for import lines.
    fn register_imports(&mut self, idx: usize, trimmed: &str) -> bool {
        let code = trimmed.split('#').next().unwrap_or(trimmed);
        let segments: Vec<&str> = if let Some(rest) = code.strip_prefix("import ") {
            rest.split(',').collect()
        } else if let Some(caps) = FROM_IMPORT_RE.captures(code) {
            if caps.get(1).map(|m| m.as_str()) == Some("__future__") {
                return true;
            }
            match caps.get(2) {
                Some(names) => names
                    .as_str()
                    .trim()
                    .trim_start_matches('(')
                    .trim_end_matches(['\\', ')'])
                    .split(',')
                    .collect(),
                None => return true,
            }
        } else {
            return false;
        };

        for segment in segments {
            let Some(name) = import_binding(segment) else {
                continue;
            };
            self.bound_names.insert(name.clone());
            match self.imports.iter_mut().find(|imp| imp.name == name) {
                Some(existing) => existing.line = idx + 1,
                None => self.imports.push(UnusedImport {
                    name,
                    line: idx + 1,
                }),
            }
        }
        true
    }

    fn check_docstring(&mut self, kind: &str, name: &str, header: usize, block: &Block) {
        let Some(first) = first_content_line(self.lines, block.body.clone()) else {
            self.analysis.docstring_issues.push(LineIssue::new(
                header + 1,
                format!("{} '{}' has no docstring.", kind, name),
            ));
            return;
        };

        let content = strip_string_prefix(self.lines[first].trim());
        let quote = if content.starts_with("\"\"\"") {
            "\"\"\""
        } else if content.starts_with("'''") {
            "'''"
        } else {
            self.analysis.docstring_issues.push(LineIssue::new(
                first + 1,
                format!("{} '{}' has no docstring.", kind, name),
            ));
            return;
        };

        // Opened and closed on the same line
        if content.matches(quote).count() >= 2 {
            return;
        }
        if (first + 1..=block.end).any(|idx| self.lines[idx].contains(quote)) {
            return;
        }
        self.analysis.docstring_issues.push(LineIssue::new(
            first + 1,
            format!("{} '{}' has an unterminated docstring.", kind, name),
        ));
    }

    fn record_fingerprints(&mut self, header: usize, name: &str, block: &Block) {
        let definition = self.lines[header..=block.end]
            .iter()
            .map(|line| line.trim())
            .collect::<Vec<_>>()
            .join("\n");
        let digest = format!("{:x}", md5::compute(definition.trim().as_bytes()));
        if let Some(description) = THIRD_PARTY_FINGERPRINTS.get(digest.as_str()) {
            self.analysis
                .third_party_code
                .push(LineIssue::new(header + 1, *description));
        }

        let body = self.lines[block.body.clone()]
            .iter()
            .map(|line| line.trim())
            .collect::<Vec<_>>()
            .join("\n");
        let body = body.trim();
        if body.is_empty() {
            return;
        }
        let digest = format!("{:x}", md5::compute(body.as_bytes()));
        match self.body_hashes.iter_mut().find(|(hash, _)| *hash == digest) {
            Some((_, names)) => names.push(name.to_string()),
            None => self.body_hashes.push((digest, vec![name.to_string()])),
        }
    }

    /// Scan one code line for identifiers, assignments, prints and calls.
    fn scan_line(&mut self, idx: usize) -> LineScan {
        let line = self.lines[idx];
        let trimmed = line.trim();
        let code = mask_strings_and_comments(line, CommentStyle::Hash);

        let assignments = collect_assignments(&code, self.depth);
        self.depth = (self.depth + bracket_delta(&code)).max(0);

        let write_positions: HashSet<usize> = assignments
            .iter()
            .filter(|a| a.kind != AssignKind::Compound)
            .map(|a| a.start)
            .collect();

        let mut reads = Vec::new();
        for m in IDENT_RE.find_iter(&code) {
            let word = m.as_str();
            self.used_names.insert(word.to_string());
            if PYTHON_KEYWORDS.contains(word)
                || write_positions.contains(&m.start())
                || code[..m.start()].ends_with('.')
            {
                continue;
            }
            self.used_vars.insert(word);
            reads.push(word.to_string());
        }

        let writes: Vec<String> = assignments
            .into_iter()
            .filter(|a| a.kind != AssignKind::Keyword)
            .map(|a| a.name)
            .collect();
        for name in &writes {
            self.declared_vars.insert(name);
        }

        if PRINT_RE.is_match(trimmed) {
            self.analysis.print_statements.push(PrintStatement {
                line: idx + 1,
                code: trimmed.to_string(),
            });
        }

        if INDEX_RE.is_match(&code) {
            self.analysis
                .common_errors
                .push(LineIssue::new(idx + 1, "Possible IndexError (hard-coded index)."));
        }

        let mut calls = 0;
        for caps in CALL_RE.captures_iter(&code) {
            calls += 1;
            let name = &caps[1];
            if !PYTHON_KEYWORDS.contains(name) {
                self.called_functions.insert(name);
            }
        }

        LineScan {
            reads,
            writes,
            calls,
        }
    }

    fn loop_has_call(&self, header: usize) -> bool {
        collect_block(self.lines, header).body.any(|idx| {
            let code = mask_strings_and_comments(self.lines[idx], CommentStyle::Hash);
            CALL_RE.is_match(&code)
        })
    }

    /// Scan a function definition. Returns the index of its last line.
    fn scan_function(&mut self, header: usize, name: &str, params: &str) -> usize {
        let line_no = header + 1;
        self.declared_functions.insert(name);
        self.bound_names.insert(name.to_string());

        let block = collect_block(self.lines, header);
        self.check_docstring("Function", name, header, &block);
        self.record_fingerprints(header, name, &block);

        let mut writes = NameSet::new();
        let mut reads = NameSet::new();
        for param in extract_parameters(params) {
            self.declared_vars.insert(&param);
            writes.insert(&param);
        }

        let body_indent =
            first_content_line(self.lines, block.body.clone()).map(|idx| indent_width(self.lines[idx]));
        let mut loops = 0;
        let mut calls = 0;
        let mut return_indent: Option<usize> = None;
        let mut strings = TripleQuotes::default();
        self.depth = 0;

        for idx in block.body.clone() {
            let line = self.lines[idx];
            if strings.skip(line) {
                continue;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = indent_width(line);

            if RETURN_RE.is_match(trimmed) && Some(indent) == body_indent {
                return_indent = Some(indent);
            } else if let Some(limit) = return_indent {
                if indent <= limit {
                    self.analysis
                        .dead_code
                        .push(LineIssue::new(idx + 1, "Code after 'return' is unreachable."));
                    return_indent = None;
                }
            }

            if self.register_imports(idx, trimmed) {
                continue;
            }

            if let Some(caps) = DEF_RE.captures(trimmed) {
                let nested = caps[1].to_string();
                self.declared_functions.insert(&nested);
                self.bound_names.insert(nested.clone());
                writes.insert(&nested);
                for param in extract_parameters(&caps[2]) {
                    self.declared_vars.insert(&param);
                    writes.insert(&param);
                }
                continue;
            }
            if let Some(caps) = CLASS_RE.captures(trimmed) {
                self.bound_names.insert(caps[1].to_string());
            }

            let scan = self.scan_line(idx);
            for read in scan.reads {
                if !writes.contains(&read) && !PYTHON_BUILTINS.contains(read.as_str()) {
                    reads.insert(&read);
                }
            }
            for write in &scan.writes {
                writes.insert(write);
            }
            calls += scan.calls;

            if IF_FALSE_RE.is_match(trimmed) {
                self.analysis
                    .dead_code
                    .push(LineIssue::new(idx + 1, "'if False' block found."));
            }

            if LOOP_RE.is_match(trimmed) {
                loops += 1;
                if self.loop_has_call(idx) {
                    self.analysis
                        .performance_issues
                        .push(LineIssue::new(idx + 1, "Function call inside loop."));
                }
            }
        }

        self.analysis.function_complexity.push(ComplexityInfo {
            function: name.to_string(),
            line: line_no,
            loops,
            depth: calls,
        });
        if loops > MAX_LOOPS || calls > MAX_CALLS {
            self.analysis.refactor_suggestions.push(LineIssue::new(
                line_no,
                format!(
                    "Function '{}' is too complex ({} loops, {} calls). Consider refactoring.",
                    name, loops, calls
                ),
            ));
        }

        for read in reads.iter() {
            self.uninitialized.insert(read);
        }
        self.writes_by_function.push((name.to_string(), writes));
        self.depth = 0;

        block.end
    }

    fn finish(self) -> PythonAnalysis {
        let Scanner {
            mut analysis,
            declared_functions,
            called_functions,
            declared_vars,
            used_vars,
            used_names,
            bound_names,
            uninitialized,
            imports,
            body_hashes,
            writes_by_function,
            ..
        } = self;

        analysis.unused_functions = declared_functions
            .iter()
            .filter(|name| !called_functions.contains(name) && !is_dunder(name))
            .map(str::to_string)
            .collect();
        analysis.declared_functions = declared_functions.into_vec();
        analysis.called_functions = called_functions.into_vec();

        analysis.used_vars = declared_vars
            .iter()
            .filter(|name| used_vars.contains(name))
            .map(str::to_string)
            .collect();
        analysis.unused_vars = declared_vars
            .iter()
            .filter(|name| !used_vars.contains(name) && !is_throwaway(name))
            .map(str::to_string)
            .collect();

        analysis.uninitialized_vars = uninitialized
            .iter()
            .filter(|name| {
                !declared_vars.contains(name)
                    && !bound_names.contains(*name)
                    && !PYTHON_BUILTINS.contains(*name)
                    && *name != "self"
                    && *name != "cls"
            })
            .map(str::to_string)
            .collect();
        analysis.declared_vars = declared_vars.into_vec();

        analysis.unused_imports = imports
            .into_iter()
            .filter(|imp| !used_names.contains(&imp.name))
            .collect();

        analysis.duplicate_functions = body_hashes
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(_, names)| names)
            .collect();

        analysis.unused_writes = writes_by_function
            .into_iter()
            .filter_map(|(function, writes)| {
                let variables: Vec<String> = writes
                    .iter()
                    .filter(|name| !used_vars.contains(name) && !is_throwaway(name))
                    .map(str::to_string)
                    .collect();
                (!variables.is_empty()).then_some(UnusedWrites {
                    function,
                    variables,
                })
            })
            .collect();

        dedup_issues(&mut analysis.performance_issues);
        dedup_issues(&mut analysis.common_errors);

        analysis
    }
}

/// Drop repeated `(line, message)` pairs, keeping first occurrences.
fn dedup_issues(issues: &mut Vec<LineIssue>) {
    let mut seen = HashSet::new();
    issues.retain(|issue| seen.insert((issue.line, issue.message.clone())));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unterminated_docstring_is_flagged() {
        let source = "def broken():\n    \"\"\"Starts here\n    return 1\n";
        let result = analyze(source);
        assert!(
            result
                .docstring_issues
                .iter()
                .any(|i| i.line == 2 && i.message.contains("unterminated")),
            "got {:?}",
            result.docstring_issues
        );
    }

    #[test]
    fn test_one_line_docstring_is_accepted() {
        let source = "def fine():\n    \"\"\"Does things.\"\"\"\n    return 1\n";
        let result = analyze(source);
        assert!(result.docstring_issues.is_empty(), "got {:?}", result.docstring_issues);
    }

    #[test]
    fn test_multi_line_docstring_is_accepted() {
        let source = "def fine():\n    '''Does things.\n\n    More text.\n    '''\n    return 1\n";
        let result = analyze(source);
        assert!(result.docstring_issues.is_empty(), "got {:?}", result.docstring_issues);
    }

    #[test]
    fn test_missing_docstring_for_function_and_class() {
        let source = "class Thing:\n    x = 1\n\ndef run():\n    return 2\n";
        let result = analyze(source);
        let messages: Vec<_> = result.docstring_issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.contains(&"Class 'Thing' has no docstring."));
        assert!(messages.contains(&"Function 'run' has no docstring."));
        // Reported on the first content line of the block
        assert_eq!(result.docstring_issues[0].line, 2);
    }

    #[test]
    fn test_duplicate_function_bodies() {
        let source = "\
def first(a):
    \"\"\"Doubles.\"\"\"
    return a * 2

def second(a):
      \"\"\"Doubles.\"\"\"
      return a * 2
";
        let result = analyze(source);
        assert_eq!(result.duplicate_functions, vec![vec!["first".to_string(), "second".to_string()]]);
    }

    #[test]
    fn test_third_party_fingerprint() {
        let source = "def hello_world():\n    print(\"Hello, world!\")\n";
        let result = analyze(source);
        assert_eq!(result.third_party_code.len(), 1);
        assert_eq!(result.third_party_code[0].line, 1);
        assert_eq!(result.print_statements[0].line, 2);
    }

    #[test]
    fn test_unused_and_called_functions() {
        let source = "\
def used():
    \"\"\"Used.\"\"\"
    return 1

def unused():
    \"\"\"Unused.\"\"\"
    return used()

class Box:
    \"\"\"Box.\"\"\"
    def __init__(self):
        \"\"\"Init.\"\"\"
        self.value = 1
";
        let result = analyze(source);
        assert!(result.declared_functions.contains(&"used".to_string()));
        assert!(result.declared_functions.contains(&"__init__".to_string()));
        assert_eq!(result.unused_functions, vec!["unused".to_string()]);
    }

    #[test]
    fn test_unused_import() {
        let source = "import os\nimport sys as system\nfrom collections import OrderedDict, deque\n\nprint(os.getcwd())\nq = deque()\nprint(q)\n";
        let result = analyze(source);
        let names: Vec<_> = result.unused_imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["system", "OrderedDict"]);
        assert_eq!(result.unused_imports[0].line, 2);
    }

    #[test]
    fn test_uninitialized_reads_inside_function() {
        let source = "\
def compute(a):
    \"\"\"Compute.\"\"\"
    total = a + offset
    return total + len(self_value)

self_value = 3
";
        let result = analyze(source);
        // offset is never written anywhere; self_value is written at module level
        assert_eq!(result.uninitialized_vars, vec!["offset".to_string()]);
    }

    #[test]
    fn test_self_and_cls_never_uninitialized() {
        let source = "\
class A:
    \"\"\"A.\"\"\"
    def m(self):
        \"\"\"M.\"\"\"
        return self.x

    @classmethod
    def build(cls):
        \"\"\"Build.\"\"\"
        return cls()
";
        let result = analyze(source);
        assert!(!result.uninitialized_vars.contains(&"self".to_string()));
        assert!(!result.uninitialized_vars.contains(&"cls".to_string()));
    }

    #[test]
    fn test_builtin_shadowed_locally_not_flagged() {
        let source = "def f():\n    \"\"\"F.\"\"\"\n    list = [1]\n    return list + sorted(list)\n";
        let result = analyze(source);
        assert!(result.uninitialized_vars.is_empty(), "got {:?}", result.uninitialized_vars);
    }

    #[test]
    fn test_unused_writes_and_variables() {
        let source = "\
def f(unused_param):
    \"\"\"F.\"\"\"
    kept = 1
    dropped = 2
    for _ in range(3):
        kept += 1
    return kept
";
        let result = analyze(source);
        assert_eq!(result.unused_writes.len(), 1);
        assert_eq!(result.unused_writes[0].function, "f");
        assert_eq!(
            result.unused_writes[0].variables,
            vec!["unused_param".to_string(), "dropped".to_string()]
        );
        assert!(result.unused_vars.contains(&"dropped".to_string()));
        assert!(!result.unused_vars.contains(&"kept".to_string()));
        assert!(!result.unused_vars.contains(&"_".to_string()));
    }

    #[test]
    fn test_keyword_arguments_are_not_assignments() {
        let source = "result = dict(\n    alpha=1,\n    beta=2,\n)\nprint(result)\n";
        let result = analyze(source);
        assert_eq!(result.declared_vars, vec!["result".to_string()]);
    }

    #[test]
    fn test_dead_code_after_return_and_if_false() {
        let source = "\
def f(x):
    \"\"\"F.\"\"\"
    if False:
        x = 2
    if x:
        return 1
    return x
    print('never')
";
        let result = analyze(source);
        let dead: Vec<_> = result.dead_code.iter().map(|d| (d.line, d.message.as_str())).collect();
        assert!(dead.contains(&(3, "'if False' block found.")));
        assert!(dead.contains(&(8, "Code after 'return' is unreachable.")));
        // return inside the `if` is conditional
        assert_eq!(dead.len(), 2);
    }

    #[test]
    fn test_call_inside_loop_and_complexity() {
        let source = "\
def busy(items):
    \"\"\"Busy.\"\"\"
    for a in items:
        for b in items:
            while a < b:
                a = step(a)
    return a
";
        let result = analyze(source);
        assert_eq!(result.function_complexity[0].loops, 3);
        assert_eq!(result.refactor_suggestions.len(), 1);
        assert_eq!(result.refactor_suggestions[0].line, 1);
        let perf_lines: Vec<_> = result.performance_issues.iter().map(|p| p.line).collect();
        assert_eq!(perf_lines, vec![3, 4, 5]);
    }

    #[test]
    fn test_style_issues() {
        let long = format!("x = '{}'", "a".repeat(120));
        let source = format!("a = 1 \n\tb = 2\n{}\n", long);
        let result = analyze(&source);
        let lines: Vec<_> = result.style_issues.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_index_error_heuristic_and_dedup() {
        let source = "items = [0]\nfirst = items[0] + items[1]\n";
        let result = analyze(source);
        assert_eq!(result.common_errors.len(), 1);
        assert_eq!(result.common_errors[0].line, 2);
    }

    #[test]
    fn test_crlf_line_numbers() {
        let source = "import os\r\n\r\nprint(1)\r\n";
        let result = analyze(source);
        assert_eq!(result.print_statements[0].line, 3);
        assert_eq!(result.unused_imports[0].line, 1);
    }

    #[test]
    fn test_collect_assignments_kinds() {
        let kinds = |code: &str| -> Vec<(String, AssignKind)> {
            collect_assignments(code, 0)
                .into_iter()
                .map(|a| (a.name, a.kind))
                .collect()
        };
        assert_eq!(kinds("x = 1"), vec![("x".to_string(), AssignKind::Plain)]);
        assert_eq!(kinds("x += 1"), vec![("x".to_string(), AssignKind::Compound)]);
        assert!(kinds("x == 1").is_empty());
        assert!(kinds("self.x = 1").is_empty());
        assert_eq!(kinds("f(key=1)"), vec![("key".to_string(), AssignKind::Keyword)]);
        assert_eq!(kinds("count: int = 0"), vec![("count".to_string(), AssignKind::Plain)]);
        let names: Vec<_> = kinds("a, b = pair").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        let names: Vec<_> = kinds("for k, v in d.items():").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["k".to_string(), "v".to_string()]);
    }

    #[test]
    fn test_triple_quote_in_comment_does_not_open_string() {
        let source = "x = 1  # wrap docs in \"\"\" quotes\n\ndef unused():\n    \"\"\"Doc.\"\"\"\n    return x\n";
        let result = analyze(source);
        assert_eq!(result.declared_functions, vec!["unused".to_string()]);
        assert_eq!(result.unused_functions, vec!["unused".to_string()]);
        assert!(result.docstring_issues.is_empty());
    }

    #[test]
    fn test_triple_quote_in_string_literal_does_not_open_string() {
        let source = "QUOTE = '\"\"\"'\n\ndef helper():\n    return QUOTE\n";
        let result = analyze(source);
        assert_eq!(result.declared_functions, vec!["helper".to_string()]);
        assert_eq!(result.docstring_issues.len(), 1);
        assert_eq!(result.docstring_issues[0].line, 4);
    }

    #[test]
    fn test_multi_line_string_contents_are_skipped() {
        let source = "def a():\n    \"\"\"\n    def hidden():\n    \"\"\"\n    return 1\n\na()\n";
        let result = analyze(source);
        assert_eq!(result.declared_functions, vec!["a".to_string()]);
        assert!(result.unused_functions.is_empty());
    }
}
