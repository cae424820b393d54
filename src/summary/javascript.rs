use crate::analysis::JavaScriptAnalysis;
use crate::lint::LintProblem;

use super::{named_at_line, push_if_any, ReportSection};

fn line_list(lines: &[usize]) -> Vec<String> {
    lines.iter().map(|line| format!("Line {}", line)).collect()
}

fn lint_item(problem: &LintProblem) -> String {
    format!(
        "Line {}:{} {} ({})",
        problem.line,
        problem.column,
        problem.message,
        problem.rule_id.as_deref().unwrap_or("no-rule")
    )
}

pub(super) fn sections(r: &JavaScriptAnalysis) -> Vec<ReportSection> {
    let mut sections = Vec::new();

    push_if_any(
        &mut sections,
        ReportSection::warning("js-syntax", "Syntax errors", r.syntax_errors.clone()),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "js-unused-functions",
            "Unused functions",
            r.unused_functions
                .iter()
                .map(|f| named_at_line(&f.name, f.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "js-unused-vars",
            "Unused variables",
            r.unused_variables
                .iter()
                .map(|v| named_at_line(&v.name, v.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("js-var", "Use of var", line_list(&r.var_usage))
            .with_hint("Prefer let or const to declare variables."),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("js-eval", "Use of eval", line_list(&r.eval_usage)),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "js-document-write",
            "Use of document.write",
            line_list(&r.document_write_usage),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "js-todo",
            "TODO/FIXME comments",
            r.todo_comments
                .iter()
                .map(|t| named_at_line(&t.comment, t.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("js-long-lines", "Lines too long", line_list(&r.long_lines)),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "js-magic-numbers",
            "Magic numbers",
            r.magic_numbers
                .iter()
                .map(|n| named_at_line(&n.value, n.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "js-semicolon",
            "Possibly missing semicolon",
            line_list(&r.semicolon_missing),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("js-double-equals", "Use of ==", line_list(&r.double_equals))
            .with_hint("Prefer === for strict comparisons."),
    );
    push_if_any(
        &mut sections,
        ReportSection::info("js-console", "Use of console.log", line_list(&r.console_log_usage)),
    );
    push_if_any(
        &mut sections,
        ReportSection::info(
            "js-arrow-functions",
            "Arrow functions",
            r.arrow_functions
                .iter()
                .map(|f| named_at_line(&f.name, f.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::info(
            "js-anonymous-functions",
            "Anonymous functions",
            r.anonymous_functions
                .iter()
                .map(|f| named_at_line(&f.name, f.line))
                .collect(),
        ),
    );

    if let Some(problems) = &r.eslint_problems {
        push_if_any(
            &mut sections,
            ReportSection::warning(
                "js-eslint-errors",
                "Lint errors",
                problems.iter().filter(|p| p.is_error()).map(lint_item).collect(),
            ),
        );
        push_if_any(
            &mut sections,
            ReportSection::warning(
                "js-eslint-warnings",
                "Lint warnings",
                problems.iter().filter(|p| p.is_warning()).map(lint_item).collect(),
            ),
        );
    }

    if !sections.iter().any(ReportSection::is_warning) {
        sections.push(ReportSection::success(
            "js-success",
            "No critical problems found",
            "The analyzed JavaScript raised no warnings.",
        ));
    }
    sections
}
