use crate::analysis::languages::python::LineIssue;
use crate::analysis::PythonAnalysis;

use super::{at_line, named_at_line, push_if_any, ReportSection};

fn line_items(issues: &[LineIssue]) -> Vec<String> {
    issues.iter().map(|i| at_line(i.line, &i.message)).collect()
}

pub(super) fn sections(r: &PythonAnalysis) -> Vec<ReportSection> {
    let mut sections = Vec::new();

    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-unused-functions",
            "Functions declared but never used",
            r.unused_functions.clone(),
        )
        .with_hint("Remove unused functions to keep the code clean."),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-unused-vars",
            "Variables declared but never used",
            r.unused_vars.clone(),
        )
        .with_hint("Remove unused variables to keep the code organized."),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-unused-imports",
            "Unused imports",
            r.unused_imports
                .iter()
                .map(|i| named_at_line(&i.name, i.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-docstrings",
            "Docstring problems",
            line_items(&r.docstring_issues),
        )
        .with_hint("Add docstrings to document functions and classes."),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("python-dead-code", "Dead code found", line_items(&r.dead_code)),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-duplicate-functions",
            "Duplicate functions",
            r.duplicate_functions.iter().map(|group| group.join(", ")).collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-unused-writes",
            "Variables assigned but never read",
            r.unused_writes
                .iter()
                .flat_map(|w| {
                    w.variables
                        .iter()
                        .map(move |v| format!("Function '{}': {}", w.function, v))
                })
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-uninitialized",
            "Variables used before assignment",
            r.uninitialized_vars.clone(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("python-style", "Style problems (PEP 8)", line_items(&r.style_issues)),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-common-errors",
            "Common error patterns",
            line_items(&r.common_errors),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-refactor",
            "Refactoring suggestions",
            line_items(&r.refactor_suggestions),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-third-party",
            "Third-party code detected",
            line_items(&r.third_party_code),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "python-performance",
            "Possible performance problems",
            line_items(&r.performance_issues),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::info(
            "python-prints",
            "print() calls found",
            r.print_statements
                .iter()
                .map(|p| at_line(p.line, &p.code))
                .collect(),
        ),
    );

    if !sections.iter().any(ReportSection::is_warning) {
        sections.push(ReportSection::success(
            "python-success",
            "No critical problems found",
            "The analyzed Python code raised no warnings.",
        ));
    }
    sections
}
