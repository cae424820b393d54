use crate::analysis::GenericAnalysis;

use super::ReportSection;

pub(super) fn sections(r: &GenericAnalysis) -> Vec<ReportSection> {
    let mut sections = vec![ReportSection::info(
        "generic-overview",
        "Basic statistics",
        vec![
            format!("Total lines: {}", r.lines),
            format!("Functions detected: {}", r.functions.len()),
            format!("Comment lines (heuristic): {}", r.comments),
        ],
    )
    .with_description(&format!("{} file", r.language.display_name()))];

    if !r.info.is_empty() {
        sections.push(ReportSection::info("generic-info", "Notes", r.info.clone()));
    }
    sections.push(ReportSection::success(
        "generic-success",
        "Basic analysis complete",
        "Experimental support - limited metrics.",
    ));
    sections
}
