//! HTML and CSS section builders.
//!
//! Unlike Python and JavaScript these two have no informational sections,
//! so the success section is added only when nothing at all was reported.

use crate::analysis::languages::css::CssPropertyIssue;
use crate::analysis::languages::html::TagSnippet;
use crate::analysis::{CssAnalysis, HtmlAnalysis};

use super::{named_at_line, push_if_any, ReportSection};

fn snippet_items(snippets: &[TagSnippet]) -> Vec<String> {
    snippets
        .iter()
        .map(|s| named_at_line(&s.snippet, s.line))
        .collect()
}

fn property_items(issues: &[CssPropertyIssue]) -> Vec<String> {
    issues
        .iter()
        .map(|i| format!("{} (selector {}, line {})", i.property, i.selector, i.line))
        .collect()
}

pub(super) fn html_sections(r: &HtmlAnalysis) -> Vec<ReportSection> {
    let mut sections = Vec::new();

    push_if_any(
        &mut sections,
        ReportSection::warning(
            "html-unclosed",
            "Unclosed tags",
            r.unclosed_tags
                .iter()
                .map(|t| format!("<{}> at line {}", t.tag, t.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "html-missing-close",
            "Closing tags without an opening tag",
            r.missing_close_tags
                .iter()
                .map(|t| format!("</{}> at line {}", t.tag, t.line))
                .collect(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("html-incomplete", "Incomplete tags", snippet_items(&r.incomplete_tags)),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning("html-duplicated-ids", "Duplicated ids", r.duplicated_ids.clone()),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "html-img-alt",
            "Images without alt attribute",
            snippet_items(&r.imgs_without_alt),
        )
        .with_hint("Add alt text to images to improve accessibility."),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "html-links-href",
            "Links without href",
            snippet_items(&r.links_without_href),
        ),
    );

    if sections.is_empty() {
        sections.push(ReportSection::success(
            "html-success",
            "No problems found",
            "The analyzed HTML is consistent.",
        ));
    }
    sections
}

pub(super) fn css_sections(r: &CssAnalysis) -> Vec<ReportSection> {
    let mut sections = Vec::new();

    push_if_any(
        &mut sections,
        ReportSection::warning(
            "css-duplicated-selectors",
            "Duplicated selectors",
            r.duplicated_selectors.clone(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "css-invalid-selectors",
            "Invalid selectors",
            r.invalid_selectors.clone(),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "css-invalid-properties",
            "Malformed declarations",
            property_items(&r.invalid_properties),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "css-repeated-properties",
            "Repeated properties",
            property_items(&r.repeated_properties),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "css-unknown-properties",
            "Unknown properties",
            property_items(&r.unknown_properties),
        ),
    );
    push_if_any(
        &mut sections,
        ReportSection::warning(
            "css-unused-selectors",
            "Unused selectors",
            r.unused_selectors.clone(),
        ),
    );

    if sections.is_empty() {
        sections.push(ReportSection::success(
            "css-success",
            "No problems found",
            "The analyzed CSS is consistent.",
        ));
    }
    sections
}

#[cfg(test)]
mod tests {
    use crate::analysis::languages::{css, html};
    use crate::analysis::AnalysisResult;
    use crate::summary::summarize;

    #[test]
    fn test_html_unclosed_span() {
        let summary = summarize(&AnalysisResult::Html(html::analyze("<div><span></div>")));
        let unclosed = summary.section("html-unclosed").unwrap();
        assert_eq!(unclosed.items, vec!["<span> at line 1".to_string()]);
        assert!(summary.section("html-missing-close").is_none());
        assert_eq!(summary.issues_count, 1);
    }

    #[test]
    fn test_html_accessibility_sections() {
        let source = "<img src=\"a.png\">\n<a>top</a>\n";
        let summary = summarize(&AnalysisResult::Html(html::analyze(source)));
        let img = summary.section("html-img-alt").unwrap();
        assert_eq!(img.items, vec!["<img src=\"a.png\"> (line 1)".to_string()]);
        assert!(img.hint.is_some());
        assert_eq!(summary.section("html-links-href").unwrap().items.len(), 1);
    }

    #[test]
    fn test_css_duplicate_selector_once() {
        let summary = summarize(&AnalysisResult::Css(css::analyze(".a{color:red}.a{color:blue}")));
        let dup = summary.section("css-duplicated-selectors").unwrap();
        assert_eq!(dup.items, vec![".a".to_string()]);
        assert_eq!(summary.issues_count, 1);
    }

    #[test]
    fn test_css_property_item_format() {
        let summary = summarize(&AnalysisResult::Css(css::analyze(".box {\n  colour: red;\n}\n")));
        let unknown = summary.section("css-unknown-properties").unwrap();
        assert_eq!(unknown.items, vec!["colour (selector .box, line 2)".to_string()]);
    }

    #[test]
    fn test_clean_markup_success() {
        let css_summary = summarize(&AnalysisResult::Css(css::analyze(".ok { color: red; }")));
        assert_eq!(css_summary.sections[0].id, "css-success");
        assert_eq!(css_summary.issues_count, 0);
    }
}
