//! Integration tests for report summaries built from the fixtures.

use std::path::PathBuf;

use code_analyzer::{analyze_language, summarize, AnalyzeSummary, Language, Severity, Summary};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn summarize_fixture(name: &str) -> Summary {
    let path = testdata_path().join(name);
    let language = Language::from_path(&path).expect("supported extension");
    let source = std::fs::read_to_string(&path).expect("fixture should exist");
    summarize(&analyze_language(language, &source))
}

const FIXTURES: [&str; 7] = [
    "sample.py",
    "sample.js",
    "sample.html",
    "sample.css",
    "sample.go",
    "sample.rb",
    "sample.php",
];

#[test]
fn test_issues_count_is_warning_section_count() {
    for name in FIXTURES {
        let summary = summarize_fixture(name);
        let warnings = summary
            .sections
            .iter()
            .filter(|s| s.severity == Severity::Warning)
            .count();
        assert_eq!(summary.issues_count, warnings, "{}", name);
    }
}

#[test]
fn test_summaries_are_deterministic() {
    for name in FIXTURES {
        assert_eq!(summarize_fixture(name), summarize_fixture(name), "{}", name);
    }
}

#[test]
fn test_no_empty_sections() {
    for name in FIXTURES {
        for section in summarize_fixture(name).sections {
            assert!(!section.items.is_empty(), "{}: empty section {}", name, section.id);
        }
    }
}

#[test]
fn test_python_fixture_sections() {
    let summary = summarize_fixture("sample.py");
    assert!(summary.issues_count > 0);
    assert!(summary.section("python-success").is_none());

    let imports = summary.section("python-unused-imports").unwrap();
    assert_eq!(imports.items, vec!["os (line 1)".to_string()]);

    let duplicates = summary.section("python-duplicate-functions").unwrap();
    assert!(duplicates.items.contains(&"first_total, second_total".to_string()));

    let dead = summary.section("python-dead-code").unwrap();
    assert!(dead
        .items
        .contains(&"Line 34: Code after 'return' is unreachable.".to_string()));
}

#[test]
fn test_javascript_fixture_sections() {
    let summary = summarize_fixture("sample.js");
    for id in ["js-var", "js-eval", "js-document-write", "js-double-equals", "js-todo"] {
        let section = summary.section(id).unwrap_or_else(|| panic!("missing {}", id));
        assert!(section.is_warning(), "{}", id);
    }
    let console = summary.section("js-console").unwrap();
    assert_eq!(console.severity, Severity::Info);
    assert!(summary.section("js-eslint-errors").is_none());
    assert!(summary.section("js-success").is_none());
}

#[test]
fn test_markup_fixture_sections() {
    let html = summarize_fixture("sample.html");
    assert!(html.section("html-unclosed").is_some());
    assert!(html.section("html-missing-close").is_some());
    assert_eq!(
        html.section("html-duplicated-ids").unwrap().items,
        vec!["main".to_string()]
    );
    assert!(html.section("html-success").is_none());

    let css = summarize_fixture("sample.css");
    assert_eq!(
        css.section("css-duplicated-selectors").unwrap().items,
        vec![".card".to_string()]
    );
    assert!(css.section("css-unknown-properties").is_some());
    assert!(css.section("css-repeated-properties").is_some());
    assert!(css.section("css-unused-selectors").is_none());
}

#[test]
fn test_generic_fixtures_never_count_issues() {
    for name in ["sample.go", "sample.rb", "sample.php"] {
        let summary = summarize_fixture(name);
        assert_eq!(summary.issues_count, 0, "{}", name);
        let overview = &summary.sections[0];
        assert_eq!(overview.id, "generic-overview");
        assert_eq!(summary.sections.last().unwrap().id, "generic-success");
    }

    let go = summarize_fixture("sample.go");
    let overview = go.section("generic-overview").unwrap();
    assert_eq!(overview.description.as_deref(), Some("Go file"));
    assert!(overview.items.contains(&"Functions detected: 2".to_string()));
}

#[test]
fn test_stamped_summary_keeps_sections() {
    let summary = summarize_fixture("sample.html");
    let stamped = AnalyzeSummary::from(summary.clone());
    assert_eq!(stamped.issues_count, summary.issues_count);
    assert_eq!(stamped.sections, summary.sections);
    assert!(chrono::DateTime::parse_from_rfc3339(&stamped.generated_at).is_ok());
}
