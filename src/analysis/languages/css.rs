//! CSS analysis pass.
//!
//! Single-level `selector { declarations }` blocks are pulled out with a
//! regex; nested braces and at-rule bodies are not understood, only the
//! innermost plain blocks are seen.

use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use phf::phf_set;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::NameSet;
use crate::text::{line_at_offset, normalize_line_endings};

/// Properties accepted without an "unknown property" finding.
static KNOWN_PROPERTIES: phf::Set<&'static str> = phf_set! {
    "color", "background", "background-color", "font-size", "font-family",
    "margin", "padding", "border", "border-radius", "width", "height",
    "display", "position", "top", "left", "right", "bottom", "text-align",
    "line-height", "list-style-type", "max-width", "min-width", "max-height",
    "min-height", "overflow", "z-index", "box-shadow", "opacity", "transition",
    "cursor", "float", "clear", "padding-left", "flex", "flex-direction",
    "justify-content", "align-items", "gap",
};

lazy_static! {
    static ref COMMENT_RE: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref BLOCK_RE: Regex = Regex::new(r"([^{}]+)\{([^{}]*)\}").unwrap();
    static ref SIMPLE_SELECTOR_RE: Regex = Regex::new(r"^[.#]?[A-Za-z_][\w-]*$").unwrap();
    static ref SELECTOR_NAME_RE: Regex = Regex::new(r"^[.#]([\w-]+)").unwrap();
    static ref CLASS_ATTR_RE: Regex = Regex::new(r#"class="([^"]+)""#).unwrap();
    static ref ID_ATTR_RE: Regex = Regex::new(r#"id="([^"]+)""#).unwrap();
}

/// A declaration-level finding inside one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssPropertyIssue {
    pub selector: String,
    pub line: usize,
    pub property: String,
}

/// Result of the CSS pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssAnalysis {
    /// Selector of every block, in source order (repeats included).
    pub selectors: Vec<String>,
    /// Header lines of every block, per selector.
    pub selector_lines: BTreeMap<String, Vec<usize>>,
    pub duplicated_selectors: Vec<String>,
    pub invalid_selectors: Vec<String>,
    /// Declarations without a `:`.
    pub invalid_properties: Vec<CssPropertyIssue>,
    pub repeated_properties: Vec<CssPropertyIssue>,
    pub unknown_properties: Vec<CssPropertyIssue>,
    /// Only populated when a companion HTML document is supplied.
    pub unused_selectors: Vec<String>,
}

/// Analyze CSS source text on its own.
pub fn analyze(source: &str) -> CssAnalysis {
    analyze_with_html(source, None)
}

/// Analyze CSS source text, checking class and id selectors against `html`.
pub fn analyze_with_html(source: &str, html: Option<&str>) -> CssAnalysis {
    let text = normalize_line_endings(source);
    let text = blank_comments(&text);

    let mut analysis = CssAnalysis::default();

    for caps in BLOCK_RE.captures_iter(&text) {
        let (Some(head), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };

        // Drop statements such as `@import ...;` that precede the selector
        let head_text = head.as_str();
        let head_start = head.start() + head_text.rfind(';').map_or(0, |pos| pos + 1);
        let raw_selector = &text[head_start..head.end()];
        let selector = raw_selector.trim();
        if selector.is_empty() {
            continue;
        }
        let selector_offset = head_start + (raw_selector.len() - raw_selector.trim_start().len());
        let header_line = line_at_offset(&text, selector_offset);

        analysis.selectors.push(selector.to_string());
        analysis
            .selector_lines
            .entry(selector.to_string())
            .or_default()
            .push(header_line);

        check_declarations(&mut analysis, &text, selector, body.start(), body.as_str());
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for selector in &analysis.selectors {
        *counts.entry(selector.as_str()).or_insert(0) += 1;
    }
    let mut duplicated = NameSet::new();
    let mut invalid = NameSet::new();
    for selector in &analysis.selectors {
        if counts.get(selector.as_str()).copied().unwrap_or(0) > 1 {
            duplicated.insert(selector);
        }
        if !SIMPLE_SELECTOR_RE.is_match(selector) {
            invalid.insert(selector);
        }
    }
    analysis.duplicated_selectors = duplicated.into_vec();
    analysis.invalid_selectors = invalid.into_vec();

    if let Some(html) = html {
        analysis.unused_selectors = unused_selectors(&analysis.selectors, html);
    }

    analysis
}

fn check_declarations(
    analysis: &mut CssAnalysis,
    text: &str,
    selector: &str,
    body_start: usize,
    body: &str,
) {
    let first_line = line_at_offset(text, body_start);
    let mut seen = HashSet::new();

    for (offset, raw_line) in body.split('\n').enumerate() {
        let line = first_line + offset;
        for declaration in raw_line.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let issue = |property: &str| CssPropertyIssue {
                selector: selector.to_string(),
                line,
                property: property.to_string(),
            };

            let Some((name, _value)) = declaration.split_once(':') else {
                analysis.invalid_properties.push(issue(declaration));
                continue;
            };
            let property = name.trim();

            if !seen.insert(property.to_string()) {
                analysis.repeated_properties.push(issue(property));
            }
            // Custom properties are user-defined
            if !property.starts_with("--") && !KNOWN_PROPERTIES.contains(property) {
                analysis.unknown_properties.push(issue(property));
            }
        }
    }
}

/// Replace `/* ... */` comments with spaces, keeping newlines so offsets
/// still map to the right lines.
fn blank_comments(text: &str) -> String {
    COMMENT_RE
        .replace_all(text, |caps: &regex::Captures| {
            caps[0]
                .chars()
                .map(|c| if c == '\n' { '\n' } else { ' ' })
                .collect::<String>()
        })
        .into_owned()
}

/// Class and id selectors whose name never appears in the HTML.
///
/// Bare element selectors are never reported.
fn unused_selectors(selectors: &[String], html: &str) -> Vec<String> {
    let classes: HashSet<&str> = CLASS_ATTR_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .flat_map(|m| m.as_str().split_whitespace())
        .collect();
    let ids: HashSet<&str> = ID_ATTR_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    let mut unused = NameSet::new();
    for selector in selectors {
        let Some(name) = SELECTOR_NAME_RE.captures(selector).and_then(|caps| caps.get(1)) else {
            continue;
        };
        let known = if selector.starts_with('.') {
            classes.contains(name.as_str())
        } else {
            ids.contains(name.as_str())
        };
        if !known {
            unused.insert(selector);
        }
    }
    unused.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicated_selector_reported_once() {
        let result = analyze(".a{color:red}.a{color:blue}");
        assert_eq!(result.selectors, vec![".a".to_string(), ".a".to_string()]);
        assert_eq!(result.duplicated_selectors, vec![".a".to_string()]);
        assert_eq!(result.selector_lines[".a"], vec![1, 1]);
        assert!(result.unknown_properties.is_empty());
    }

    #[test]
    fn test_declaration_findings_have_real_lines() {
        let source = ".box {\n  color: red;\n  colour: blue;\n  color: green;\n  broken\n}\n";
        let result = analyze(source);
        assert_eq!(result.selector_lines[".box"], vec![1]);

        assert_eq!(result.unknown_properties.len(), 1);
        assert_eq!(result.unknown_properties[0].property, "colour");
        assert_eq!(result.unknown_properties[0].line, 3);

        assert_eq!(result.repeated_properties.len(), 1);
        assert_eq!(result.repeated_properties[0].property, "color");
        assert_eq!(result.repeated_properties[0].line, 4);

        assert_eq!(result.invalid_properties.len(), 1);
        assert_eq!(result.invalid_properties[0].property, "broken");
        assert_eq!(result.invalid_properties[0].line, 5);
        assert_eq!(result.invalid_properties[0].selector, ".box");
    }

    #[test]
    fn test_invalid_selectors() {
        let source = "div > p { color: red; }\n#main { margin: 0; }\na:hover { color: blue; }\n";
        let result = analyze(source);
        assert_eq!(result.invalid_selectors, vec!["div > p".to_string(), "a:hover".to_string()]);
        assert_eq!(result.selector_lines["#main"], vec![2]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = "/* header\n   comment */\n.x {\n  /* colr: red; */\n  color: red;\n}\n";
        let result = analyze(source);
        assert_eq!(result.selectors, vec![".x".to_string()]);
        assert_eq!(result.selector_lines[".x"], vec![3]);
        assert!(result.unknown_properties.is_empty());
        assert!(result.invalid_properties.is_empty());
    }

    #[test]
    fn test_unused_selectors_against_html() {
        let css = ".used { color: red; }\n.missing { color: red; }\n#hero { color: red; }\n#gone { color: red; }\np { color: red; }\n";
        let html = "<div class=\"card used\"><p id=\"hero\">x</p></div>";
        let result = analyze_with_html(css, Some(html));
        assert_eq!(result.unused_selectors, vec![".missing".to_string(), "#gone".to_string()]);

        // Without HTML nothing is reported as unused
        assert!(analyze(css).unused_selectors.is_empty());
    }

    #[test]
    fn test_custom_properties_and_at_import() {
        let source = "@import url(base.css);\n:root { --accent: red; }\n.a { color: var(--accent); }\n";
        let result = analyze(source);
        assert_eq!(result.selectors, vec![":root".to_string(), ".a".to_string()]);
        assert!(result.unknown_properties.is_empty());
    }
}
