//! HTML analysis pass.
//!
//! Balanced-tag heuristic over a single open-tag stack. A closing tag
//! removes the most recent open tag with the same name, wherever it sits in
//! the stack, so deeply malformed documents can mis-attribute which tag was
//! left open. This is not a DOM parser.

use std::collections::HashMap;

use lazy_static::lazy_static;
use phf::phf_set;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::{normalize_line_endings, split_lines};

/// Elements that never take a closing tag.
static VOID_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
};

lazy_static! {
    static ref OPEN_TAG_RE: Regex = Regex::new(r"<([a-zA-Z0-9]+)([^>]*)>").unwrap();
    static ref CLOSE_TAG_RE: Regex = Regex::new(r"</([a-zA-Z0-9]+)\s*>").unwrap();
    static ref INCOMPLETE_TAG_RE: Regex = Regex::new(r"<([a-zA-Z0-9]+)[^>]*$").unwrap();
    static ref ID_ATTR_RE: Regex = Regex::new(r#"id="([^"]+)""#).unwrap();
    static ref ALT_ATTR_RE: Regex = Regex::new(r"(?i)\balt\b").unwrap();
    static ref HREF_ATTR_RE: Regex = Regex::new(r"(?i)\bhref\b").unwrap();
}

/// A tag name and the line it appeared on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagLocation {
    pub tag: String,
    pub line: usize,
}

/// Raw tag text and the line it appeared on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSnippet {
    pub snippet: String,
    pub line: usize,
}

/// Result of the HTML pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlAnalysis {
    /// Tags still on the stack at end of input.
    pub unclosed_tags: Vec<TagLocation>,
    /// Closing tags with no matching open tag.
    pub missing_close_tags: Vec<TagLocation>,
    pub incomplete_tags: Vec<TagSnippet>,
    /// `id` values used more than once, in first-seen order.
    pub duplicated_ids: Vec<String>,
    pub imgs_without_alt: Vec<TagSnippet>,
    pub links_without_href: Vec<TagSnippet>,
}

/// Analyze HTML source text.
pub fn analyze(source: &str) -> HtmlAnalysis {
    let text = normalize_line_endings(source);
    let lines = split_lines(&text);

    let mut analysis = HtmlAnalysis {
        duplicated_ids: duplicated_ids(&text),
        ..HtmlAnalysis::default()
    };
    let mut stack: Vec<TagLocation> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;

        for caps in OPEN_TAG_RE.captures_iter(line) {
            let snippet = &caps[0];
            let tag = caps[1].to_ascii_lowercase();
            let self_closing = snippet.ends_with("/>") || caps[2].trim().ends_with('/');

            if tag == "img" && !ALT_ATTR_RE.is_match(snippet) {
                analysis.imgs_without_alt.push(TagSnippet {
                    snippet: snippet.to_string(),
                    line: line_no,
                });
            }
            if tag == "a" && !HREF_ATTR_RE.is_match(snippet) {
                analysis.links_without_href.push(TagSnippet {
                    snippet: snippet.to_string(),
                    line: line_no,
                });
            }

            if VOID_ELEMENTS.contains(tag.as_str()) || self_closing {
                continue;
            }
            stack.push(TagLocation { tag, line: line_no });
        }

        for caps in CLOSE_TAG_RE.captures_iter(line) {
            let tag = caps[1].to_ascii_lowercase();
            match stack.iter().rposition(|open| open.tag == tag) {
                Some(pos) => {
                    stack.remove(pos);
                }
                None => analysis.missing_close_tags.push(TagLocation { tag, line: line_no }),
            }
        }

        let trimmed = line.trim();
        if INCOMPLETE_TAG_RE.is_match(trimmed) {
            analysis.incomplete_tags.push(TagSnippet {
                snippet: trimmed.to_string(),
                line: line_no,
            });
        }
    }

    analysis.unclosed_tags = stack;
    analysis
}

fn duplicated_ids(text: &str) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for caps in ID_ATTR_RE.captures_iter(text) {
        let Some(id) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let count = counts.entry(id).or_insert(0);
        if *count == 0 {
            order.push(id);
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter(|id| counts.get(id).copied().unwrap_or(0) > 1)
        .map(str::to_string)
        .collect()
}
