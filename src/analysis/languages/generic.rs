//! Fallback pass for languages without dedicated rules (Ruby, PHP, Go).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::{Language, NameSet};
use crate::text::{normalize_line_endings, split_lines};

pub const NO_FUNCTIONS_NOTICE: &str = "No functions detected (simple heuristic).";
pub const NO_COMMENTS_NOTICE: &str = "No comments found.";

lazy_static! {
    static ref RUBY_FUNCTION_RE: Regex = Regex::new(r"\bdef\s+([a-zA-Z0-9_!?]+)").unwrap();
    static ref PHP_FUNCTION_RE: Regex = Regex::new(r"\bfunction\s+([a-zA-Z0-9_]+)").unwrap();
    static ref GO_FUNCTION_RE: Regex =
        Regex::new(r"\bfunc\s+(?:\([^)]*\)\s*)?([A-Za-z0-9_]+)").unwrap();

    static ref RUBY_COMMENT_RE: Regex = Regex::new(r"#").unwrap();
    static ref PHP_COMMENT_RE: Regex = Regex::new(r"//|#|/\*.*?\*/").unwrap();
    static ref GO_COMMENT_RE: Regex = Regex::new(r"//|/\*.*?\*/").unwrap();
}

/// Basic statistics for a fallback language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericAnalysis {
    pub language: Language,
    pub lines: usize,
    /// Unique function names in first-seen order.
    pub functions: Vec<String>,
    /// Lines matching the language's comment pattern.
    pub comments: usize,
    /// Informational notices.
    pub info: Vec<String>,
}

fn patterns(language: Language) -> Option<(&'static Regex, &'static Regex)> {
    match language {
        Language::Rb => Some((&*RUBY_FUNCTION_RE, &*RUBY_COMMENT_RE)),
        Language::Php => Some((&*PHP_FUNCTION_RE, &*PHP_COMMENT_RE)),
        Language::Go => Some((&*GO_FUNCTION_RE, &*GO_COMMENT_RE)),
        _ => None,
    }
}

/// Count lines, function-like declarations and comment lines.
///
/// Languages with a dedicated pass get line counts only.
pub fn analyze(source: &str, language: Language) -> GenericAnalysis {
    let text = normalize_line_endings(source);
    let lines = split_lines(&text);

    let mut functions = NameSet::new();
    let mut comments = 0;
    if let Some((function_re, comment_re)) = patterns(language) {
        for line in &lines {
            for caps in function_re.captures_iter(line) {
                functions.insert(&caps[1]);
            }
            if comment_re.is_match(line) {
                comments += 1;
            }
        }
    }

    let mut info = Vec::new();
    if functions.is_empty() {
        info.push(NO_FUNCTIONS_NOTICE.to_string());
    }
    if comments == 0 {
        info.push(NO_COMMENTS_NOTICE.to_string());
    }

    GenericAnalysis {
        language,
        lines: lines.len(),
        functions: functions.into_vec(),
        comments,
        info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruby() {
        let source = "# greeter\ndef hello?\n  puts 'hi'\nend\n\ndef hello?\nend\n";
        let result = analyze(source, Language::Rb);
        assert_eq!(result.lines, 8);
        assert_eq!(result.functions, vec!["hello?".to_string()]);
        assert_eq!(result.comments, 1);
        assert!(result.info.is_empty());
    }

    #[test]
    fn test_php() {
        let source = "<?php\n/* block */\nfunction render($x) {\n  return $x; // done\n}\n";
        let result = analyze(source, Language::Php);
        assert_eq!(result.functions, vec!["render".to_string()]);
        assert_eq!(result.comments, 2);
    }

    #[test]
    fn test_go_methods_and_functions() {
        let source = "package main\n\nfunc (s *Server) Start() error {\n\treturn nil\n}\n\nfunc main() {}\n";
        let result = analyze(source, Language::Go);
        assert_eq!(result.functions, vec!["Start".to_string(), "main".to_string()]);
        assert_eq!(result.comments, 0);
        assert_eq!(result.info, vec![NO_COMMENTS_NOTICE.to_string()]);
    }

    #[test]
    fn test_empty_input() {
        let result = analyze("", Language::Go);
        assert_eq!(result.lines, 1);
        assert_eq!(
            result.info,
            vec![NO_FUNCTIONS_NOTICE.to_string(), NO_COMMENTS_NOTICE.to_string()]
        );
    }
}
