//! Line and text helpers shared by every language pass.
//!
//! All analyzers work on newline-normalized text so that reported line
//! numbers are the 1-based position in the `\n`-split source, whatever
//! line endings the input used.

use std::borrow::Cow;

/// Width a tab counts for when measuring indentation.
pub const TAB_WIDTH: usize = 4;

/// Replace `\r\n` and lone `\r` line endings with `\n`.
pub fn normalize_line_endings(source: &str) -> Cow<'_, str> {
    if !source.contains('\r') {
        return Cow::Borrowed(source);
    }
    Cow::Owned(source.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Split normalized text into lines.
///
/// A trailing newline yields a final empty line, so an empty string is one
/// (empty) line and `"a\n"` is two.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Leading whitespace width of a line, counting tabs as [`TAB_WIDTH`].
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// 1-based line number of a byte offset in normalized text.
pub fn line_at_offset(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Line comment marker used when masking code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `# comment`
    Hash,
    /// `// comment`
    DoubleSlash,
}

/// Blank out string-literal contents and trailing line comments.
///
/// Quote characters are kept, everything between them (and everything from
/// the comment marker on) becomes a space. The result has the same number of
/// characters as the input, so identifier scans on the masked line never see
/// words that only live inside strings or comments.
pub fn mask_strings_and_comments(line: &str, style: CommentStyle) -> String {
    LineMasker::new(style).mask(line)
}

/// Line masker that carries `/* ... */` comments from one line to the next.
///
/// With [`CommentStyle::DoubleSlash`] it also blanks block comments and
/// regex literals (`/.../`), so quotes inside them never open a string.
#[derive(Debug, Clone)]
pub struct LineMasker {
    style: CommentStyle,
    in_block_comment: bool,
}

/// Characters after which a `/` starts a regex literal rather than a division.
fn regex_may_follow(prev: Option<char>) -> bool {
    matches!(
        prev,
        None | Some('(' | '=' | ',' | ':' | '[' | '!' | '&' | '|' | '?' | '{' | '}' | ';')
    )
}

impl LineMasker {
    pub fn new(style: CommentStyle) -> Self {
        Self {
            style,
            in_block_comment: false,
        }
    }

    /// Mask one line; block comment state carries over to the next call.
    pub fn mask(&mut self, line: &str) -> String {
        let slashes = self.style == CommentStyle::DoubleSlash;
        let chars: Vec<char> = line.chars().collect();
        let mut out = String::with_capacity(line.len());
        let mut quote: Option<char> = None;
        let mut regex = false;
        let mut in_class = false;
        let mut escaped = false;
        // Last code character emitted outside strings and comments
        let mut prev: Option<char> = None;
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            let next = chars.get(i + 1).copied();

            if self.in_block_comment {
                if ch == '*' && next == Some('/') {
                    self.in_block_comment = false;
                    out.push_str("  ");
                    i += 2;
                } else {
                    out.push(' ');
                    i += 1;
                }
                continue;
            }

            if quote.is_some() || regex {
                let closer = quote.unwrap_or('/');
                if escaped {
                    escaped = false;
                    out.push(' ');
                } else if ch == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if regex && ch == '[' {
                    in_class = true;
                    out.push(' ');
                } else if regex && in_class && ch == ']' {
                    in_class = false;
                    out.push(' ');
                } else if ch == closer && !in_class {
                    quote = None;
                    regex = false;
                    prev = Some(ch);
                    out.push(ch);
                } else {
                    out.push(' ');
                }
                i += 1;
                continue;
            }

            let starts_comment = match self.style {
                CommentStyle::Hash => ch == '#',
                CommentStyle::DoubleSlash => ch == '/' && next == Some('/'),
            };
            if starts_comment {
                out.extend(std::iter::repeat(' ').take(chars.len() - i));
                break;
            }

            if slashes && ch == '/' && next == Some('*') {
                self.in_block_comment = true;
                out.push_str("  ");
                i += 2;
                continue;
            }

            if slashes && ch == '/' && regex_may_follow(prev) {
                regex = true;
            } else if ch == '"' || ch == '\'' || (ch == '`' && slashes) {
                quote = Some(ch);
            }
            if !ch.is_whitespace() {
                prev = Some(ch);
            }
            out.push(ch);
            i += 1;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert!(matches!(normalize_line_endings("plain\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_split_lines_keeps_trailing_empty_line() {
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("def f():"), 0);
        assert_eq!(indent_width("    return 1"), 4);
        assert_eq!(indent_width("\treturn 1"), 4);
        assert_eq!(indent_width("\t  x"), 6);
        assert_eq!(indent_width("   "), 3);
    }

    #[test]
    fn test_line_at_offset() {
        let text = "a\nbb\nccc";
        assert_eq!(line_at_offset(text, 0), 1);
        assert_eq!(line_at_offset(text, 2), 2);
        assert_eq!(line_at_offset(text, 5), 3);
        assert_eq!(line_at_offset(text, 999), 3);
    }

    #[test]
    fn test_mask_strings_and_comments() {
        let masked = mask_strings_and_comments(r#"x = "hello world"  # note"#, CommentStyle::Hash);
        assert!(!masked.contains("hello"));
        assert!(!masked.contains("note"));
        assert!(masked.starts_with("x = \""));
        assert_eq!(masked.chars().count(), r#"x = "hello world"  # note"#.chars().count());

        let masked = mask_strings_and_comments(r#"a("it\"s") // call"#, CommentStyle::DoubleSlash);
        assert!(masked.starts_with("a(\""));
        assert!(!masked.contains("call"));
        assert!(!masked.contains('s'));

        // Comment markers inside strings are not comments
        let masked = mask_strings_and_comments("url = 'http://x' + y", CommentStyle::DoubleSlash);
        assert!(masked.ends_with("+ y"));
    }

    #[test]
    fn test_quotes_in_block_comments_and_regex_literals() {
        let masked = mask_strings_and_comments("/* don't */ function f() {", CommentStyle::DoubleSlash);
        assert_eq!(masked.trim_start(), "function f() {");

        let masked = mask_strings_and_comments("if (s.match(/'/)) {", CommentStyle::DoubleSlash);
        assert_eq!(masked, "if (s.match(/ /)) {");

        let masked = mask_strings_and_comments("x = /[/']/g.test(y);", CommentStyle::DoubleSlash);
        assert!(masked.ends_with("/g.test(y);"), "got {:?}", masked);

        // Division is not a regex literal
        let masked = mask_strings_and_comments("z = a / b / 'c';", CommentStyle::DoubleSlash);
        assert_eq!(masked, "z = a / b / ' ';");
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let mut masker = LineMasker::new(CommentStyle::DoubleSlash);
        assert_eq!(masker.mask("a(); /* it's").trim_end(), "a();");
        assert_eq!(masker.mask(" * don't */ b();").trim_start(), "b();");
        assert_eq!(masker.mask("c('x');"), "c(' ');");
    }

    #[test]
    fn test_hash_style_ignores_slashes() {
        let masked = mask_strings_and_comments("x = a / b  # it's", CommentStyle::Hash);
        assert_eq!(masked.trim_end(), "x = a / b");
    }
}
