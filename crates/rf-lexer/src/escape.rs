//! Escape sequence extraction for cell text.

use once_cell::sync::Lazy;
use regex::Regex;

static ESCAPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[|=#%&@$\\\s]").expect("escape pattern is valid"));

/// Kind of a segment produced by [`extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Pipe,
    Equals,
    Hash,
    Percent,
    Ampersand,
    At,
    Dollar,
    Whitespace,
    Backslash,
    UnknownText,
}

/// A run of cell text, either one escape sequence or literal text between escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedSegment {
    pub kind: EscapeKind,
    pub text: String,
    /// Character index of the segment within the cell.
    pub start: usize,
}

/// Split raw cell text into escape sequences and literal runs.
pub fn extract(raw: &str) -> Vec<EscapedSegment> {
    let mut segments = Vec::new();
    let mut last_end = 0;
    for found in ESCAPE_PATTERN.find_iter(raw) {
        if found.start() > last_end {
            segments.push(EscapedSegment {
                kind: EscapeKind::UnknownText,
                text: raw[last_end..found.start()].to_string(),
                start: char_index(raw, last_end),
            });
        }
        segments.push(EscapedSegment {
            kind: kind_of(found.as_str()),
            text: found.as_str().to_string(),
            start: char_index(raw, found.start()),
        });
        last_end = found.end();
    }
    if last_end < raw.len() {
        segments.push(EscapedSegment {
            kind: EscapeKind::UnknownText,
            text: raw[last_end..].to_string(),
            start: char_index(raw, last_end),
        });
    }
    segments
}

/// Resolve escape sequences to the characters they stand for.
pub fn unescape(raw: &str) -> String {
    extract(raw)
        .into_iter()
        .map(|segment| match segment.kind {
            EscapeKind::UnknownText => segment.text,
            _ => segment.text.chars().skip(1).collect(),
        })
        .collect()
}

/// Whether the cell opens a comment: it starts with an unescaped `#`.
pub fn is_comment_start(raw: &str) -> bool {
    raw.trim_start().starts_with('#')
}

/// Whether the character at `index` is escaped by an odd run of backslashes.
pub fn is_escaped(chars: &[char], index: usize) -> bool {
    let mut count = 0;
    let mut i = index;
    while i > 0 && chars[i - 1] == '\\' {
        count += 1;
        i -= 1;
    }
    count % 2 == 1
}

fn kind_of(sequence: &str) -> EscapeKind {
    match sequence.chars().nth(1) {
        Some('|') => EscapeKind::Pipe,
        Some('=') => EscapeKind::Equals,
        Some('#') => EscapeKind::Hash,
        Some('%') => EscapeKind::Percent,
        Some('&') => EscapeKind::Ampersand,
        Some('@') => EscapeKind::At,
        Some('$') => EscapeKind::Dollar,
        Some('\\') => EscapeKind::Backslash,
        Some(c) if c.is_whitespace() => EscapeKind::Whitespace,
        _ => EscapeKind::UnknownText,
    }
}

fn char_index(raw: &str, byte_index: usize) -> usize {
    raw[..byte_index].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(raw: &str) -> Vec<EscapeKind> {
        extract(raw).into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_plain_text_is_single_unknown_segment() {
        assert_eq!(kinds("Log"), vec![EscapeKind::UnknownText]);
    }

    #[test]
    fn test_empty_text_has_no_segments() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_every_escape_kind() {
        assert_eq!(
            kinds(r"\|\=\#\%\&\@\$\ \\"),
            vec![
                EscapeKind::Pipe,
                EscapeKind::Equals,
                EscapeKind::Hash,
                EscapeKind::Percent,
                EscapeKind::Ampersand,
                EscapeKind::At,
                EscapeKind::Dollar,
                EscapeKind::Whitespace,
                EscapeKind::Backslash,
            ]
        );
    }

    #[test]
    fn test_literal_runs_between_escapes() {
        let segments = extract(r"ab\#cd");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "ab");
        assert_eq!(segments[1].text, r"\#");
        assert_eq!(segments[1].start, 2);
        assert_eq!(segments[2].text, "cd");
        assert_eq!(segments[2].start, 4);
    }

    #[test]
    fn test_unknown_escape_stays_literal() {
        assert_eq!(kinds(r"\n"), vec![EscapeKind::UnknownText]);
        assert_eq!(unescape(r"\n"), r"\n");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"key\=value"), "key=value");
        assert_eq!(unescape(r"\#not comment"), "#not comment");
        assert_eq!(unescape(r"a\\b"), r"a\b");
    }

    #[test]
    fn test_comment_start() {
        assert!(is_comment_start("# comment"));
        assert!(!is_comment_start(r"\# literal"));
        assert!(!is_comment_start("Log"));
    }

    #[test]
    fn test_is_escaped_counts_backslashes() {
        let chars: Vec<char> = r"a\ b\\ c".chars().collect();
        assert!(is_escaped(&chars, 2));
        assert!(!is_escaped(&chars, 6));
    }
}
