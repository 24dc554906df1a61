use crate::escape::is_escaped;
use crate::line::{EndOfLine, SeparatorType};
use crate::token::FilePosition;
use crate::LexerError;

const BOM: char = '\u{feff}';

/// Cell splitting rules of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceDialect {
    /// `.robot`, `.txt` and `.resource`: whitespace runs or pipes separate cells.
    #[default]
    Text,
    /// `.tsv`: every tab separates cells.
    Tsv,
}

/// What a fragment of a line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Cell,
    Separator(SeparatorType),
    /// Whitespace kept for visual alignment only.
    PrettyAlign,
}

/// A raw, unclassified piece of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
    pub position: FilePosition,
}

/// One source line split into fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedLine {
    /// 1-based line number.
    pub number: usize,
    pub fragments: Vec<Fragment>,
    pub eol: EndOfLine,
}

/// Result of scanning a whole source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedSource {
    pub has_bom: bool,
    pub lines: Vec<ScannedLine>,
}

/// Splits Robot Framework source into lines and cell fragments.
///
/// Works on a `Vec<char>` so columns and offsets are character based.
/// Concatenating the fragments and end-of-line markers of every line gives
/// back the input without its BOM.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    dialect: SourceDialect,
    has_bom: bool,
    lines: Vec<ScannedLine>,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str, dialect: SourceDialect) -> Self {
        let (has_bom, text) = match source.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            dialect,
            has_bom,
            lines: Vec::new(),
        }
    }

    /// Scan the entire source into lines.
    pub fn scan(source: &str, dialect: SourceDialect) -> ScannedSource {
        let mut scanner = Scanner::new(source, dialect);
        scanner.scan_lines();
        ScannedSource {
            has_bom: scanner.has_bom,
            lines: scanner.lines,
        }
    }

    /// Decode raw file content, reporting where invalid UTF-8 starts.
    pub fn decode(bytes: &[u8]) -> Result<String, LexerError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(err) => {
                let valid = String::from_utf8_lossy(&bytes[..err.valid_up_to()]);
                let line = valid.matches('\n').count() + 1;
                let column = valid
                    .rsplit('\n')
                    .next()
                    .map(|last| last.chars().count())
                    .unwrap_or(0);
                Err(LexerError {
                    message: "invalid UTF-8 sequence".to_string(),
                    line,
                    column,
                })
            }
        }
    }

    fn scan_lines(&mut self) {
        while !self.is_at_end() {
            self.scan_line();
        }
    }

    fn scan_line(&mut self) {
        let start = self.pos;
        while !self.is_at_end() && self.peek() != '\n' && self.peek() != '\r' {
            self.advance();
        }
        let end = self.pos;
        let eol = self.scan_end_of_line();

        let content: Vec<char> = self.chars[start..end].to_vec();
        let fragments = self.split(&content, start);
        self.lines.push(ScannedLine {
            number: self.line,
            fragments,
            eol,
        });
        self.line += 1;
    }

    fn scan_end_of_line(&mut self) -> EndOfLine {
        match self.peek() {
            '\r' => {
                self.advance();
                if self.peek() == '\n' {
                    self.advance();
                    EndOfLine::CrLf
                } else {
                    EndOfLine::Cr
                }
            }
            '\n' => {
                self.advance();
                EndOfLine::Lf
            }
            _ => EndOfLine::None,
        }
    }

    // --- Splitting ---

    fn split(&self, content: &[char], offset: usize) -> Vec<Fragment> {
        let mut out = FragmentSink::new(self.line, offset);
        if content.is_empty() {
            return out.fragments;
        }
        if content.iter().all(|c| is_whitespace(*c)) {
            out.push(FragmentKind::PrettyAlign, content, 0);
            return out.fragments;
        }
        if starts_pipe_line(content) {
            split_pipes(content, &mut out);
        } else if self.dialect == SourceDialect::Tsv {
            split_tabs(content, &mut out);
        } else {
            split_whitespace(content, &mut out);
        }
        out.fragments
    }

    // --- Helpers ---

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

struct FragmentSink {
    line: usize,
    offset: usize,
    fragments: Vec<Fragment>,
}

impl FragmentSink {
    fn new(line: usize, offset: usize) -> Self {
        Self {
            line,
            offset,
            fragments: Vec::new(),
        }
    }

    fn push(&mut self, kind: FragmentKind, text: &[char], column: usize) {
        self.fragments.push(Fragment {
            kind,
            text: text.iter().collect(),
            position: FilePosition::new(self.line, column, self.offset + column),
        });
    }

    /// Push a cell, moving its surrounding whitespace into pretty-align fragments.
    fn push_padded_cell(&mut self, content: &[char], start: usize, end: usize) {
        let mut cell_start = start;
        while cell_start < end && is_whitespace(content[cell_start]) {
            cell_start += 1;
        }
        let mut cell_end = end;
        while cell_end > cell_start
            && is_whitespace(content[cell_end - 1])
            && !is_escaped(content, cell_end - 1)
        {
            cell_end -= 1;
        }
        if cell_start > start {
            self.push(FragmentKind::PrettyAlign, &content[start..cell_start], start);
        }
        self.push(FragmentKind::Cell, &content[cell_start..cell_end], cell_start);
        if end > cell_end {
            self.push(FragmentKind::PrettyAlign, &content[cell_end..end], cell_end);
        }
    }
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn starts_pipe_line(content: &[char]) -> bool {
    content.first() == Some(&'|') && content.get(1).map_or(true, |c| is_whitespace(*c))
}

fn split_whitespace(content: &[char], out: &mut FragmentSink) {
    let n = content.len();
    let mut i = 0;
    let mut cell_start: Option<usize> = None;
    while i < n {
        let mut j = i;
        while j < n && is_whitespace(content[j]) {
            j += 1;
        }
        let run = &content[i..j];
        let is_separator = run.len() >= 2 || run.contains(&'\t');
        // Only a lone space can be escaped; longer runs and tabs always split.
        if !run.is_empty() && (is_separator || !is_escaped(content, i)) {
            if !is_separator && cell_start.is_some() && j < n {
                i = j;
                continue;
            }
            if let Some(start) = cell_start.take() {
                out.push(FragmentKind::Cell, &content[start..i], start);
            }
            let kind = if is_separator {
                FragmentKind::Separator(SeparatorType::TabulatorOrDoubleSpace)
            } else {
                FragmentKind::PrettyAlign
            };
            out.push(kind, run, i);
            i = j;
        } else {
            if cell_start.is_none() {
                cell_start = Some(i);
            }
            i += 1;
        }
    }
    if let Some(start) = cell_start {
        out.push(FragmentKind::Cell, &content[start..n], start);
    }
}

fn split_pipes(content: &[char], out: &mut FragmentSink) {
    let n = content.len();
    let pipes: Vec<usize> = (0..n)
        .filter(|&q| {
            content[q] == '|'
                && !is_escaped(content, q)
                && (q == 0 || is_whitespace(content[q - 1]))
                && (q + 1 == n || is_whitespace(content[q + 1]))
        })
        .collect();

    let mut previous_end = 0;
    for (index, &q) in pipes.iter().enumerate() {
        let start = if q > previous_end && is_whitespace(content[q - 1]) {
            q - 1
        } else {
            q
        };
        let end = if q + 1 < n && is_whitespace(content[q + 1]) {
            q + 2
        } else {
            q + 1
        };
        if index > 0 {
            if start > previous_end {
                out.push_padded_cell(content, previous_end, start);
            } else {
                out.push(FragmentKind::Cell, &[], start);
            }
        }
        out.push(
            FragmentKind::Separator(SeparatorType::Pipe),
            &content[start..end],
            start,
        );
        previous_end = end;
    }
    if previous_end < n {
        if content[previous_end..].iter().all(|c| is_whitespace(*c)) {
            out.push(FragmentKind::PrettyAlign, &content[previous_end..], previous_end);
        } else {
            out.push_padded_cell(content, previous_end, n);
        }
    }
}

fn split_tabs(content: &[char], out: &mut FragmentSink) {
    let n = content.len();
    let mut cell_start = 0;
    for i in 0..n {
        if content[i] == '\t' {
            out.push(FragmentKind::Cell, &content[cell_start..i], cell_start);
            out.push(
                FragmentKind::Separator(SeparatorType::TabulatorOrDoubleSpace),
                &content[i..i + 1],
                i,
            );
            cell_start = i + 1;
        }
    }
    if cell_start < n {
        out.push(FragmentKind::Cell, &content[cell_start..n], cell_start);
    }
}
