use std::rc::Rc;

use crate::token::{FilePosition, TokenRef, TokenType};

/// How a separator splits cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeparatorType {
    /// Two or more spaces, or any whitespace run containing a tab.
    TabulatorOrDoubleSpace,
    /// ` | ` delimited cells.
    Pipe,
}

/// A cell boundary within a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Separator {
    pub kind: SeparatorType,
    pub text: String,
    pub position: FilePosition,
}

/// One element of a line: a token or a separator.
#[derive(Debug, Clone)]
pub enum LineElement {
    Token(TokenRef),
    Separator(Separator),
}

impl LineElement {
    pub fn text(&self) -> String {
        match self {
            LineElement::Token(token) => token.borrow().text().to_string(),
            LineElement::Separator(separator) => separator.text.clone(),
        }
    }

    pub fn as_token(&self) -> Option<&TokenRef> {
        match self {
            LineElement::Token(token) => Some(token),
            LineElement::Separator(_) => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, LineElement::Separator(_))
    }

    pub fn is_pretty_align(&self) -> bool {
        match self {
            LineElement::Token(token) => token.borrow().has_type(TokenType::PrettyAlignSpace),
            LineElement::Separator(_) => false,
        }
    }
}

/// End-of-line marker as found in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfLine {
    Lf,
    CrLf,
    Cr,
    /// Last line without a trailing newline.
    None,
}

impl EndOfLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndOfLine::Lf => "\n",
            EndOfLine::CrLf => "\r\n",
            EndOfLine::Cr => "\r",
            EndOfLine::None => "",
        }
    }
}

/// A physical source line: its elements and end-of-line marker.
#[derive(Debug, Clone)]
pub struct RobotLine {
    /// 1-based line number.
    pub number: usize,
    pub elements: Vec<LineElement>,
    pub eol: EndOfLine,
}

impl RobotLine {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            elements: Vec::new(),
            eol: EndOfLine::None,
        }
    }

    pub fn push(&mut self, element: LineElement) {
        self.elements.push(element);
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenRef> {
        self.elements.iter().filter_map(LineElement::as_token)
    }

    /// Tokens that are cells, i.e. not pretty-align whitespace.
    pub fn cell_tokens(&self) -> impl Iterator<Item = &TokenRef> {
        self.tokens()
            .filter(|t| !t.borrow().has_type(TokenType::PrettyAlignSpace))
    }

    /// Style of the first separator on the line.
    pub fn separator_style(&self) -> Option<SeparatorType> {
        self.elements.iter().find_map(|e| match e {
            LineElement::Separator(s) => Some(s.kind),
            LineElement::Token(_) => None,
        })
    }

    /// Exact text of the line including its end-of-line marker.
    pub fn raw_text(&self) -> String {
        let mut text: String = self.elements.iter().map(LineElement::text).collect();
        text.push_str(self.eol.as_str());
        text
    }

    pub fn index_of_token(&self, token: &TokenRef) -> Option<usize> {
        self.elements.iter().position(|e| match e {
            LineElement::Token(t) => Rc::ptr_eq(t, token),
            LineElement::Separator(_) => false,
        })
    }

    /// A token is commented when a hash comment starts before it on the same line.
    pub fn is_commented(&self, token: &TokenRef) -> bool {
        let Some(index) = self.index_of_token(token) else {
            return false;
        };
        self.elements[..index]
            .iter()
            .filter_map(LineElement::as_token)
            .any(|t| t.borrow().has_type(TokenType::StartHashComment))
    }

    /// Whether the line carries no cells at all.
    pub fn is_blank(&self) -> bool {
        self.cell_tokens()
            .all(|t| t.borrow().has_type(TokenType::EmptyLine))
    }
}
