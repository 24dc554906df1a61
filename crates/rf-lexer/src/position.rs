//! Cell position of a candidate token within its line.

use crate::line::{LineElement, SeparatorType};
use crate::token::{RobotToken, TokenType};

const CONTINUE_MARKER: &str = "...";

/// Layout facts about a line, gathered for the token about to be added.
///
/// The candidate token counts as the last element of the line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionInformation {
    separators: Vec<usize>,
    pretty_aligns: Vec<usize>,
    continues: Vec<usize>,
    robot_tokens: Vec<usize>,
    empty_cells: Vec<usize>,
    style: Option<SeparatorType>,
    is_first_separator: bool,
    was_last_separator: bool,
    starts_with_token: bool,
    element_count: usize,
}

impl PositionInformation {
    /// Classify the elements of a line, followed by an optional candidate token.
    pub fn build(elements: &[LineElement], candidate: Option<&RobotToken>) -> Self {
        let mut info = PositionInformation::default();
        for (index, element) in elements.iter().enumerate() {
            match element {
                LineElement::Separator(separator) => info.add_separator(index, separator.kind),
                LineElement::Token(token) => info.add_token(index, &token.borrow()),
            }
        }
        if let Some(token) = candidate {
            info.add_token(elements.len(), token);
        }
        info
    }

    fn add_separator(&mut self, index: usize, kind: SeparatorType) {
        if self.style.is_none() {
            self.style = Some(kind);
        }
        if index == 0 {
            self.is_first_separator = true;
        }
        self.separators.push(index);
        self.was_last_separator = true;
        self.element_count += 1;
    }

    fn add_token(&mut self, index: usize, token: &RobotToken) {
        if index == 0 {
            self.starts_with_token = true;
        }
        if token.has_type(TokenType::PrettyAlignSpace) {
            self.pretty_aligns.push(index);
        } else if token.has_type(TokenType::PreviousLineContinue) || token.text() == CONTINUE_MARKER {
            self.continues.push(index);
            self.was_last_separator = false;
        } else {
            if token.text().is_empty() {
                self.empty_cells.push(index);
            }
            self.robot_tokens.push(index);
            self.was_last_separator = false;
        }
        self.element_count += 1;
    }

    pub fn separator_style(&self) -> SeparatorType {
        self.style.unwrap_or(SeparatorType::TabulatorOrDoubleSpace)
    }

    /// 1-based cell index of the last element, 0 for an empty line.
    pub fn column_index(&self) -> usize {
        if self.element_count == 0 {
            return 0;
        }
        let separators = self.separators.len();
        match self.separator_style() {
            SeparatorType::Pipe => {
                if self.was_last_separator {
                    separators.saturating_sub(1)
                } else {
                    separators
                }
            }
            SeparatorType::TabulatorOrDoubleSpace => {
                if self.was_last_separator {
                    separators + 1
                } else {
                    self.robot_tokens.len()
                        + self.continues.len()
                        + usize::from(self.is_first_separator)
                }
            }
        }
    }

    /// Whether the candidate sits in the first cell of the line.
    pub fn is_really_first_element(&self) -> bool {
        let single_cell = self.robot_tokens.len() + self.continues.len() == 1;
        match self.separator_style() {
            SeparatorType::Pipe => {
                self.separators.len() == 1 && single_cell && self.is_first_separator
            }
            SeparatorType::TabulatorOrDoubleSpace => {
                self.starts_with_token
                    && single_cell
                    && self.separators.is_empty()
                    && !self.is_first_separator
            }
        }
    }

    /// Whether a `...` marker opens the line.
    ///
    /// In executable tables the marker must be indented: behind exactly one
    /// whitespace separator, or at least two pipes.
    pub fn is_continue_previous_line_first_token(&self, executable_table: bool) -> bool {
        let Some(&first_continue) = self.continues.first() else {
            return false;
        };
        let filled_before = self
            .robot_tokens
            .iter()
            .filter(|t| !self.empty_cells.contains(t))
            .any(|&t| t < first_continue);
        if filled_before {
            return false;
        }
        if !executable_table {
            return true;
        }
        let separators_before = self.separators.iter().filter(|&&s| s < first_continue).count();
        match self.separator_style() {
            SeparatorType::Pipe => separators_before >= 2,
            SeparatorType::TabulatorOrDoubleSpace => separators_before == 1,
        }
    }

    /// A `...` marker that follows real cells on the same line.
    pub fn is_inlined_continue(&self) -> bool {
        match (self.continues.first(), self.robot_tokens.first()) {
            (Some(c), Some(t)) => t < c,
            _ => false,
        }
    }

    pub fn robot_token_count(&self) -> usize {
        self.robot_tokens.len()
    }

    pub fn separator_count(&self) -> usize {
        self.separators.len()
    }

    pub fn pretty_align_count(&self) -> usize {
        self.pretty_aligns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{RobotLine, Separator};
    use crate::scanner::{FragmentKind, Scanner, SourceDialect};
    use crate::token::FilePosition;
    use pretty_assertions::assert_eq;

    /// Helper: scan one line, keep all but the last cell as line elements and
    /// resolve the last cell as the candidate.
    fn info(source: &str) -> PositionInformation {
        let scanned = Scanner::scan(source, SourceDialect::Text);
        let mut line = RobotLine::new(1);
        let mut fragments = scanned.lines[0].fragments.clone();
        let last = fragments.pop().expect("line has a candidate cell");
        for fragment in fragments {
            let element = match fragment.kind {
                FragmentKind::Separator(kind) => LineElement::Separator(Separator {
                    kind,
                    text: fragment.text,
                    position: fragment.position,
                }),
                FragmentKind::PrettyAlign => LineElement::Token(
                    RobotToken::new(fragment.text, TokenType::PrettyAlignSpace, fragment.position)
                        .into_ref(),
                ),
                FragmentKind::Cell => LineElement::Token(
                    RobotToken::new(fragment.text, TokenType::Unknown, fragment.position)
                        .into_ref(),
                ),
            };
            line.push(element);
        }
        let candidate = RobotToken::new(last.text, TokenType::Unknown, FilePosition::new(1, 0, 0));
        PositionInformation::build(&line.elements, Some(&candidate))
    }

    // =========================================================================
    // Column index
    // =========================================================================

    #[test]
    fn test_column_index_whitespace() {
        assert_eq!(info("Log").column_index(), 1);
        assert_eq!(info("    Log").column_index(), 2);
        assert_eq!(info("Log    arg").column_index(), 2);
        assert_eq!(info("    Log    arg").column_index(), 3);
    }

    #[test]
    fn test_column_index_pipes() {
        assert_eq!(info("| Log").column_index(), 1);
        assert_eq!(info("| | Log").column_index(), 2);
        assert_eq!(info("| | Log | arg").column_index(), 3);
    }

    #[test]
    fn test_pretty_align_is_not_a_column() {
        assert_eq!(info(" Log").column_index(), 1);
    }

    #[test]
    fn test_empty_line_has_column_zero() {
        assert_eq!(PositionInformation::build(&[], None).column_index(), 0);
    }

    // =========================================================================
    // First element
    // =========================================================================

    #[test]
    fn test_really_first_element() {
        assert!(info("Name").is_really_first_element());
        assert!(info(" Name").is_really_first_element());
        assert!(!info("    Log").is_really_first_element());
        assert!(!info("Name    Log").is_really_first_element());
        assert!(info("| Name").is_really_first_element());
        assert!(!info("| | Log").is_really_first_element());
    }

    // =========================================================================
    // Continuation markers
    // =========================================================================

    #[test]
    fn test_continue_marker_in_executable_table() {
        assert!(info("    ...").is_continue_previous_line_first_token(true));
        assert!(!info("...").is_continue_previous_line_first_token(true));
        assert!(info("| | ...").is_continue_previous_line_first_token(true));
        assert!(!info("| ...").is_continue_previous_line_first_token(true));
    }

    #[test]
    fn test_continue_marker_in_settings_table() {
        assert!(info("...").is_continue_previous_line_first_token(false));
        assert!(!info("Log    ...").is_continue_previous_line_first_token(false));
        assert!(info("Log    ...").is_inlined_continue());
    }
}
