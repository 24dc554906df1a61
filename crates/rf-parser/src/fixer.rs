//! Normalization of holder bodies after mapping.
//!
//! Mapping produces one element per line. This pass merges `...`
//! continuation rows into the row they continue and marks the body rows of
//! FOR loops, so every holder ends up with a clean list of executable rows.

use rf_lexer::{TokenRef, TokenType};

use crate::model::executables::{is_end_text, is_new_style_for_text};
use crate::model::{ExecutableElement, ExecutableHolder, ModelElement, RobotExecutableRow, RowType};

/// A holder element the fixer cannot describe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Fixer error in {path} at line {line}, column {column}: {message}")]
pub struct FixerError {
    pub path: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// What the fixer needs to know about one element.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Descriptor {
    row_type: RowType,
    continues_previous: bool,
    misplaced_arguments: bool,
}

/// An open FOR loop while walking the body.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ForWindow {
    /// `FOR ... END`, with the current nesting depth.
    WithEnd { depth: usize },
    /// `:FOR` whose body rows start with `\`.
    Legacy { last_body: Option<usize> },
}

/// Post-processing pass over holder bodies.
pub struct ExecutableUnitFixer {
    tsv: bool,
}

impl ExecutableUnitFixer {
    pub fn new(tsv: bool) -> Self {
        Self { tsv }
    }

    /// Fix the body of one holder in place.
    pub fn fix(&self, path: &str, holder: &mut ExecutableHolder) -> Result<(), FixerError> {
        let elements = holder.take_elements();
        let descriptors = elements
            .iter()
            .map(|e| describe(path, holder, e))
            .collect::<Result<Vec<_>, _>>()?;

        let mut output: Vec<ExecutableElement> = Vec::with_capacity(elements.len());
        // Per output element: `Some(with_end)` when it is a loop body row.
        let mut body: Vec<Option<bool>> = Vec::with_capacity(elements.len());
        let mut window: Option<ForWindow> = None;

        for (element, descriptor) in elements.into_iter().zip(descriptors) {
            if descriptor.continues_previous {
                if let ExecutableElement::Row(row) = element {
                    if let Some(row) = merge_continuation(&mut output, row) {
                        output.push(ExecutableElement::Row(row));
                        body.push(None);
                    }
                }
                continue;
            }
            if self.tsv && descriptor.misplaced_arguments {
                if let ExecutableElement::Row(row) = element {
                    if let Some(row) = merge_backward(&mut output, row) {
                        output.push(ExecutableElement::Row(row));
                        body.push(None);
                    }
                }
                continue;
            }

            let index = output.len();
            let (in_body, next) = match (window, descriptor.row_type) {
                (Some(ForWindow::WithEnd { depth }), RowType::For) if is_new_style(&element) => {
                    (Some(true), Some(ForWindow::WithEnd { depth: depth + 1 }))
                }
                (Some(ForWindow::WithEnd { depth }), RowType::Simple) if is_end(&element) => {
                    if depth == 1 {
                        (None, None)
                    } else {
                        (Some(true), Some(ForWindow::WithEnd { depth: depth - 1 }))
                    }
                }
                (Some(ForWindow::WithEnd { .. }), RowType::For)
                | (Some(ForWindow::WithEnd { .. }), RowType::Simple)
                | (Some(ForWindow::WithEnd { .. }), RowType::ForContinue)
                | (Some(ForWindow::WithEnd { .. }), RowType::CommentedHash) => (Some(true), window),
                (Some(ForWindow::Legacy { last_body }), RowType::ForContinue) => {
                    if let Some(last) = last_body {
                        mark_comments_between(&output, &mut body, last, index);
                    }
                    (Some(false), Some(ForWindow::Legacy { last_body: Some(index) }))
                }
                (Some(ForWindow::Legacy { .. }), RowType::CommentedHash)
                | (Some(ForWindow::Legacy { .. }), RowType::Empty)
                | (_, RowType::Setting)
                | (Some(ForWindow::WithEnd { .. }), RowType::Empty) => (None, window),
                (Some(ForWindow::Legacy { .. }), _) | (None, _) => (None, None),
            };
            window = next;
            if window.is_none() && descriptor.row_type == RowType::For && in_body.is_none() {
                window = Some(if is_new_style(&element) {
                    ForWindow::WithEnd { depth: 1 }
                } else {
                    ForWindow::Legacy { last_body: None }
                });
            }
            output.push(element);
            body.push(in_body);
        }

        for (element, in_body) in output.iter_mut().zip(body.iter()).rev() {
            let Some(with_end) = *in_body else {
                continue;
            };
            if let ExecutableElement::Row(row) = element {
                row.make_for_continue(with_end);
            }
        }
        holder.set_elements(output);
        Ok(())
    }
}

fn describe(
    path: &str,
    holder: &ExecutableHolder,
    element: &ExecutableElement,
) -> Result<Descriptor, FixerError> {
    if element.holder() != holder.kind() {
        let position = element.begin_position();
        return Err(FixerError {
            path: path.to_string(),
            message: format!(
                "{} does not belong to {} '{}'",
                element.model_type(),
                holder.kind(),
                holder.name_text()
            ),
            line: position.map(|p| p.line).unwrap_or(0),
            column: position.map(|p| p.column).unwrap_or(0),
        });
    }
    let (continues_previous, misplaced_arguments) = match element {
        ExecutableElement::Row(row) => (
            row.action().borrow().has_type(TokenType::PreviousLineContinue),
            has_misplaced_arguments(row),
        ),
        _ => (false, false),
    };
    Ok(Descriptor {
        row_type: element.row_type(),
        continues_previous,
        misplaced_arguments,
    })
}

fn is_new_style(element: &ExecutableElement) -> bool {
    element
        .as_row()
        .is_some_and(|row| is_new_style_for_text(row.action().borrow().text()))
}

fn is_end(element: &ExecutableElement) -> bool {
    element
        .as_row()
        .is_some_and(|row| is_end_text(row.action().borrow().text()))
}

/// Arguments physically on lines before the action.
fn has_misplaced_arguments(row: &RobotExecutableRow) -> bool {
    let Some(action_line) = row.action().borrow().line_number() else {
        return false;
    };
    row.arguments()
        .iter()
        .filter_map(|a| a.borrow().line_number())
        .any(|line| line < action_line)
}

/// Comment rows between two legacy body rows belong to the loop.
fn mark_comments_between(
    output: &[ExecutableElement],
    body: &mut [Option<bool>],
    from: usize,
    to: usize,
) {
    for index in from + 1..to {
        if output[index].row_type() == RowType::CommentedHash {
            body[index] = Some(false);
        }
    }
}

/// Index of the element a continuation merges into.
fn merge_target(output: &[ExecutableElement]) -> Option<usize> {
    output.iter().rposition(|element| match element {
        ExecutableElement::Setting(_) => true,
        ExecutableElement::Row(row) => row.row_type() != RowType::CommentedHash,
        ExecutableElement::Empty(_) => false,
    })
}

/// Merge a `...` row into the element it continues.
///
/// Returns the row back when there is nothing to merge into.
fn merge_continuation(
    output: &mut [ExecutableElement],
    mut row: RobotExecutableRow,
) -> Option<RobotExecutableRow> {
    let Some(target) = merge_target(output) else {
        return Some(row);
    };
    let lines = row.source_lines().to_vec();
    let mut tokens = row.take_cells();
    if !tokens.is_empty() {
        tokens.remove(0);
    }
    absorb(&mut output[target], tokens, &lines);
    None
}

/// Merge a TSV row whose cells start on earlier lines into the previous row.
fn merge_backward(
    output: &mut [ExecutableElement],
    mut row: RobotExecutableRow,
) -> Option<RobotExecutableRow> {
    let target = output
        .iter()
        .rposition(|e| matches!(e, ExecutableElement::Row(r) if r.row_type() != RowType::CommentedHash));
    let Some(target) = target else {
        return Some(row);
    };
    let lines = row.source_lines().to_vec();
    let tokens = row.take_cells();
    absorb(&mut output[target], tokens, &lines);
    None
}

fn absorb(target: &mut ExecutableElement, tokens: Vec<TokenRef>, lines: &[usize]) {
    let mut in_comment = false;
    match target {
        ExecutableElement::Row(row) => {
            for token in tokens {
                if token.borrow().text().is_empty() && token.borrow().is_artificial() {
                    continue;
                }
                in_comment |= token.borrow().is_comment();
                if in_comment {
                    row.add_comment(token);
                } else if row.has_empty_action() && row.action().borrow().is_artificial() {
                    row.set_action(token);
                } else {
                    let end = row.arguments().len();
                    row.insert_argument(end, token);
                }
            }
            row.extend_lines(lines);
        }
        ExecutableElement::Setting(setting) => {
            for token in tokens {
                if token.borrow().text().is_empty() && token.borrow().is_artificial() {
                    continue;
                }
                in_comment |= token.borrow().is_comment();
                if in_comment {
                    setting.add_comment(token);
                } else {
                    setting.push_value(token);
                }
            }
            setting.extend_lines(lines);
        }
        ExecutableElement::Empty(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RobotFile;
    use crate::parser::RobotParser;
    use pretty_assertions::assert_eq;
    use rf_lexer::{new_token, HolderKind};

    /// Helper: parse a file and return the first test case's rows as cell texts.
    fn rows(source: &str) -> Vec<(RowType, Vec<String>)> {
        let file = RobotParser::parse(source).unwrap();
        first_holder_rows(&file, HolderKind::TestCase)
    }

    fn first_holder_rows(file: &RobotFile, kind: HolderKind) -> Vec<(RowType, Vec<String>)> {
        file.executable_table(kind).holders()[0]
            .elements()
            .iter()
            .map(|e| (e.row_type(), e.cell_texts()))
            .collect()
    }

    fn cells(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    // =========================================================================
    // FOR loops
    // =========================================================================

    #[test]
    fn test_for_with_end_marks_body_rows() {
        let source = "*** Test Cases ***\n\
                      Loop\n    \
                      FOR    ${x}    IN RANGE    10\n        \
                      Log    ${x}\n        \
                      kw    1    2    3\n    \
                      END\n    \
                      kw    1    2    3\n";
        assert_eq!(
            rows(source),
            vec![
                (RowType::For, cells(&["FOR", "${x}", "IN RANGE", "10"])),
                (RowType::ForContinue, cells(&["\\", "Log", "${x}"])),
                (RowType::ForContinue, cells(&["\\", "kw", "1", "2", "3"])),
                (RowType::Simple, cells(&["END"])),
                (RowType::Simple, cells(&["kw", "1", "2", "3"])),
            ]
        );
        let file = RobotParser::parse(source).unwrap();
        let holder = &file.test_cases().holders()[0];
        let body = holder.elements()[1].as_row().unwrap();
        assert!(body.action().borrow().is_artificial());
        assert!(body.action().borrow().has_type(TokenType::ForWithEndContinuation));
    }

    #[test]
    fn test_nested_for_with_end() {
        let source = "*** Test Cases ***\n\
                      Nested\n    \
                      FOR    ${i}    IN    a    b\n        \
                      FOR    ${j}    IN    c\n            \
                      Log    ${j}\n        \
                      END\n    \
                      END\n    \
                      Done\n";
        let types: Vec<RowType> = rows(source).into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            types,
            vec![
                RowType::For,
                RowType::ForContinue,
                RowType::ForContinue,
                RowType::ForContinue,
                RowType::Simple,
                RowType::Simple,
            ]
        );
    }

    #[test]
    fn test_legacy_for_closes_at_first_plain_row() {
        let source = "*** Test Cases ***\n\
                      Legacy\n    \
                      :FOR    ${x}    IN    a    b\n    \
                      \\    Log    ${x}\n    \
                      # inside\n    \
                      \\    Log    again\n    \
                      After\n";
        assert_eq!(
            rows(source),
            vec![
                (RowType::For, cells(&[":FOR", "${x}", "IN", "a", "b"])),
                (RowType::ForContinue, cells(&["\\", "Log", "${x}"])),
                (RowType::ForContinue, cells(&["\\", "# inside"])),
                (RowType::ForContinue, cells(&["\\", "Log", "again"])),
                (RowType::Simple, cells(&["After"])),
            ]
        );
    }

    #[test]
    fn test_comment_after_legacy_body_stays_comment() {
        let source = "*** Test Cases ***\n\
                      Legacy\n    \
                      :FOR    ${x}    IN    a\n    \
                      \\    Log    ${x}\n    \
                      # after\n    \
                      After\n";
        let types: Vec<RowType> = rows(source).into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            types,
            vec![RowType::For, RowType::ForContinue, RowType::CommentedHash, RowType::Simple]
        );
    }

    // =========================================================================
    // Continuation
    // =========================================================================

    #[test]
    fn test_continuation_merges_into_previous_row() {
        let source = "*** Test Cases ***\n\
                      Case\n    \
                      Log Many    a\n    \
                      ...    b    # note\n    \
                      Next\n";
        assert_eq!(
            rows(source),
            vec![
                (RowType::Simple, cells(&["Log Many", "a", "b", "# note"])),
                (RowType::Simple, cells(&["Next"])),
            ]
        );
        let file = RobotParser::parse(source).unwrap();
        let row = file.test_cases().holders()[0].elements()[0].as_row().unwrap().clone();
        assert_eq!(row.source_lines(), &[2, 3]);
    }

    #[test]
    fn test_continuation_skips_comment_and_empty_rows() {
        let source = "*** Keywords ***\n\
                      Kw\n    \
                      [Arguments]    ${a}\n    \
                      # between\n\n    \
                      ...    ${b}\n";
        let file = RobotParser::parse(source).unwrap();
        let holder = &file.keywords().holders()[0];
        assert_eq!(holder.elements()[0].cell_texts(), cells(&["[Arguments]", "${a}", "${b}"]));
        assert_eq!(holder.elements().len(), 3);
    }

    #[test]
    fn test_continuation_after_comment_keeps_values_before_comment() {
        let source = "*** Test Cases ***\n\
                      Case\n    \
                      Log    a    # c\n    \
                      ...    b\n";
        let file = RobotParser::parse(source).unwrap();
        let row = file.test_cases().holders()[0].elements()[0].as_row().unwrap().clone();
        let args: Vec<String> = row.arguments().iter().map(|a| a.borrow().text().to_string()).collect();
        assert_eq!(args, cells(&["a", "b"]));
        assert_eq!(row.comments().len(), 1);
    }

    #[test]
    fn test_continuation_as_first_row_is_kept() {
        let source = "*** Test Cases ***\nCase\n    ...    a\n";
        let result = rows(source);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_foreign_element_is_an_error() {
        let mut holder = ExecutableHolder::new(
            HolderKind::Keyword,
            new_token("Kw", TokenType::Unknown),
        );
        holder.push(ExecutableElement::Row(RobotExecutableRow::new(HolderKind::TestCase)));
        let err = ExecutableUnitFixer::new(false)
            .fix("suite.robot", &mut holder)
            .unwrap_err();
        assert_eq!(err.path, "suite.robot");
        assert!(err.message.contains("does not belong to keyword 'Kw'"));
    }
}
