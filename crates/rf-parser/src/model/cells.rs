//! Cell editing shared by executable rows and local settings.
//!
//! Both element kinds have a head cell (action or declaration) followed by
//! value cells and comment cells. Indexes here count from the first cell
//! after the head.

use rf_lexer::{new_token, TokenRef, TokenType};

use crate::update::UpdateError;

/// Text of a padding cell: an escaped empty value.
pub const EMPTY_CELL: &str = "\\";

pub fn starts_comment(value: &str) -> bool {
    value.trim_start().starts_with('#')
}

/// The value and comment cells that follow a head cell.
pub struct TrailingCells<'a> {
    pub values: &'a mut Vec<TokenRef>,
    pub comments: &'a mut Vec<TokenRef>,
    pub value_type: TokenType,
}

impl TrailingCells<'_> {
    fn len(&self) -> usize {
        self.values.len() + self.comments.len()
    }

    /// Insert an empty cell before `index`.
    ///
    /// Indexes up to the first comment insert a value, so existing comments
    /// shift right by one cell. Indexes inside the comments insert an empty
    /// comment part.
    pub fn insert_empty(&mut self, index: usize) -> Result<(), UpdateError> {
        let values = self.values.len();
        if index <= values {
            self.values.insert(index, new_token("", self.value_type));
            return Ok(());
        }
        let part = index - values;
        if part <= self.comments.len() {
            self.comments
                .insert(part, new_token("", TokenType::CommentContinue));
            self.retype();
            return Ok(());
        }
        Err(UpdateError::IndexOutOfBounds {
            index: index + 1,
            len: self.len() + 1,
        })
    }

    /// Set the text of the cell at `index`, creating padding cells as needed.
    ///
    /// Returns whether cells were created.
    pub fn update(&mut self, index: usize, value: &str) -> bool {
        let values = self.values.len();
        let mut created = false;
        if index < values {
            self.values[index].borrow_mut().set_text(value);
            if starts_comment(value) {
                let moved: Vec<TokenRef> = self.values.drain(index..).collect();
                self.comments.splice(0..0, moved);
            }
        } else if self.comments.is_empty() {
            while self.values.len() < index {
                self.values.push(new_token(EMPTY_CELL, self.value_type));
            }
            if starts_comment(value) {
                self.comments
                    .push(new_token(value, TokenType::StartHashComment));
            } else {
                self.values.push(new_token(value, self.value_type));
            }
            created = true;
        } else {
            let part = index - values;
            if part < self.comments.len() {
                self.comments[part].borrow_mut().set_text(value);
            } else {
                while self.comments.len() < part {
                    self.comments
                        .push(new_token(EMPTY_CELL, TokenType::CommentContinue));
                }
                self.comments
                    .push(new_token(value, TokenType::CommentContinue));
                created = true;
            }
            self.restore_leading_values();
        }
        self.retype();
        created
    }

    /// Remove the cell at `index`.
    pub fn delete(&mut self, index: usize) -> Result<(), UpdateError> {
        let values = self.values.len();
        if index < values {
            self.values.remove(index);
            return Ok(());
        }
        let part = index - values;
        if part < self.comments.len() {
            self.comments.remove(part);
            self.restore_leading_values();
            self.retype();
            return Ok(());
        }
        Err(UpdateError::IndexOutOfBounds {
            index: index + 1,
            len: self.len() + 1,
        })
    }

    /// Comment cells that no longer start with `#` are values again.
    fn restore_leading_values(&mut self) {
        while self
            .comments
            .first()
            .is_some_and(|c| !starts_comment(c.borrow().text()))
        {
            let token = self.comments.remove(0);
            self.values.push(token);
        }
    }

    /// Re-apply value and comment types after cells moved.
    pub fn retype(&mut self) {
        for token in self.values.iter() {
            let mut token = token.borrow_mut();
            token.remove_type(TokenType::StartHashComment);
            token.remove_type(TokenType::CommentContinue);
            token.add_type(self.value_type);
        }
        fix_comment_types(self.comments, self.value_type);
    }
}

/// The first comment part opens the comment, the rest continue it.
pub fn fix_comment_types(comments: &[TokenRef], value_type: TokenType) {
    for (index, token) in comments.iter().enumerate() {
        let mut token = token.borrow_mut();
        token.remove_type(value_type);
        if index == 0 {
            token.remove_type(TokenType::CommentContinue);
            token.add_type(TokenType::StartHashComment);
        } else {
            token.remove_type(TokenType::StartHashComment);
            token.add_type(TokenType::CommentContinue);
        }
    }
}

/// Trim trailing empty cells off a token list.
pub fn trim_trailing_empty(tokens: &mut Vec<TokenRef>) {
    while tokens.last().is_some_and(|t| t.borrow().text().is_empty()) {
        tokens.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rf_lexer::HolderKind;

    const ARG: TokenType = TokenType::ActionArgument(HolderKind::TestCase);

    fn tokens(texts: &[&str], kind: TokenType) -> Vec<TokenRef> {
        texts.iter().map(|t| new_token(*t, kind)).collect()
    }

    fn texts(tokens: &[TokenRef]) -> Vec<String> {
        tokens.iter().map(|t| t.borrow().text().to_string()).collect()
    }

    #[test]
    fn test_insert_before_first_comment_adds_value() {
        let mut values = tokens(&["a"], ARG);
        let mut comments = tokens(&["#c", "d"], TokenType::CommentContinue);
        let mut cells = TrailingCells {
            values: &mut values,
            comments: &mut comments,
            value_type: ARG,
        };
        cells.insert_empty(1).unwrap();
        assert_eq!(texts(&values), vec!["a", ""]);
        assert_eq!(texts(&comments), vec!["#c", "d"]);
    }

    #[test]
    fn test_insert_inside_comment() {
        let mut values = Vec::new();
        let mut comments = tokens(&["#c", "d"], TokenType::CommentContinue);
        let mut cells = TrailingCells {
            values: &mut values,
            comments: &mut comments,
            value_type: ARG,
        };
        cells.insert_empty(1).unwrap();
        assert_eq!(texts(&comments), vec!["#c", "", "d"]);
        assert!(comments[0].borrow().has_type(TokenType::StartHashComment));
        assert!(cells_out_of_range());
    }

    fn cells_out_of_range() -> bool {
        let mut values = Vec::new();
        let mut comments = Vec::new();
        let mut cells = TrailingCells {
            values: &mut values,
            comments: &mut comments,
            value_type: ARG,
        };
        cells.insert_empty(3).is_err()
    }

    #[test]
    fn test_update_value_to_comment_moves_following_values() {
        let mut values = tokens(&["a", "b", "c"], ARG);
        let mut comments = tokens(&["#x"], TokenType::StartHashComment);
        let mut cells = TrailingCells {
            values: &mut values,
            comments: &mut comments,
            value_type: ARG,
        };
        cells.update(1, "#b");
        assert_eq!(texts(&values), vec!["a"]);
        assert_eq!(texts(&comments), vec!["#b", "c", "#x"]);
        assert!(comments[0].borrow().has_type(TokenType::StartHashComment));
        assert!(comments[2].borrow().has_type(TokenType::CommentContinue));
    }

    #[test]
    fn test_update_past_end_pads_with_escaped_empty_cells() {
        let mut values = tokens(&["a"], ARG);
        let mut comments = Vec::new();
        let mut cells = TrailingCells {
            values: &mut values,
            comments: &mut comments,
            value_type: ARG,
        };
        assert!(cells.update(3, "z"));
        assert_eq!(texts(&values), vec!["a", "\\", "\\", "z"]);
    }

    #[test]
    fn test_update_first_comment_to_value_restores_it() {
        let mut values = tokens(&["a"], ARG);
        let mut comments = tokens(&["#c", "d"], TokenType::CommentContinue);
        let mut cells = TrailingCells {
            values: &mut values,
            comments: &mut comments,
            value_type: ARG,
        };
        cells.update(1, "b");
        assert_eq!(texts(&values), vec!["a", "b", "d"]);
        assert!(comments.is_empty());
        assert!(values[2].borrow().has_type(ARG));
    }

    #[test]
    fn test_delete_comment_restores_following_parts() {
        let mut values = Vec::new();
        let mut comments = tokens(&["#c", "d", "#e"], TokenType::CommentContinue);
        let mut cells = TrailingCells {
            values: &mut values,
            comments: &mut comments,
            value_type: ARG,
        };
        cells.delete(0).unwrap();
        assert_eq!(texts(&values), vec!["d"]);
        assert_eq!(texts(&comments), vec!["#e"]);
    }
}
