//! Edits of the variables table.
//!
//! A variable is shown as three columns: name, value and comment. Scalars
//! edit their value in place; lists, dictionaries and scalars with several
//! values go through a [`VariableDetailEditor`] session.

use rf_lexer::{new_token, TokenType};

use super::UpdateError;
use crate::model::cells::starts_comment;
use crate::model::variables::{split_item, RobotVariable, VariableKind, VariableRef, VariableTable};

/// Grid column holding the value.
pub const VALUE_COLUMN: usize = 1;

/// Creates, renames and removes variables.
#[derive(Debug, Default)]
pub struct VariablesUpdater;

impl VariablesUpdater {
    /// Create a variable at `index`. Value cells from the first `#` on form
    /// the comment.
    pub fn create(
        &self,
        table: &mut VariableTable,
        index: usize,
        name: &str,
        values: &[String],
        comment: &str,
    ) -> Result<VariableRef, UpdateError> {
        let len = table.variables().len();
        if index > len {
            return Err(UpdateError::IndexOutOfBounds { index, len });
        }
        let mut variable = RobotVariable::new(new_token(name, TokenType::Unknown));
        for value in values {
            let kind = if starts_comment(value) {
                TokenType::StartHashComment
            } else {
                TokenType::VariablesValue
            };
            variable.add_value(new_token(value.as_str(), kind));
        }
        if !comment.trim().is_empty() {
            variable.set_comment(comment);
        }
        table
            .insert(index, variable)
            .ok_or(UpdateError::IndexOutOfBounds { index, len })
    }

    /// Rename, which may change the kind through the new prefix.
    pub fn rename(&self, variable: &VariableRef, name: &str) {
        variable.borrow_mut().set_name(name);
    }

    /// Set the value cell of a scalar.
    pub fn set_scalar_value(&self, variable: &VariableRef, value: &str) -> Result<(), UpdateError> {
        let kind = variable.borrow().kind();
        if kind != VariableKind::Scalar {
            return Err(UpdateError::IllegalState(format!(
                "{kind:?} variable {} is edited in a detail session",
                variable.borrow().name()
            )));
        }
        variable.borrow_mut().set_scalar_value(value);
        Ok(())
    }

    pub fn update_comment(&self, variable: &VariableRef, comment: &str) {
        variable.borrow_mut().set_comment(comment);
    }

    pub fn remove(&self, table: &mut VariableTable, index: usize) -> Result<VariableRef, UpdateError> {
        let len = table.variables().len();
        table
            .remove(index)
            .ok_or(UpdateError::IndexOutOfBounds { index, len })
    }
}

/// One element shown in a detail session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailInput {
    Item(String),
    Entry { key: String, value: String },
}

struct Session {
    variable: VariableRef,
    dictionary: bool,
}

/// Edit session for the values of a list, dictionary or scalar-as-list.
///
/// `get_input` opens the session; every other step fails with an
/// illegal-state error until it has.
#[derive(Default)]
pub struct VariableDetailEditor {
    session: Option<Session>,
}

impl VariableDetailEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session on the value column of a variable and list its elements.
    pub fn get_input(
        &mut self,
        variable: &VariableRef,
        column: usize,
    ) -> Result<Vec<DetailInput>, UpdateError> {
        let kind = variable.borrow().kind();
        let compatible = column == VALUE_COLUMN
            && matches!(
                kind,
                VariableKind::ScalarAsList | VariableKind::List | VariableKind::Dictionary
            );
        if !compatible {
            self.session = None;
            return Err(UpdateError::IllegalState(format!(
                "no detail input for {kind:?} variable in column {column}"
            )));
        }
        let dictionary = kind == VariableKind::Dictionary;
        self.session = Some(Session {
            variable: VariableRef::clone(variable),
            dictionary,
        });
        Ok(inputs(&variable.borrow(), dictionary))
    }

    /// The elements of the open session.
    pub fn input(&self) -> Result<Vec<DetailInput>, UpdateError> {
        let session = self.session()?;
        Ok(inputs(&session.variable.borrow(), session.dictionary))
    }

    /// Append an element. A dictionary entry with an existing key replaces
    /// that entry's value in place.
    pub fn add_new_detail_element(&mut self, text: &str) -> Result<(), UpdateError> {
        let session = self.session()?;
        session.variable.borrow_mut().add_item(text);
        Ok(())
    }

    pub fn remove_detail_elements(&mut self, indexes: &[usize]) -> Result<(), UpdateError> {
        let session = self.session()?;
        session.variable.borrow_mut().remove_items(indexes);
        Ok(())
    }

    pub fn move_left(&mut self, index: usize) -> Result<(), UpdateError> {
        let session = self.session()?;
        let len = session.variable.borrow().values().len();
        if index == 0 || !session.variable.borrow_mut().swap_items(index - 1, index) {
            return Err(UpdateError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    pub fn move_right(&mut self, index: usize) -> Result<(), UpdateError> {
        let session = self.session()?;
        let len = session.variable.borrow().values().len();
        if !session.variable.borrow_mut().swap_items(index, index + 1) {
            return Err(UpdateError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    /// Replace the element at `index`; dictionary entries are given as `key=value`.
    pub fn set_new_value(&mut self, index: usize, text: &str) -> Result<(), UpdateError> {
        let session = self.session()?;
        let len = session.variable.borrow().values().len();
        if !session.variable.borrow_mut().set_item(index, text) {
            return Err(UpdateError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.session = None;
    }

    fn session(&self) -> Result<&Session, UpdateError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| UpdateError::IllegalState("no detail session is open".to_string()))?;
        let is_dictionary = session.variable.borrow().kind() == VariableKind::Dictionary;
        if is_dictionary != session.dictionary {
            return Err(UpdateError::IllegalState(format!(
                "variable {} changed its kind during the session",
                session.variable.borrow().name()
            )));
        }
        Ok(session)
    }
}

fn inputs(variable: &RobotVariable, dictionary: bool) -> Vec<DetailInput> {
    variable
        .values()
        .iter()
        .map(|token| {
            let text = token.borrow().text().to_string();
            if dictionary {
                let (key, value) = split_item(&text);
                DetailInput::Entry { key, value }
            } else {
                DetailInput::Item(text)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dumper::Dumper;
    use crate::parser::RobotParser;
    use pretty_assertions::assert_eq;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn table_with(name: &str, values: &[&str]) -> (VariableTable, VariableRef) {
        let mut table = VariableTable::default();
        let variable = VariablesUpdater
            .create(&mut table, 0, name, &strings(values), "")
            .unwrap();
        (table, variable)
    }

    // =========================================================================
    // Table edits
    // =========================================================================

    #[test]
    fn test_create_rename_and_remove() {
        let (mut table, variable) = table_with("${a}", &["1", "# note"]);
        assert_eq!(variable.borrow().value_text(), "1");
        assert_eq!(variable.borrow().comment_text(), "# note");

        VariablesUpdater.rename(&variable, "@{a}");
        assert_eq!(variable.borrow().kind(), VariableKind::List);

        let removed = VariablesUpdater.remove(&mut table, 0).unwrap();
        assert!(VariableRef::ptr_eq(&removed, &variable));
        assert!(table.variables().is_empty());
        assert!(VariablesUpdater.remove(&mut table, 0).is_err());
    }

    #[test]
    fn test_scalar_value_is_edited_in_place() {
        let (_table, scalar) = table_with("${a}", &["1"]);
        VariablesUpdater.set_scalar_value(&scalar, "2").unwrap();
        assert_eq!(scalar.borrow().value_text(), "2");

        let (_table, list) = table_with("@{l}", &["1"]);
        assert!(matches!(
            VariablesUpdater.set_scalar_value(&list, "2"),
            Err(UpdateError::IllegalState(_))
        ));
    }

    // =========================================================================
    // Detail sessions
    // =========================================================================

    #[test]
    fn test_dictionary_append_and_overwrite() {
        let (_table, dict) = table_with("&{dict}", &["a=1", "b=2", "c=3"]);
        let mut editor = VariableDetailEditor::new();
        let input = editor.get_input(&dict, VALUE_COLUMN).unwrap();
        assert_eq!(
            input[0],
            DetailInput::Entry {
                key: "a".to_string(),
                value: "1".to_string()
            }
        );

        editor.add_new_detail_element("key=value").unwrap();
        assert_eq!(
            dict.borrow().value_text(),
            "{a -> 1, b -> 2, c -> 3, key -> value}"
        );
        editor.add_new_detail_element("key=other").unwrap();
        assert_eq!(editor.input().unwrap().len(), 4);
        assert_eq!(
            dict.borrow().value_text(),
            "{a -> 1, b -> 2, c -> 3, key -> other}"
        );
    }

    #[test]
    fn test_list_moves_removes_and_sets() {
        let (_table, list) = table_with("@{l}", &["a", "b", "c"]);
        let mut editor = VariableDetailEditor::new();
        editor.get_input(&list, VALUE_COLUMN).unwrap();

        editor.move_left(2).unwrap();
        assert_eq!(list.borrow().value_text(), "[a, c, b]");
        editor.move_right(0).unwrap();
        assert_eq!(list.borrow().value_text(), "[c, a, b]");
        assert!(editor.move_left(0).is_err());
        assert!(editor.move_right(2).is_err());

        editor.set_new_value(1, "x").unwrap();
        editor.remove_detail_elements(&[0, 2]).unwrap();
        assert_eq!(
            editor.input().unwrap(),
            vec![DetailInput::Item("x".to_string())]
        );
    }

    #[test]
    fn test_scalar_as_list_has_detail_input() {
        let (_table, variable) = table_with("${s}", &["a", "b"]);
        let mut editor = VariableDetailEditor::new();
        let input = editor.get_input(&variable, VALUE_COLUMN).unwrap();
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn test_steps_without_session_are_illegal() {
        let mut editor = VariableDetailEditor::new();
        assert!(matches!(
            editor.add_new_detail_element("x"),
            Err(UpdateError::IllegalState(_))
        ));
        assert!(matches!(editor.move_left(1), Err(UpdateError::IllegalState(_))));
        assert!(matches!(
            editor.set_new_value(0, "x"),
            Err(UpdateError::IllegalState(_))
        ));
    }

    #[test]
    fn test_incompatible_type_or_column() {
        let (_table, scalar) = table_with("${a}", &["1"]);
        let (_table2, list) = table_with("@{l}", &["1"]);
        let mut editor = VariableDetailEditor::new();
        assert!(matches!(
            editor.get_input(&scalar, VALUE_COLUMN),
            Err(UpdateError::IllegalState(_))
        ));
        assert!(matches!(
            editor.get_input(&list, 2),
            Err(UpdateError::IllegalState(_))
        ));
        assert!(editor.remove_detail_elements(&[0]).is_err());
    }

    #[test]
    fn test_session_breaks_when_kind_changes() {
        let (_table, variable) = table_with("@{v}", &["a=1"]);
        let mut editor = VariableDetailEditor::new();
        editor.get_input(&variable, VALUE_COLUMN).unwrap();
        VariablesUpdater.rename(&variable, "&{v}");
        assert!(matches!(
            editor.add_new_detail_element("b=2"),
            Err(UpdateError::IllegalState(_))
        ));
    }

    #[test]
    fn test_edited_list_is_dumped() {
        let mut file = RobotParser::parse("*** Variables ***\n@{l}    a    b\n${x}    1\n").unwrap();
        let list = file.variables().get(0).unwrap();
        let mut editor = VariableDetailEditor::new();
        editor.get_input(&list, VALUE_COLUMN).unwrap();
        editor.add_new_detail_element("c").unwrap();
        let scalar = file.variables_mut().find("${x}").unwrap();
        VariablesUpdater.set_scalar_value(&scalar, "2").unwrap();
        assert_eq!(
            Dumper::default().dump(&file),
            "*** Variables ***\n@{l}    a    b    c\n${x}    2\n"
        );
    }
}
