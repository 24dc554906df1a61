//! Edits of test cases, keywords and tasks.

use rf_lexer::{new_token, HolderKind, TokenRef, TokenType};

use super::{Operation, UpdateError};
use crate::model::cells::starts_comment;
use crate::model::executables::{
    ExecutableElement, ExecutableHolder, LocalSetting, LocalSettingKind, RobotEmptyRow,
    RobotExecutableRow,
};
use crate::model::ModelElement;

/// Strategy for the local settings of one kind.
pub trait LocalSettingOperation {
    fn is_applicable(&self, holder: HolderKind, kind: LocalSettingKind) -> bool;

    /// Build a setting from its declaration and cells. Cells from the first
    /// `#` on form the comment.
    fn create(
        &self,
        holder: HolderKind,
        kind: LocalSettingKind,
        name: &str,
        args: &[String],
    ) -> LocalSetting {
        let declaration = new_token(name, TokenType::LocalSettingDeclaration(holder));
        let mut setting = LocalSetting::new(holder, kind, declaration);
        for arg in args {
            setting.add_value(cell_token(arg, TokenType::LocalSettingArgument(holder)));
        }
        setting
    }

    fn update(
        &self,
        setting: &mut LocalSetting,
        index: usize,
        value: &str,
    ) -> Result<(), UpdateError> {
        setting.update_cell(index, value)
    }
}

/// Operation for a setting kind the holder supports.
pub struct SettingKindOperation {
    kind: LocalSettingKind,
}

impl SettingKindOperation {
    pub fn new(kind: LocalSettingKind) -> Self {
        Self { kind }
    }
}

impl LocalSettingOperation for SettingKindOperation {
    fn is_applicable(&self, holder: HolderKind, kind: LocalSettingKind) -> bool {
        kind == self.kind && kind.is_allowed_in(holder)
    }
}

/// Catch-all for bracketed names the holder does not know.
pub struct UnknownSettingOperation;

impl LocalSettingOperation for UnknownSettingOperation {
    fn is_applicable(&self, _holder: HolderKind, kind: LocalSettingKind) -> bool {
        kind == LocalSettingKind::Unknown
    }
}

fn cell_token(text: &str, value_type: TokenType) -> TokenRef {
    if starts_comment(text) {
        new_token(text, TokenType::StartHashComment)
    } else {
        new_token(text, value_type)
    }
}

/// Dispatches holder edits to the first applicable setting operation.
pub struct ExecutablesUpdater {
    operations: Vec<Box<dyn LocalSettingOperation>>,
}

impl Default for ExecutablesUpdater {
    fn default() -> Self {
        let kinds = [
            LocalSettingKind::Arguments,
            LocalSettingKind::Documentation,
            LocalSettingKind::Tags,
            LocalSettingKind::Return,
            LocalSettingKind::Setup,
            LocalSettingKind::Teardown,
            LocalSettingKind::Template,
            LocalSettingKind::Timeout,
        ];
        let mut operations: Vec<Box<dyn LocalSettingOperation>> = kinds
            .into_iter()
            .map(|kind| Box::new(SettingKindOperation::new(kind)) as Box<dyn LocalSettingOperation>)
            .collect();
        operations.push(Box::new(UnknownSettingOperation));
        Self::new(operations)
    }
}

impl ExecutablesUpdater {
    pub fn new(operations: Vec<Box<dyn LocalSettingOperation>>) -> Self {
        Self { operations }
    }

    fn operation(
        &self,
        holder: HolderKind,
        kind: LocalSettingKind,
    ) -> Option<&dyn LocalSettingOperation> {
        self.operations
            .iter()
            .find(|op| op.is_applicable(holder, kind))
            .map(|op| op.as_ref())
    }

    /// Create a `[Setting]` at `index`.
    pub fn create_setting<'h>(
        &self,
        holder: &'h mut ExecutableHolder,
        index: usize,
        name: &str,
        args: &[String],
    ) -> Result<&'h mut ExecutableElement, UpdateError> {
        check_index(holder, index)?;
        let kind = LocalSettingKind::recognize(holder.kind(), name).ok_or_else(|| {
            UpdateError::IllegalArgument(format!("'{name}' is not a {} setting", holder.kind()))
        })?;
        let operation = self
            .operation(holder.kind(), kind)
            .ok_or_else(|| UpdateError::MissingHandler {
                operation: Operation::Create,
                target: format!("{} {name} setting", holder.kind()),
            })?;
        let setting = operation.create(holder.kind(), kind, name, args);
        insert_at(holder, index, ExecutableElement::Setting(setting))
    }

    /// Create a step from cell texts: action, arguments, then comment cells.
    pub fn create_executable_row<'h>(
        &self,
        holder: &'h mut ExecutableHolder,
        index: usize,
        cells: &[String],
    ) -> Result<&'h mut ExecutableElement, UpdateError> {
        check_index(holder, index)?;
        let kind = holder.kind();
        let mut row = match cells.first() {
            Some(first) if !starts_comment(first) => {
                RobotExecutableRow::with_action(kind, new_token(first.as_str(), TokenType::Action(kind)))
            }
            _ => RobotExecutableRow::new(kind),
        };
        let skip = usize::from(!row.has_empty_action());
        for cell in &cells[skip..] {
            row.add_argument(cell_token(cell, TokenType::ActionArgument(kind)));
        }
        insert_at(holder, index, ExecutableElement::Row(row))
    }

    pub fn create_empty_line<'h>(
        &self,
        holder: &'h mut ExecutableHolder,
        index: usize,
    ) -> Result<&'h mut ExecutableElement, UpdateError> {
        check_index(holder, index)?;
        let row = RobotEmptyRow::new(holder.kind(), new_token("", TokenType::EmptyLine));
        insert_at(holder, index, ExecutableElement::Empty(row))
    }

    /// Insert an element taken from this or another holder.
    ///
    /// Elements from another holder kind are re-typed for this one, so a
    /// test case `[Setup]` moved into a keyword becomes an unknown setting
    /// and an unknown `[Arguments]` moved into a keyword becomes real.
    pub fn insert<'h>(
        &self,
        holder: &'h mut ExecutableHolder,
        index: usize,
        mut element: ExecutableElement,
    ) -> Result<&'h mut ExecutableElement, UpdateError> {
        check_index(holder, index)?;
        if element.holder() != holder.kind() {
            element.rehome(holder.kind());
        }
        if let ExecutableElement::Setting(setting) = &element {
            if self.operation(holder.kind(), setting.kind()).is_none() {
                return Err(UpdateError::MissingHandler {
                    operation: Operation::Insert,
                    target: setting.model_type().to_string(),
                });
            }
        }
        element.detach();
        insert_at(holder, index, element)
    }

    /// Set the text of one cell.
    ///
    /// Typing into an empty line turns it into a step.
    pub fn update(
        &self,
        element: &mut ExecutableElement,
        cell: usize,
        value: &str,
    ) -> Result<(), UpdateError> {
        match element {
            ExecutableElement::Row(row) => row.update_cell(cell, value),
            ExecutableElement::Setting(setting) => {
                let operation = self
                    .operation(setting.holder(), setting.kind())
                    .ok_or_else(|| UpdateError::MissingHandler {
                        operation: Operation::Update,
                        target: setting.model_type().to_string(),
                    })?;
                operation.update(setting, cell, value)
            }
            ExecutableElement::Empty(empty) => {
                let mut row = RobotExecutableRow::new(empty.holder());
                row.extend_lines(empty.source_lines());
                row.mark_modified();
                row.update_cell(cell, value)?;
                *element = ExecutableElement::Row(row);
                Ok(())
            }
        }
    }

    /// Insert an empty cell before `index`.
    pub fn create_cell(&self, element: &mut ExecutableElement, index: usize) -> Result<(), UpdateError> {
        match element {
            ExecutableElement::Row(row) => row.insert_cell(index),
            ExecutableElement::Setting(setting) => setting.insert_cell(index),
            ExecutableElement::Empty(_) => Err(UpdateError::IllegalArgument(
                "an empty line has no cells".to_string(),
            )),
        }
    }

    pub fn delete_cell(&self, element: &mut ExecutableElement, index: usize) -> Result<(), UpdateError> {
        match element {
            ExecutableElement::Row(row) => row.delete_cell(index),
            ExecutableElement::Setting(setting) => setting.delete_cell(index),
            ExecutableElement::Empty(_) => Err(UpdateError::IllegalArgument(
                "an empty line has no cells".to_string(),
            )),
        }
    }

    /// Remove the element at `index`, returning it for a later `insert`.
    pub fn remove(
        &self,
        holder: &mut ExecutableHolder,
        index: usize,
    ) -> Result<ExecutableElement, UpdateError> {
        holder.remove(index)
    }
}

fn check_index(holder: &ExecutableHolder, index: usize) -> Result<(), UpdateError> {
    let len = holder.elements().len();
    if index > len {
        return Err(UpdateError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn insert_at(
    holder: &mut ExecutableHolder,
    index: usize,
    element: ExecutableElement,
) -> Result<&mut ExecutableElement, UpdateError> {
    holder.insert(index, element)?;
    let len = holder.elements().len();
    holder
        .element_mut(index)
        .ok_or(UpdateError::IndexOutOfBounds { index, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dumper::Dumper;
    use crate::parser::RobotParser;
    use pretty_assertions::assert_eq;

    fn holder(kind: HolderKind) -> ExecutableHolder {
        ExecutableHolder::new(kind, new_token("Unit", TokenType::Unknown))
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn cells(holder: &ExecutableHolder, index: usize) -> Vec<String> {
        holder.elements()[index].cell_texts()
    }

    // =========================================================================
    // Executable rows
    // =========================================================================

    #[test]
    fn test_row_cell_editing() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);
        updater
            .create_executable_row(&mut tc, 0, &strings(&["some action", "a", "b", "c", "#comment"]))
            .unwrap();
        assert_eq!(cells(&tc, 0), vec!["some action", "a", "b", "c", "#comment"]);

        let row = tc.element_mut(0).unwrap();
        updater.update(row, 4, "#new comment").unwrap();
        updater.update(row, 3, "x").unwrap();
        updater.create_cell(row, 4).unwrap();
        updater.create_cell(row, 5).unwrap();
        updater.create_cell(row, 6).unwrap();
        updater.update(row, 6, "z").unwrap();
        assert_eq!(
            row.cell_texts(),
            vec!["some action", "a", "b", "x", "", "", "z", "#new comment"]
        );

        updater.delete_cell(row, 5).unwrap();
        assert_eq!(
            row.cell_texts(),
            vec!["some action", "a", "b", "x", "", "z", "#new comment"]
        );
    }

    #[test]
    fn test_create_row_past_end_is_out_of_bounds() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);
        let err = updater
            .create_executable_row(&mut tc, 2, &strings(&["Log"]))
            .unwrap_err();
        assert_eq!(err, UpdateError::IndexOutOfBounds { index: 2, len: 0 });
    }

    #[test]
    fn test_create_comment_row() {
        let updater = ExecutablesUpdater::default();
        let mut kw = holder(HolderKind::Keyword);
        let row = updater
            .create_executable_row(&mut kw, 0, &strings(&["# note", "more"]))
            .unwrap();
        let row = row.as_row().unwrap();
        assert!(row.has_empty_action());
        assert_eq!(row.comments().len(), 2);
    }

    #[test]
    fn test_insert_cell_before_action() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);
        let row = updater
            .create_executable_row(&mut tc, 0, &strings(&["Log", "t"]))
            .unwrap();
        updater.create_cell(row, 0).unwrap();
        assert_eq!(row.cell_texts(), vec!["", "Log", "t"]);
    }

    #[test]
    fn test_typing_into_empty_line_makes_a_row() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);
        let empty = updater.create_empty_line(&mut tc, 0).unwrap();
        assert!(updater.create_cell(empty, 0).is_err());
        updater.update(empty, 0, "Log").unwrap();
        assert_eq!(empty.cell_texts(), vec!["Log"]);
        assert!(empty.as_row().is_some());
    }

    // =========================================================================
    // Local settings
    // =========================================================================

    #[test]
    fn test_setting_cell_editing() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);
        let setting = updater
            .create_setting(&mut tc, 0, "[Setup]", &strings(&["a", "b", "c", "#comment"]))
            .unwrap();
        assert_eq!(setting.as_setting().unwrap().kind(), LocalSettingKind::Setup);

        updater.update(setting, 4, "#new comment").unwrap();
        updater.update(setting, 3, "x").unwrap();
        updater.create_cell(setting, 4).unwrap();
        updater.update(setting, 4, "y").unwrap();
        assert_eq!(
            setting.cell_texts(),
            vec!["[Setup]", "a", "b", "x", "y", "#new comment"]
        );
        assert!(updater.create_cell(setting, 0).is_err());

        updater.update(setting, 0, "[Teardown]").unwrap();
        assert_eq!(setting.as_setting().unwrap().kind(), LocalSettingKind::Teardown);
    }

    #[test]
    fn test_setting_name_must_be_bracketed() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);
        let err = updater
            .create_setting(&mut tc, 0, "Setup", &[])
            .unwrap_err();
        assert!(matches!(err, UpdateError::IllegalArgument(_)));
    }

    #[test]
    fn test_unsupported_setting_is_unknown() {
        let updater = ExecutablesUpdater::default();
        let mut kw = holder(HolderKind::Keyword);
        let setting = updater.create_setting(&mut kw, 0, "[Setup]", &[]).unwrap();
        assert_eq!(setting.as_setting().unwrap().kind(), LocalSettingKind::Unknown);
    }

    #[test]
    fn test_missing_handler() {
        let updater = ExecutablesUpdater::new(vec![Box::new(SettingKindOperation::new(
            LocalSettingKind::Tags,
        ))]);
        let mut tc = holder(HolderKind::TestCase);
        let err = updater
            .create_setting(&mut tc, 0, "[Setup]", &strings(&["Prepare"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to create test case [Setup] setting. Operation handler is missing"
        );
        assert!(tc.elements().is_empty());
    }

    // =========================================================================
    // Moving elements
    // =========================================================================

    fn keyword_setting(name: &str) -> ExecutableElement {
        let updater = ExecutablesUpdater::default();
        let mut kw = holder(HolderKind::Keyword);
        updater.create_setting(&mut kw, 0, name, &strings(&["x"])).unwrap();
        updater.remove(&mut kw, 0).unwrap()
    }

    #[test]
    fn test_insert_morphs_settings_into_target_holder() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);

        updater.insert(&mut tc, 0, keyword_setting("[Documentation]")).unwrap();
        updater.insert(&mut tc, 1, keyword_setting("[Setup]")).unwrap();
        updater.insert(&mut tc, 2, keyword_setting("[Template]")).unwrap();
        updater.insert(&mut tc, 3, keyword_setting("[something]")).unwrap();

        let kinds: Vec<LocalSettingKind> = tc.settings().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                LocalSettingKind::Documentation,
                LocalSettingKind::Setup,
                LocalSettingKind::Template,
                LocalSettingKind::Unknown,
            ]
        );
        assert!(tc.settings().all(|s| s.holder() == HolderKind::TestCase));
    }

    #[test]
    fn test_insert_same_element_twice() {
        let updater = ExecutablesUpdater::default();
        let mut tc = holder(HolderKind::TestCase);
        let row = updater
            .create_executable_row(&mut tc, 0, &strings(&["Log", "x"]))
            .unwrap()
            .clone();
        updater.insert(&mut tc, 1, row).unwrap();
        assert_eq!(tc.elements().len(), 2);
    }

    #[test]
    fn test_insert_rejected_without_handler() {
        let updater = ExecutablesUpdater::new(Vec::new());
        let mut tc = holder(HolderKind::TestCase);
        let err = updater.insert(&mut tc, 0, keyword_setting("[Tags]")).unwrap_err();
        assert!(matches!(
            err,
            UpdateError::MissingHandler {
                operation: Operation::Insert,
                ..
            }
        ));
    }

    #[test]
    fn test_moved_row_is_dumped_at_new_place() {
        let source = "*** Test Cases ***\nCase\n    First\n    Second\n";
        let mut file = RobotParser::parse(source).unwrap();
        let updater = ExecutablesUpdater::default();
        let case = file
            .executable_table_mut(HolderKind::TestCase)
            .holder_mut(0)
            .unwrap();
        let first = updater.remove(case, 0).unwrap();
        updater.insert(case, 1, first).unwrap();
        assert_eq!(
            Dumper::default().dump(&file),
            "*** Test Cases ***\nCase\n    Second\n    First\n"
        );
    }
}
