//! Edits of the settings table.
//!
//! Columns follow the grid shown by [`SuiteSetting::cell_values`] minus the
//! comment column, which is edited through `update_comment`.

use rf_lexer::{new_token, TokenRef, TokenType};

use super::{Operation, UpdateError};
use crate::model::cells::starts_comment;
use crate::model::settings::{SettingGroup, SettingKind, SettingTable, SuiteSetting, WITH_NAME};

/// Strategy for one group of settings-table entries.
pub trait SettingOperation {
    fn is_applicable(&self, kind: SettingKind) -> bool;

    fn create(&self, kind: SettingKind, declaration: &str, args: &[String], comment: &str) -> SuiteSetting {
        let mut setting = SuiteSetting::new(kind, new_token(declaration, kind.declaration_type()));
        for arg in args {
            setting.add_value(value_token(arg));
        }
        if !comment.trim().is_empty() {
            setting.set_comment(comment);
        }
        setting
    }

    fn update(&self, setting: &mut SuiteSetting, column: usize, value: &str) -> Result<(), UpdateError>;
}

fn value_token(text: &str) -> TokenRef {
    if starts_comment(text) {
        new_token(text, TokenType::StartHashComment)
    } else {
        new_token(text, TokenType::Unknown)
    }
}

/// Setups, teardowns, tags and the like: the name is fixed, values follow.
pub struct GenericSettingOperation;

impl SettingOperation for GenericSettingOperation {
    fn is_applicable(&self, kind: SettingKind) -> bool {
        kind.group() == SettingGroup::Generic && kind != SettingKind::Unknown
    }

    fn update(&self, setting: &mut SuiteSetting, column: usize, value: &str) -> Result<(), UpdateError> {
        if column == 0 {
            return Err(UpdateError::IllegalArgument(format!(
                "the name of {} cannot be changed",
                setting.name()
            )));
        }
        setting.set_value(column - 1, value);
        Ok(())
    }
}

/// `Metadata`: the key is the first column, then the value parts.
pub struct MetadataOperation;

impl SettingOperation for MetadataOperation {
    fn is_applicable(&self, kind: SettingKind) -> bool {
        kind.group() == SettingGroup::Metadata
    }

    fn update(&self, setting: &mut SuiteSetting, column: usize, value: &str) -> Result<(), UpdateError> {
        setting.set_value(column, value);
        Ok(())
    }
}

/// Library, resource and variables imports.
pub struct ImportOperation;

impl SettingOperation for ImportOperation {
    fn is_applicable(&self, kind: SettingKind) -> bool {
        kind.group() == SettingGroup::Import
    }

    fn create(&self, kind: SettingKind, declaration: &str, args: &[String], comment: &str) -> SuiteSetting {
        let mut setting = SuiteSetting::new(kind, new_token(declaration, kind.declaration_type()));
        for arg in args {
            if kind == SettingKind::Library && is_alias_marker(arg) && setting.alias().is_empty() {
                setting.add_alias_marker(new_token(arg.as_str(), TokenType::SettingLibraryAlias));
            } else {
                setting.add_value(value_token(arg));
            }
        }
        if !comment.trim().is_empty() {
            setting.set_comment(comment);
        }
        setting
    }

    /// Column 0 is the path; it changes through `set_import_path` only.
    fn update(&self, setting: &mut SuiteSetting, column: usize, value: &str) -> Result<(), UpdateError> {
        if column == 0 {
            return Err(UpdateError::IllegalArgument(
                "an import path is changed with set_import_path".to_string(),
            ));
        }
        let values = setting.values().len();
        if column < values {
            setting.set_value(column, value);
        } else if !setting.alias().is_empty() {
            setting.set_alias(column - values, value);
        } else if setting.kind() == SettingKind::Library && is_alias_marker(value) {
            setting.set_alias(0, value);
        } else {
            setting.set_value(column, value);
        }
        Ok(())
    }
}

fn is_alias_marker(text: &str) -> bool {
    text.trim() == WITH_NAME
}

/// Dispatches settings-table edits to the first applicable operation.
pub struct SettingsUpdater {
    operations: Vec<Box<dyn SettingOperation>>,
}

impl Default for SettingsUpdater {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ImportOperation),
            Box::new(MetadataOperation),
            Box::new(GenericSettingOperation),
        ])
    }
}

impl SettingsUpdater {
    pub fn new(operations: Vec<Box<dyn SettingOperation>>) -> Self {
        Self { operations }
    }

    fn operation(&self, kind: SettingKind) -> Option<&dyn SettingOperation> {
        self.operations
            .iter()
            .find(|op| op.is_applicable(kind))
            .map(|op| op.as_ref())
    }

    /// Create a setting at `index` from its declaration, value cells and comment.
    pub fn create_setting<'t>(
        &self,
        table: &'t mut SettingTable,
        index: usize,
        declaration: &str,
        args: &[String],
        comment: &str,
    ) -> Result<&'t mut SuiteSetting, UpdateError> {
        let len = table.settings().len();
        if index > len {
            return Err(UpdateError::IndexOutOfBounds { index, len });
        }
        let kind = SettingKind::from_declaration(declaration);
        let operation = self
            .operation(kind)
            .ok_or_else(|| UpdateError::MissingHandler {
                operation: Operation::Create,
                target: format!("'{declaration}' setting"),
            })?;
        let setting = operation.create(kind, declaration, args, comment);
        table.insert(index, setting);
        table
            .setting_mut(index)
            .ok_or(UpdateError::IndexOutOfBounds { index, len })
    }

    /// Set one grid column of a setting.
    pub fn update(&self, setting: &mut SuiteSetting, column: usize, value: &str) -> Result<(), UpdateError> {
        let operation = self
            .operation(setting.kind())
            .ok_or_else(|| UpdateError::MissingHandler {
                operation: Operation::Update,
                target: format!("'{}' setting", setting.name()),
            })?;
        operation.update(setting, column, value)
    }

    /// Replace the comment; parts are separated by ` | `.
    pub fn update_comment(&self, setting: &mut SuiteSetting, comment: &str) {
        setting.set_comment(comment);
    }

    pub fn set_import_path(&self, setting: &mut SuiteSetting, path: &str) -> Result<(), UpdateError> {
        if setting.kind().group() != SettingGroup::Import {
            return Err(UpdateError::IllegalArgument(format!(
                "{} is not an import",
                setting.name()
            )));
        }
        setting.set_value(0, path);
        Ok(())
    }

    pub fn remove(&self, table: &mut SettingTable, index: usize) -> Result<SuiteSetting, UpdateError> {
        let len = table.settings().len();
        table
            .remove(index)
            .ok_or(UpdateError::IndexOutOfBounds { index, len })
    }
}
