//! Parsing states tracked while mapping tokens.

use rf_lexer::HolderKind;

use crate::model::{SettingKind, TableType};

/// What the parser is currently building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingState {
    /// Content of an unrecognized table.
    Trash,
    TableHeader(TableType),
    TableInside(TableType),
    SettingDeclaration(SettingKind),
    LibraryAlias,
    VariableDeclaration,
    HolderDeclaration(HolderKind),
    ExecutableRow(HolderKind),
    LocalSettingDeclaration(HolderKind),
}

impl ParsingState {
    /// States that last only until the end of their line.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ParsingState::SettingDeclaration(_)
                | ParsingState::LibraryAlias
                | ParsingState::VariableDeclaration
                | ParsingState::ExecutableRow(_)
                | ParsingState::LocalSettingDeclaration(_)
        )
    }

    pub fn table(&self) -> Option<TableType> {
        match self {
            ParsingState::Trash => None,
            ParsingState::TableHeader(t) | ParsingState::TableInside(t) => Some(*t),
            ParsingState::SettingDeclaration(_) | ParsingState::LibraryAlias => {
                Some(TableType::Settings)
            }
            ParsingState::VariableDeclaration => Some(TableType::Variables),
            ParsingState::HolderDeclaration(k)
            | ParsingState::ExecutableRow(k)
            | ParsingState::LocalSettingDeclaration(k) => Some(TableType::from_holder_kind(*k)),
        }
    }
}

/// Stack of parsing states; the bottom entry is the current table.
#[derive(Debug, Clone, Default)]
pub struct ParsingStateStack {
    states: Vec<ParsingState>,
}

impl ParsingStateStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: ParsingState) {
        log::debug!("state push {state:?}");
        self.states.push(state);
    }

    pub fn pop(&mut self) -> Option<ParsingState> {
        self.states.pop()
    }

    pub fn top(&self) -> Option<ParsingState> {
        self.states.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn contains(&self, state: ParsingState) -> bool {
        self.states.contains(&state)
    }

    /// The table being parsed, `None` before the first table or inside trash.
    pub fn current_table(&self) -> Option<TableType> {
        self.top().and_then(|s| s.table())
    }

    pub fn is_in_trash(&self) -> bool {
        self.top() == Some(ParsingState::Trash)
    }

    /// The holder kind when inside a test case, keyword or task table.
    pub fn current_holder_kind(&self) -> Option<HolderKind> {
        self.current_table().and_then(|t| t.holder_kind())
    }

    /// Collapse line-scoped states before a new line starts.
    ///
    /// A header becomes the inside of its table and transient states are
    /// popped down to the nearest stable one.
    pub fn update_statuses_for_new_line(&mut self) {
        while let Some(top) = self.top() {
            if top.is_transient() {
                self.states.pop();
                continue;
            }
            if let ParsingState::TableHeader(table) = top {
                self.states.pop();
                self.states.push(ParsingState::TableInside(table));
            }
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_becomes_table_inside() {
        let mut stack = ParsingStateStack::new();
        stack.push(ParsingState::TableHeader(TableType::Settings));
        stack.update_statuses_for_new_line();
        assert_eq!(stack.top(), Some(ParsingState::TableInside(TableType::Settings)));
    }

    #[test]
    fn test_transient_states_collapse_to_holder() {
        let mut stack = ParsingStateStack::new();
        stack.push(ParsingState::TableInside(TableType::Keywords));
        stack.push(ParsingState::HolderDeclaration(HolderKind::Keyword));
        stack.push(ParsingState::LocalSettingDeclaration(HolderKind::Keyword));
        stack.update_statuses_for_new_line();
        assert_eq!(stack.top(), Some(ParsingState::HolderDeclaration(HolderKind::Keyword)));
        assert_eq!(stack.current_holder_kind(), Some(HolderKind::Keyword));
    }

    #[test]
    fn test_library_alias_collapses_to_table() {
        let mut stack = ParsingStateStack::new();
        stack.push(ParsingState::TableInside(TableType::Settings));
        stack.push(ParsingState::SettingDeclaration(SettingKind::Library));
        stack.push(ParsingState::LibraryAlias);
        stack.update_statuses_for_new_line();
        assert_eq!(stack.top(), Some(ParsingState::TableInside(TableType::Settings)));
    }

    #[test]
    fn test_trash_has_no_table() {
        let mut stack = ParsingStateStack::new();
        stack.push(ParsingState::Trash);
        assert_eq!(stack.current_table(), None);
        assert!(stack.is_in_trash());
    }
}
