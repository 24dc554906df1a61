//! The variables table.

use std::cell::RefCell;
use std::rc::Rc;

use rf_lexer::{escape, new_token, TokenRef, TokenType};

use super::cells;
use super::{note_line, ModelElement, ModelType, TableHeader};

/// Kind of a variable, by declaration prefix and value count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Scalar,
    /// A `${scalar}` given more than one value.
    ScalarAsList,
    List,
    Dictionary,
    Invalid,
}

impl VariableKind {
    /// Classify a declaration by its `${`, `@{` or `&{` prefix.
    pub fn from_declaration(name: &str) -> VariableKind {
        let name = name.trim();
        let closed = name.trim_end_matches('=').trim_end().ends_with('}');
        if !closed {
            return VariableKind::Invalid;
        }
        if name.starts_with("${") {
            VariableKind::Scalar
        } else if name.starts_with("@{") {
            VariableKind::List
        } else if name.starts_with("&{") {
            VariableKind::Dictionary
        } else {
            VariableKind::Invalid
        }
    }

    pub fn declaration_type(&self) -> TokenType {
        match self {
            VariableKind::Scalar | VariableKind::ScalarAsList => {
                TokenType::VariablesScalarDeclaration
            }
            VariableKind::List => TokenType::VariablesListDeclaration,
            VariableKind::Dictionary => TokenType::VariablesDictionaryDeclaration,
            VariableKind::Invalid => TokenType::VariablesWrongDefined,
        }
    }

    pub fn prefix(&self) -> char {
        match self {
            VariableKind::List => '@',
            VariableKind::Dictionary => '&',
            _ => '$',
        }
    }
}

/// Split a dictionary item at its first unescaped `=`.
///
/// An item without `=` is a key with an empty value.
pub fn split_item(raw: &str) -> (String, String) {
    let chars: Vec<char> = raw.chars().collect();
    for (index, c) in chars.iter().enumerate() {
        if *c == '=' && !escape::is_escaped(&chars, index) {
            let key: String = chars[..index].iter().collect();
            let value: String = chars[index + 1..].iter().collect();
            return (key, value);
        }
    }
    (raw.to_string(), String::new())
}

/// One entry of the variables table.
#[derive(Debug, Clone)]
pub struct RobotVariable {
    declared: VariableKind,
    declaration: TokenRef,
    values: Vec<TokenRef>,
    comments: Vec<TokenRef>,
    source_lines: Vec<usize>,
    modified: bool,
}

impl RobotVariable {
    pub fn new(declaration: TokenRef) -> Self {
        let declared = VariableKind::from_declaration(declaration.borrow().text());
        declaration
            .borrow_mut()
            .set_type(declared.declaration_type());
        Self {
            declared,
            declaration,
            values: Vec::new(),
            comments: Vec::new(),
            source_lines: Vec::new(),
            modified: false,
        }
    }

    /// Kind as the runtime sees it: a scalar with several values is a list.
    pub fn kind(&self) -> VariableKind {
        if self.declared == VariableKind::Scalar && self.values.len() > 1 {
            VariableKind::ScalarAsList
        } else {
            self.declared
        }
    }

    /// Declaration text, e.g. `${name}` or `${name}=`.
    pub fn name(&self) -> String {
        self.declaration.borrow().text().to_string()
    }

    /// Name without the type prefix, braces or a trailing `=`.
    pub fn bare_name(&self) -> String {
        let name = self.name();
        let trimmed = name.trim().trim_end_matches('=').trim_end();
        if self.declared == VariableKind::Invalid {
            return trimmed.to_string();
        }
        trimmed
            .get(2..trimmed.len().saturating_sub(1))
            .unwrap_or_default()
            .to_string()
    }

    pub fn values(&self) -> &[TokenRef] {
        &self.values
    }

    pub fn comments(&self) -> &[TokenRef] {
        &self.comments
    }

    pub fn comment_text(&self) -> String {
        self.comments
            .iter()
            .map(|t| t.borrow().text().to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Dictionary entries in first-seen key order with the last value seen.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = Vec::new();
        for token in &self.values {
            let (key, value) = split_item(token.borrow().text());
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
        entries
    }

    /// Textual form of the value: `x`, `[a, b]` or `{a -> 1, b -> 2}`.
    pub fn value_text(&self) -> String {
        let texts: Vec<String> = self
            .values
            .iter()
            .map(|t| t.borrow().text().to_string())
            .collect();
        match self.kind() {
            VariableKind::Scalar | VariableKind::Invalid => texts.join(" "),
            VariableKind::ScalarAsList | VariableKind::List => format!("[{}]", texts.join(", ")),
            VariableKind::Dictionary => {
                let pairs: Vec<String> = self
                    .entries()
                    .into_iter()
                    .map(|(k, v)| format!("{k} -> {v}"))
                    .collect();
                format!("{{{}}}", pairs.join(", "))
            }
        }
    }

    // --- Building ---

    pub(crate) fn add_value(&mut self, token: TokenRef) {
        if token.borrow().is_comment() || !self.comments.is_empty() {
            self.add_comment(token);
            return;
        }
        token.borrow_mut().set_type(TokenType::VariablesValue);
        self.values.push(token);
    }

    pub(crate) fn add_comment(&mut self, token: TokenRef) {
        self.comments.push(token);
        cells::fix_comment_types(&self.comments, TokenType::VariablesValue);
    }

    pub(crate) fn note_line(&mut self, line: usize) {
        note_line(&mut self.source_lines, line);
    }

    // --- Editing ---

    /// Rename, re-classifying the kind by the new prefix.
    pub(crate) fn set_name(&mut self, name: &str) {
        self.declared = VariableKind::from_declaration(name);
        let mut declaration = self.declaration.borrow_mut();
        declaration.set_text(name);
        declaration.set_type(self.declared.declaration_type());
    }

    /// Replace the single value of a scalar.
    pub(crate) fn set_scalar_value(&mut self, value: &str) {
        match self.values.first() {
            Some(token) if self.values.len() == 1 => token.borrow_mut().set_text(value),
            _ => {
                self.values = vec![new_token(value, TokenType::VariablesValue)];
                self.modified = true;
            }
        }
    }

    pub(crate) fn set_comment(&mut self, text: &str) {
        self.comments = if text.trim().is_empty() {
            Vec::new()
        } else {
            let text = if cells::starts_comment(text) {
                text.to_string()
            } else {
                format!("# {text}")
            };
            text.split(" | ")
                .map(|part| new_token(part, TokenType::CommentContinue))
                .collect()
        };
        cells::fix_comment_types(&self.comments, TokenType::VariablesValue);
        self.modified = true;
    }

    /// Append a value, or for dictionaries overwrite the value of an existing key in place.
    pub(crate) fn add_item(&mut self, text: &str) {
        if self.declared == VariableKind::Dictionary {
            let (key, _) = split_item(text);
            let existing = self
                .values
                .iter()
                .find(|t| split_item(t.borrow().text()).0 == key)
                .cloned();
            if let Some(token) = existing {
                token.borrow_mut().set_text(text);
                return;
            }
        }
        self.values.push(new_token(text, TokenType::VariablesValue));
        self.modified = true;
    }

    pub(crate) fn set_item(&mut self, index: usize, text: &str) -> bool {
        match self.values.get(index) {
            Some(token) => {
                token.borrow_mut().set_text(text);
                true
            }
            None => false,
        }
    }

    /// Remove the values at the given indexes. Unknown indexes are ignored.
    pub(crate) fn remove_items(&mut self, indexes: &[usize]) {
        let mut index = 0;
        self.values.retain(|_| {
            let keep = !indexes.contains(&index);
            index += 1;
            keep
        });
        self.modified = true;
    }

    pub(crate) fn swap_items(&mut self, a: usize, b: usize) -> bool {
        if a >= self.values.len() || b >= self.values.len() {
            return false;
        }
        self.values.swap(a, b);
        self.modified = true;
        true
    }
}

impl ModelElement for RobotVariable {
    fn model_type(&self) -> ModelType {
        ModelType::Variable(self.kind())
    }

    fn declaration(&self) -> TokenRef {
        Rc::clone(&self.declaration)
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        let mut tokens = vec![Rc::clone(&self.declaration)];
        tokens.extend(self.values.iter().cloned());
        tokens.extend(self.comments.iter().cloned());
        tokens
    }

    fn source_lines(&self) -> &[usize] {
        &self.source_lines
    }

    fn is_modified(&self) -> bool {
        self.modified
    }
}

/// The variables table of a file.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    pub headers: Vec<TableHeader>,
    variables: Vec<Rc<RefCell<RobotVariable>>>,
}

/// Shared handle to a variable, so an edit session can hold on to it.
pub type VariableRef = Rc<RefCell<RobotVariable>>;

impl VariableTable {
    pub fn is_present(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn variables(&self) -> &[VariableRef] {
        &self.variables
    }

    pub fn get(&self, index: usize) -> Option<VariableRef> {
        self.variables.get(index).cloned()
    }

    /// Find by declaration name, ignoring a trailing `=`.
    pub fn find(&self, name: &str) -> Option<VariableRef> {
        let wanted = name.trim().trim_end_matches('=').trim_end();
        self.variables
            .iter()
            .find(|v| v.borrow().name().trim().trim_end_matches('=').trim_end() == wanted)
            .cloned()
    }

    pub fn index_of(&self, variable: &VariableRef) -> Option<usize> {
        self.variables.iter().position(|v| Rc::ptr_eq(v, variable))
    }

    pub(crate) fn push(&mut self, variable: RobotVariable) -> VariableRef {
        let variable = Rc::new(RefCell::new(variable));
        self.variables.push(Rc::clone(&variable));
        variable
    }

    pub(crate) fn last(&self) -> Option<VariableRef> {
        self.variables.last().cloned()
    }

    pub(crate) fn insert(&mut self, index: usize, variable: RobotVariable) -> Option<VariableRef> {
        if index > self.variables.len() {
            return None;
        }
        let variable = Rc::new(RefCell::new(variable));
        self.variables.insert(index, Rc::clone(&variable));
        Some(variable)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<VariableRef> {
        if index < self.variables.len() {
            Some(self.variables.remove(index))
        } else {
            None
        }
    }
}
