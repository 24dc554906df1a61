//! Test cases, keywords and tasks with their steps.

use std::rc::Rc;

use rf_lexer::{new_token, FilePosition, HolderKind, TokenRef, TokenType};

use super::cells::{self, TrailingCells};
use super::{note_line, ModelElement, ModelType, TableHeader};
use crate::update::UpdateError;

// =============================================================================
// Row classification
// =============================================================================

/// Classification of a step used while normalizing loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowType {
    Simple,
    For,
    ForContinue,
    Setting,
    CommentedHash,
    Empty,
}

/// Whether the text opens a loop: `FOR`, `:FOR` or `: FOR`, in any case.
pub fn is_for_text(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.eq_ignore_ascii_case("for") || compact.eq_ignore_ascii_case(":for")
}

/// Loop syntax closed by `END`, as opposed to the legacy `:FOR` with `\` bodies.
pub fn is_new_style_for_text(text: &str) -> bool {
    text.trim() == "FOR"
}

pub fn is_end_text(text: &str) -> bool {
    text.trim() == "END"
}

pub fn is_for_in_text(text: &str) -> bool {
    let upper = text.trim().to_ascii_uppercase();
    matches!(
        upper.as_str(),
        "IN" | "IN RANGE" | "IN ENUMERATE" | "IN ZIP"
    )
}

pub fn is_assignment_text(text: &str) -> bool {
    let trimmed = text.trim_end().trim_end_matches('=').trim_end();
    trimmed.len() > 3
        && (trimmed.starts_with("${") || trimmed.starts_with("@{") || trimmed.starts_with("&{"))
        && trimmed.ends_with('}')
}

// =============================================================================
// Local settings
// =============================================================================

/// Kind of a `[Setting]` inside a test case, keyword or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalSettingKind {
    Documentation,
    Tags,
    Setup,
    Teardown,
    Template,
    Timeout,
    Arguments,
    Return,
    Unknown,
}

impl LocalSettingKind {
    fn from_bracket_name(name: &str) -> Option<LocalSettingKind> {
        let inner = name.trim().strip_prefix('[')?.strip_suffix(']')?;
        let normalized: String = inner
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let kind = match normalized.as_str() {
            "documentation" => LocalSettingKind::Documentation,
            "tags" => LocalSettingKind::Tags,
            "setup" | "precondition" => LocalSettingKind::Setup,
            "teardown" | "postcondition" => LocalSettingKind::Teardown,
            "template" => LocalSettingKind::Template,
            "timeout" => LocalSettingKind::Timeout,
            "arguments" => LocalSettingKind::Arguments,
            "return" => LocalSettingKind::Return,
            _ => LocalSettingKind::Unknown,
        };
        Some(kind)
    }

    /// Recognize a declaration within a holder.
    ///
    /// A bracketed name the holder does not support becomes `Unknown`.
    /// Anything not in brackets is not a setting.
    pub fn recognize(holder: HolderKind, name: &str) -> Option<LocalSettingKind> {
        let kind = Self::from_bracket_name(name)?;
        if kind.is_allowed_in(holder) {
            Some(kind)
        } else {
            Some(LocalSettingKind::Unknown)
        }
    }

    pub fn is_allowed_in(&self, holder: HolderKind) -> bool {
        match self {
            LocalSettingKind::Setup | LocalSettingKind::Template => holder != HolderKind::Keyword,
            LocalSettingKind::Arguments | LocalSettingKind::Return => {
                holder == HolderKind::Keyword
            }
            _ => true,
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            LocalSettingKind::Documentation => "[Documentation]",
            LocalSettingKind::Tags => "[Tags]",
            LocalSettingKind::Setup => "[Setup]",
            LocalSettingKind::Teardown => "[Teardown]",
            LocalSettingKind::Template => "[Template]",
            LocalSettingKind::Timeout => "[Timeout]",
            LocalSettingKind::Arguments => "[Arguments]",
            LocalSettingKind::Return => "[Return]",
            LocalSettingKind::Unknown => "[Unknown]",
        }
    }
}

/// A `[Setting]` line of a holder.
#[derive(Debug, Clone)]
pub struct LocalSetting {
    holder: HolderKind,
    kind: LocalSettingKind,
    declaration: TokenRef,
    values: Vec<TokenRef>,
    comments: Vec<TokenRef>,
    source_lines: Vec<usize>,
    modified: bool,
}

impl LocalSetting {
    pub fn new(holder: HolderKind, kind: LocalSettingKind, declaration: TokenRef) -> Self {
        declaration
            .borrow_mut()
            .set_type(TokenType::LocalSettingDeclaration(holder));
        Self {
            holder,
            kind,
            declaration,
            values: Vec::new(),
            comments: Vec::new(),
            source_lines: Vec::new(),
            modified: false,
        }
    }

    pub fn holder(&self) -> HolderKind {
        self.holder
    }

    pub fn kind(&self) -> LocalSettingKind {
        self.kind
    }

    pub fn values(&self) -> &[TokenRef] {
        &self.values
    }

    pub fn comments(&self) -> &[TokenRef] {
        &self.comments
    }

    /// First value: the keyword of a setup, teardown or template.
    pub fn keyword_name(&self) -> Option<String> {
        self.values.first().map(|t| t.borrow().text().to_string())
    }

    pub(crate) fn add_value(&mut self, token: TokenRef) {
        if token.borrow().is_comment() || !self.comments.is_empty() {
            self.add_comment(token);
            return;
        }
        {
            let mut t = token.borrow_mut();
            t.remove_type(TokenType::Action(self.holder));
            t.remove_type(TokenType::ActionArgument(self.holder));
            t.add_type(TokenType::LocalSettingArgument(self.holder));
        }
        self.values.push(token);
    }

    /// Append a value even when a comment was seen, as for a continued line.
    pub(crate) fn push_value(&mut self, token: TokenRef) {
        token
            .borrow_mut()
            .add_type(TokenType::LocalSettingArgument(self.holder));
        self.values.push(token);
    }

    pub(crate) fn add_comment(&mut self, token: TokenRef) {
        self.comments.push(token);
        cells::fix_comment_types(&self.comments, self.value_type());
    }

    pub(crate) fn note_line(&mut self, line: usize) {
        note_line(&mut self.source_lines, line);
    }

    pub(crate) fn extend_lines(&mut self, lines: &[usize]) {
        for line in lines {
            note_line(&mut self.source_lines, *line);
        }
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub(crate) fn detach(&mut self) {
        self.source_lines.clear();
        self.modified = true;
    }

    fn value_type(&self) -> TokenType {
        TokenType::LocalSettingArgument(self.holder)
    }

    /// Re-home the setting into another holder kind, re-recognizing its name.
    pub(crate) fn rehome(&mut self, holder: HolderKind) {
        let name = self.declaration.borrow().text().to_string();
        let old_value_type = self.value_type();
        self.holder = holder;
        self.kind = LocalSettingKind::recognize(holder, &name).unwrap_or(LocalSettingKind::Unknown);
        self.declaration
            .borrow_mut()
            .set_type(TokenType::LocalSettingDeclaration(holder));
        for token in &self.values {
            let mut t = token.borrow_mut();
            t.remove_type(old_value_type);
            t.add_type(self.value_type());
        }
        self.modified = true;
    }

    // --- Cell editing ---

    /// Insert an empty cell. The declaration cell cannot be shifted.
    pub fn insert_cell(&mut self, index: usize) -> Result<(), UpdateError> {
        if index == 0 {
            return Err(UpdateError::IllegalArgument(
                "cannot insert a cell before a setting declaration".to_string(),
            ));
        }
        let value_type = self.value_type();
        TrailingCells {
            values: &mut self.values,
            comments: &mut self.comments,
            value_type,
        }
        .insert_empty(index - 1)?;
        self.modified = true;
        Ok(())
    }

    /// Set cell text. Cell 0 renames the setting and may change its kind.
    pub fn update_cell(&mut self, index: usize, value: &str) -> Result<(), UpdateError> {
        if index == 0 {
            let kind = LocalSettingKind::recognize(self.holder, value).ok_or_else(|| {
                UpdateError::IllegalArgument(format!(
                    "'{value}' is not a {} setting",
                    self.holder
                ))
            })?;
            self.kind = kind;
            self.declaration.borrow_mut().set_text(value);
            return Ok(());
        }
        let value_type = self.value_type();
        let created = TrailingCells {
            values: &mut self.values,
            comments: &mut self.comments,
            value_type,
        }
        .update(index - 1, value);
        self.modified |= created;
        Ok(())
    }

    pub fn delete_cell(&mut self, index: usize) -> Result<(), UpdateError> {
        if index == 0 {
            return Err(UpdateError::IllegalArgument(
                "cannot delete a setting declaration".to_string(),
            ));
        }
        let value_type = self.value_type();
        TrailingCells {
            values: &mut self.values,
            comments: &mut self.comments,
            value_type,
        }
        .delete(index - 1)?;
        self.modified = true;
        Ok(())
    }
}

impl ModelElement for LocalSetting {
    fn model_type(&self) -> ModelType {
        ModelType::LocalSetting(self.holder, self.kind)
    }

    fn declaration(&self) -> TokenRef {
        Rc::clone(&self.declaration)
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        let mut tokens = vec![Rc::clone(&self.declaration)];
        let mut values = self.values.clone();
        if self.comments.is_empty() {
            cells::trim_trailing_empty(&mut values);
        }
        tokens.extend(values);
        let mut comments = self.comments.clone();
        cells::trim_trailing_empty(&mut comments);
        tokens.extend(comments);
        tokens
    }

    fn source_lines(&self) -> &[usize] {
        &self.source_lines
    }

    fn is_modified(&self) -> bool {
        self.modified
    }
}

// =============================================================================
// Executable rows
// =============================================================================

/// One step: an action with its arguments and trailing comment.
#[derive(Debug, Clone)]
pub struct RobotExecutableRow {
    holder: HolderKind,
    action: TokenRef,
    arguments: Vec<TokenRef>,
    comments: Vec<TokenRef>,
    source_lines: Vec<usize>,
    modified: bool,
}

impl RobotExecutableRow {
    /// Create a row with an empty artificial action.
    pub fn new(holder: HolderKind) -> Self {
        Self::with_action(holder, new_token("", TokenType::Action(holder)))
    }

    pub fn with_action(holder: HolderKind, action: TokenRef) -> Self {
        action.borrow_mut().add_type(TokenType::Action(holder));
        Self {
            holder,
            action,
            arguments: Vec::new(),
            comments: Vec::new(),
            source_lines: Vec::new(),
            modified: false,
        }
    }

    pub fn holder(&self) -> HolderKind {
        self.holder
    }

    pub fn action(&self) -> &TokenRef {
        &self.action
    }

    pub fn action_text(&self) -> String {
        self.action.borrow().text().to_string()
    }

    pub fn arguments(&self) -> &[TokenRef] {
        &self.arguments
    }

    pub fn comments(&self) -> &[TokenRef] {
        &self.comments
    }

    pub(crate) fn set_action(&mut self, action: TokenRef) {
        {
            let mut a = action.borrow_mut();
            a.remove_type(TokenType::ActionArgument(self.holder));
            a.add_type(TokenType::Action(self.holder));
        }
        self.action = action;
    }

    pub(crate) fn add_argument(&mut self, token: TokenRef) {
        if token.borrow().is_comment() || !self.comments.is_empty() {
            self.add_comment(token);
            return;
        }
        {
            let mut t = token.borrow_mut();
            t.remove_type(TokenType::Action(self.holder));
            t.add_type(TokenType::ActionArgument(self.holder));
        }
        self.arguments.push(token);
    }

    pub(crate) fn insert_argument(&mut self, index: usize, token: TokenRef) {
        {
            let mut t = token.borrow_mut();
            t.remove_type(TokenType::Action(self.holder));
            t.add_type(TokenType::ActionArgument(self.holder));
        }
        self.arguments.insert(index, token);
    }

    pub(crate) fn add_comment(&mut self, token: TokenRef) {
        self.comments.push(token);
        cells::fix_comment_types(&self.comments, TokenType::ActionArgument(self.holder));
    }

    pub(crate) fn note_line(&mut self, line: usize) {
        note_line(&mut self.source_lines, line);
    }

    pub(crate) fn extend_lines(&mut self, lines: &[usize]) {
        for line in lines {
            note_line(&mut self.source_lines, *line);
        }
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub(crate) fn detach(&mut self) {
        self.source_lines.clear();
        self.modified = true;
    }

    pub(crate) fn rehome(&mut self, holder: HolderKind) {
        let old = self.holder;
        self.holder = holder;
        {
            let mut a = self.action.borrow_mut();
            a.remove_type(TokenType::Action(old));
            a.add_type(TokenType::Action(holder));
        }
        for token in &self.arguments {
            let mut t = token.borrow_mut();
            t.remove_type(TokenType::ActionArgument(old));
            t.add_type(TokenType::ActionArgument(holder));
        }
        self.modified = true;
    }

    /// Whether the action is an artificial empty cell.
    pub fn has_empty_action(&self) -> bool {
        let action = self.action.borrow();
        action.text().trim().is_empty()
            && !action.has_type(TokenType::ForContinueArtificialToken)
    }

    pub fn row_type(&self) -> RowType {
        let action = self.action.borrow();
        let text = action.text().trim();
        if action.has_type(TokenType::ForContinueToken)
            || action.has_type(TokenType::ForContinueArtificialToken)
            || text == "\\"
        {
            RowType::ForContinue
        } else if is_for_text(text) {
            RowType::For
        } else if action.is_comment()
            || (text.is_empty() && self.arguments.is_empty() && !self.comments.is_empty())
        {
            RowType::CommentedHash
        } else {
            RowType::Simple
        }
    }

    /// Whether running the row executes something.
    ///
    /// An empty action only counts in TSV files and loop bodies closed by
    /// `END`, and only when an argument follows.
    pub fn is_executable(&self, tsv: bool) -> bool {
        let action = self.action.borrow();
        if action.has_type(TokenType::StartHashComment) {
            return false;
        }
        let text = action.text().trim();
        if text == "\\" {
            return !self.arguments.is_empty();
        }
        if text.is_empty() {
            if tsv || action.has_type(TokenType::ForWithEndContinuation) {
                return !self.arguments.is_empty();
            }
            return false;
        }
        true
    }

    /// 1-based line of the first positioned token.
    pub fn begin_line(&self) -> Option<usize> {
        self.begin_position().map(|p| p.line)
    }

    // --- Cell editing ---

    /// Insert an empty cell. Cell 0 shifts the action into the arguments.
    pub fn insert_cell(&mut self, index: usize) -> Result<(), UpdateError> {
        if index == 0 {
            let old_action = std::mem::replace(
                &mut self.action,
                new_token("", TokenType::Action(self.holder)),
            );
            self.insert_argument(0, old_action);
        } else {
            let value_type = TokenType::ActionArgument(self.holder);
            TrailingCells {
                values: &mut self.arguments,
                comments: &mut self.comments,
                value_type,
            }
            .insert_empty(index - 1)?;
        }
        self.modified = true;
        Ok(())
    }

    pub fn update_cell(&mut self, index: usize, value: &str) -> Result<(), UpdateError> {
        if index == 0 {
            if cells::starts_comment(value) {
                return Err(UpdateError::IllegalArgument(
                    "an action cannot start with a comment".to_string(),
                ));
            }
            self.action.borrow_mut().set_text(value);
            if self.action.borrow().is_artificial() {
                self.modified = true;
            }
            return Ok(());
        }
        let value_type = TokenType::ActionArgument(self.holder);
        let created = TrailingCells {
            values: &mut self.arguments,
            comments: &mut self.comments,
            value_type,
        }
        .update(index - 1, value);
        self.modified |= created;
        Ok(())
    }

    /// Remove a cell. Removing cell 0 promotes the first argument to action.
    pub fn delete_cell(&mut self, index: usize) -> Result<(), UpdateError> {
        if index == 0 {
            if self.arguments.is_empty() {
                return Err(UpdateError::IllegalArgument(
                    "cannot delete the action of a row without arguments".to_string(),
                ));
            }
            let first = self.arguments.remove(0);
            self.set_action(first);
        } else {
            let value_type = TokenType::ActionArgument(self.holder);
            TrailingCells {
                values: &mut self.arguments,
                comments: &mut self.comments,
                value_type,
            }
            .delete(index - 1)?;
        }
        self.modified = true;
        Ok(())
    }

    /// Replace the action with the artificial `\` loop-body marker.
    ///
    /// A real action becomes the first argument. `with_end` marks bodies of
    /// loops closed by `END`.
    pub(crate) fn make_for_continue(&mut self, with_end: bool) {
        if self.row_type() == RowType::ForContinue {
            return;
        }
        let marker = new_token("\\", TokenType::ForContinueArtificialToken);
        marker.borrow_mut().add_type(TokenType::Action(self.holder));
        if with_end {
            marker.borrow_mut().add_type(TokenType::ForWithEndContinuation);
        }
        let old = std::mem::replace(&mut self.action, marker);
        let keep = {
            let token = old.borrow();
            !token.is_artificial() || !token.text().trim().is_empty()
        };
        if keep {
            if old.borrow().is_comment() {
                self.comments.insert(0, old);
                cells::fix_comment_types(&self.comments, TokenType::ActionArgument(self.holder));
            } else {
                self.insert_argument(0, old);
            }
        }
    }

    /// Take all cells out of the row, leaving an empty action.
    pub(crate) fn take_cells(&mut self) -> Vec<TokenRef> {
        let action = std::mem::replace(
            &mut self.action,
            new_token("", TokenType::Action(self.holder)),
        );
        let mut tokens = vec![action];
        tokens.append(&mut self.arguments);
        tokens.append(&mut self.comments);
        tokens
    }
}

impl ModelElement for RobotExecutableRow {
    fn model_type(&self) -> ModelType {
        ModelType::ExecutableRow(self.holder)
    }

    fn declaration(&self) -> TokenRef {
        Rc::clone(&self.action)
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        let mut tokens = vec![Rc::clone(&self.action)];
        let mut arguments = self.arguments.clone();
        if self.comments.is_empty() {
            cells::trim_trailing_empty(&mut arguments);
        }
        tokens.extend(arguments);
        let mut comments = self.comments.clone();
        cells::trim_trailing_empty(&mut comments);
        tokens.extend(comments);
        tokens
    }

    fn source_lines(&self) -> &[usize] {
        &self.source_lines
    }

    fn is_modified(&self) -> bool {
        self.modified
    }
}

// =============================================================================
// Empty rows
// =============================================================================

/// A blank line inside a holder.
#[derive(Debug, Clone)]
pub struct RobotEmptyRow {
    holder: HolderKind,
    token: TokenRef,
    source_lines: Vec<usize>,
    modified: bool,
}

impl RobotEmptyRow {
    pub fn new(holder: HolderKind, token: TokenRef) -> Self {
        token.borrow_mut().add_type(TokenType::EmptyLine);
        Self {
            holder,
            token,
            source_lines: Vec::new(),
            modified: false,
        }
    }

    pub fn holder(&self) -> HolderKind {
        self.holder
    }

    pub(crate) fn note_line(&mut self, line: usize) {
        note_line(&mut self.source_lines, line);
    }

    pub(crate) fn rehome(&mut self, holder: HolderKind) {
        self.holder = holder;
        self.modified = true;
    }

    pub(crate) fn detach(&mut self) {
        self.source_lines.clear();
        self.modified = true;
    }
}

impl ModelElement for RobotEmptyRow {
    fn model_type(&self) -> ModelType {
        ModelType::EmptyLine(self.holder)
    }

    fn declaration(&self) -> TokenRef {
        Rc::clone(&self.token)
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        vec![Rc::clone(&self.token)]
    }

    fn source_lines(&self) -> &[usize] {
        &self.source_lines
    }

    fn is_modified(&self) -> bool {
        self.modified
    }
}

// =============================================================================
// Holder elements
// =============================================================================

/// Any element of a holder body.
#[derive(Debug, Clone)]
pub enum ExecutableElement {
    Setting(LocalSetting),
    Row(RobotExecutableRow),
    Empty(RobotEmptyRow),
}

impl ExecutableElement {
    pub fn holder(&self) -> HolderKind {
        match self {
            ExecutableElement::Setting(s) => s.holder(),
            ExecutableElement::Row(r) => r.holder(),
            ExecutableElement::Empty(e) => e.holder(),
        }
    }

    pub fn as_row(&self) -> Option<&RobotExecutableRow> {
        match self {
            ExecutableElement::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_row_mut(&mut self) -> Option<&mut RobotExecutableRow> {
        match self {
            ExecutableElement::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_setting(&self) -> Option<&LocalSetting> {
        match self {
            ExecutableElement::Setting(setting) => Some(setting),
            _ => None,
        }
    }

    pub fn row_type(&self) -> RowType {
        match self {
            ExecutableElement::Setting(_) => RowType::Setting,
            ExecutableElement::Row(row) => row.row_type(),
            ExecutableElement::Empty(_) => RowType::Empty,
        }
    }

    /// Cell texts as shown in a table editor.
    pub fn cell_texts(&self) -> Vec<String> {
        self.element_tokens()
            .iter()
            .map(|t| t.borrow().text().to_string())
            .collect()
    }

    pub(crate) fn rehome(&mut self, holder: HolderKind) {
        match self {
            ExecutableElement::Setting(s) => s.rehome(holder),
            ExecutableElement::Row(r) => r.rehome(holder),
            ExecutableElement::Empty(e) => e.rehome(holder),
        }
    }

    /// Forget the source lines, so the element is placed as a new one.
    pub(crate) fn detach(&mut self) {
        match self {
            ExecutableElement::Setting(s) => s.detach(),
            ExecutableElement::Row(r) => r.detach(),
            ExecutableElement::Empty(e) => e.detach(),
        }
    }

    pub fn as_setting_mut(&mut self) -> Option<&mut LocalSetting> {
        match self {
            ExecutableElement::Setting(setting) => Some(setting),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn ModelElement {
        match self {
            ExecutableElement::Setting(s) => s,
            ExecutableElement::Row(r) => r,
            ExecutableElement::Empty(e) => e,
        }
    }
}

impl ModelElement for ExecutableElement {
    fn model_type(&self) -> ModelType {
        self.inner().model_type()
    }

    fn declaration(&self) -> TokenRef {
        self.inner().declaration()
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        self.inner().element_tokens()
    }

    fn source_lines(&self) -> &[usize] {
        match self {
            ExecutableElement::Setting(s) => s.source_lines(),
            ExecutableElement::Row(r) => r.source_lines(),
            ExecutableElement::Empty(e) => e.source_lines(),
        }
    }

    fn is_modified(&self) -> bool {
        self.inner().is_modified()
    }
}

// =============================================================================
// Holders and tables
// =============================================================================

/// A test case, user keyword or task.
#[derive(Debug, Clone)]
pub struct ExecutableHolder {
    kind: HolderKind,
    name: TokenRef,
    elements: Vec<ExecutableElement>,
    source_lines: Vec<usize>,
    modified: bool,
}

impl ExecutableHolder {
    pub fn new(kind: HolderKind, name: TokenRef) -> Self {
        name.borrow_mut().set_type(TokenType::HolderName(kind));
        Self {
            kind,
            name,
            elements: Vec::new(),
            source_lines: Vec::new(),
            modified: false,
        }
    }

    pub fn kind(&self) -> HolderKind {
        self.kind
    }

    pub fn name(&self) -> &TokenRef {
        &self.name
    }

    pub fn name_text(&self) -> String {
        self.name.borrow().text().to_string()
    }

    pub fn elements(&self) -> &[ExecutableElement] {
        &self.elements
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut ExecutableElement> {
        self.elements.get_mut(index)
    }

    pub fn executable_rows(&self) -> impl Iterator<Item = &RobotExecutableRow> {
        self.elements.iter().filter_map(ExecutableElement::as_row)
    }

    pub fn settings(&self) -> impl Iterator<Item = &LocalSetting> {
        self.elements.iter().filter_map(ExecutableElement::as_setting)
    }

    /// First local setting of the given kind.
    pub fn setting(&self, kind: LocalSettingKind) -> Option<&LocalSetting> {
        self.settings().find(|s| s.kind() == kind)
    }

    pub(crate) fn push(&mut self, element: ExecutableElement) {
        self.elements.push(element);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut ExecutableElement> {
        self.elements.last_mut()
    }

    pub(crate) fn insert(
        &mut self,
        index: usize,
        element: ExecutableElement,
    ) -> Result<(), UpdateError> {
        if index > self.elements.len() {
            return Err(UpdateError::IndexOutOfBounds {
                index,
                len: self.elements.len(),
            });
        }
        self.elements.insert(index, element);
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<ExecutableElement, UpdateError> {
        if index >= self.elements.len() {
            return Err(UpdateError::IndexOutOfBounds {
                index,
                len: self.elements.len(),
            });
        }
        Ok(self.elements.remove(index))
    }

    pub(crate) fn take_elements(&mut self) -> Vec<ExecutableElement> {
        std::mem::take(&mut self.elements)
    }

    pub(crate) fn set_elements(&mut self, elements: Vec<ExecutableElement>) {
        self.elements = elements;
    }

    pub(crate) fn note_line(&mut self, line: usize) {
        note_line(&mut self.source_lines, line);
    }
}

impl ModelElement for ExecutableHolder {
    fn model_type(&self) -> ModelType {
        ModelType::Holder(self.kind)
    }

    fn declaration(&self) -> TokenRef {
        Rc::clone(&self.name)
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        vec![Rc::clone(&self.name)]
    }

    fn source_lines(&self) -> &[usize] {
        &self.source_lines
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn begin_position(&self) -> Option<FilePosition> {
        self.name.borrow().position()
    }
}

/// The test cases, keywords or tasks table.
#[derive(Debug, Clone)]
pub struct ExecutableTable {
    kind: HolderKind,
    pub headers: Vec<TableHeader>,
    holders: Vec<ExecutableHolder>,
}

impl ExecutableTable {
    pub fn new(kind: HolderKind) -> Self {
        Self {
            kind,
            headers: Vec::new(),
            holders: Vec::new(),
        }
    }

    pub fn kind(&self) -> HolderKind {
        self.kind
    }

    pub fn is_present(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn holders(&self) -> &[ExecutableHolder] {
        &self.holders
    }

    pub fn holder_mut(&mut self, index: usize) -> Option<&mut ExecutableHolder> {
        self.holders.get_mut(index)
    }

    /// Find a holder by case-insensitive name.
    pub fn find(&self, name: &str) -> Option<&ExecutableHolder> {
        let wanted = name.trim().to_lowercase();
        self.holders
            .iter()
            .find(|h| h.name_text().trim().to_lowercase() == wanted)
    }

    pub(crate) fn push(&mut self, holder: ExecutableHolder) {
        self.holders.push(holder);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut ExecutableHolder> {
        self.holders.last_mut()
    }

    pub(crate) fn holders_mut(&mut self) -> &mut [ExecutableHolder] {
        &mut self.holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TC: HolderKind = HolderKind::TestCase;

    /// Helper: build a row from cell texts, `#` cells become comments.
    fn row(cells: &[&str]) -> RobotExecutableRow {
        let mut row = RobotExecutableRow::with_action(TC, new_token(cells[0], TokenType::Unknown));
        for cell in &cells[1..] {
            let token = new_token(*cell, TokenType::Unknown);
            if cell.starts_with('#') {
                row.add_comment(token);
            } else {
                row.add_argument(token);
            }
        }
        row
    }

    fn cells(row: &RobotExecutableRow) -> Vec<String> {
        ExecutableElement::Row(row.clone()).cell_texts()
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_for_variants() {
        assert!(is_for_text("FOR"));
        assert!(is_for_text(":FOR"));
        assert!(is_for_text(": for"));
        assert!(!is_for_text("Format"));
        assert!(is_new_style_for_text("FOR"));
        assert!(!is_new_style_for_text(":FOR"));
    }

    #[test]
    fn test_row_types() {
        assert_eq!(row(&["Log", "x"]).row_type(), RowType::Simple);
        assert_eq!(row(&[":FOR", "${i}", "IN", "a"]).row_type(), RowType::For);
        assert_eq!(row(&["\\", "Log", "x"]).row_type(), RowType::ForContinue);
        assert_eq!(row(&["", "# note"]).row_type(), RowType::CommentedHash);
    }

    #[test]
    fn test_is_executable() {
        assert!(row(&["Log", "x"]).is_executable(false));
        assert!(row(&["\\", "Log"]).is_executable(false));
        assert!(!row(&["\\", "# c"]).is_executable(false));
        assert!(!row(&["", "# note"]).is_executable(false));
        assert!(!row(&["", "Log"]).is_executable(false));
        assert!(row(&["", "Log"]).is_executable(true));
    }

    #[test]
    fn test_assignment_detection() {
        assert!(is_assignment_text("${var}="));
        assert!(is_assignment_text("${var} ="));
        assert!(is_assignment_text("@{list}"));
        assert!(!is_assignment_text("Log"));
    }

    // =========================================================================
    // Row cell editing
    // =========================================================================

    #[test]
    fn test_insert_cell_at_action_shifts_everything() {
        let mut r = row(&["Log", "t"]);
        r.insert_cell(0).unwrap();
        assert_eq!(cells(&r), vec!["", "Log", "t"]);
        assert!(r.arguments()[0].borrow().has_type(TokenType::ActionArgument(TC)));
    }

    #[test]
    fn test_insert_cell_at_first_comment_shifts_comment_right() {
        let mut r = row(&["Log", "t", "#c1", "#c2"]);
        r.insert_cell(2).unwrap();
        r.update_cell(2, "x").unwrap();
        assert_eq!(cells(&r), vec!["Log", "t", "x", "#c1", "#c2"]);
    }

    #[test]
    fn test_update_action_with_comment_is_rejected() {
        let mut r = row(&["Log"]);
        assert!(matches!(
            r.update_cell(0, "#x"),
            Err(UpdateError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_update_past_end_pads() {
        let mut r = row(&["Log"]);
        r.update_cell(3, "#c").unwrap();
        assert_eq!(cells(&r), vec!["Log", "\\", "\\", "#c"]);
        assert!(r.is_modified());
    }

    #[test]
    fn test_delete_action_promotes_argument() {
        let mut r = row(&["Log", "t"]);
        r.delete_cell(0).unwrap();
        assert_eq!(cells(&r), vec!["t"]);
        assert!(r.action().borrow().has_type(TokenType::Action(TC)));

        assert!(matches!(
            r.delete_cell(0),
            Err(UpdateError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_element_tokens_trim_trailing_empty_arguments() {
        let mut r = row(&["Log", "t"]);
        r.insert_cell(2).unwrap();
        assert_eq!(cells(&r), vec!["Log", "t"]);
    }

    #[test]
    fn test_make_for_continue_demotes_action() {
        let mut r = row(&["Log", "${x}"]);
        r.make_for_continue(false);
        assert_eq!(cells(&r), vec!["\\", "Log", "${x}"]);
        assert_eq!(r.row_type(), RowType::ForContinue);
        assert!(r.action().borrow().is_artificial());
    }

    // =========================================================================
    // Local settings
    // =========================================================================

    #[test]
    fn test_recognize_local_settings_per_holder() {
        assert_eq!(
            LocalSettingKind::recognize(HolderKind::TestCase, "[Setup]"),
            Some(LocalSettingKind::Setup)
        );
        assert_eq!(
            LocalSettingKind::recognize(HolderKind::Keyword, "[Setup]"),
            Some(LocalSettingKind::Unknown)
        );
        assert_eq!(
            LocalSettingKind::recognize(HolderKind::Keyword, "[ Arguments ]"),
            Some(LocalSettingKind::Arguments)
        );
        assert_eq!(LocalSettingKind::recognize(HolderKind::Keyword, "Log"), None);
    }

    #[test]
    fn test_local_setting_rename_changes_kind() {
        let mut setting = LocalSetting::new(
            HolderKind::TestCase,
            LocalSettingKind::Setup,
            new_token("[Setup]", TokenType::Unknown),
        );
        setting.update_cell(0, "[Teardown]").unwrap();
        assert_eq!(setting.kind(), LocalSettingKind::Teardown);
        assert!(setting.update_cell(0, "Teardown").is_err());
        assert!(setting.insert_cell(0).is_err());
        assert!(setting.delete_cell(0).is_err());
    }

    #[test]
    fn test_rehome_setup_into_keyword_becomes_unknown() {
        let mut setting = LocalSetting::new(
            HolderKind::TestCase,
            LocalSettingKind::Setup,
            new_token("[Setup]", TokenType::Unknown),
        );
        setting.add_value(new_token("Prepare", TokenType::Unknown));
        setting.rehome(HolderKind::Keyword);
        assert_eq!(setting.kind(), LocalSettingKind::Unknown);
        assert!(setting.values()[0]
            .borrow()
            .has_type(TokenType::LocalSettingArgument(HolderKind::Keyword)));
    }
}
