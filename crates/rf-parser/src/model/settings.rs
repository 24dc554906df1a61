//! The settings table: imports, documentation, metadata and suite defaults.

use std::rc::Rc;

use rf_lexer::{new_token, TokenRef, TokenType};

use super::cells::{self, EMPTY_CELL};
use super::{note_line, ModelElement, ModelType, TableHeader};

/// Marker that introduces a library alias.
pub const WITH_NAME: &str = "WITH NAME";

/// Kind of a settings-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Library,
    Resource,
    Variables,
    Documentation,
    Metadata,
    SuiteSetup,
    SuiteTeardown,
    TestSetup,
    TestTeardown,
    TestTemplate,
    TestTimeout,
    ForceTags,
    DefaultTags,
    Unknown,
}

/// How the cells of a setting are laid out for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingGroup {
    /// Path or name first, then arguments and an optional alias.
    Import,
    /// Key first, then value parts.
    Metadata,
    Generic,
}

impl SettingKind {
    /// Recognize a declaration, ignoring case, spaces and a trailing `:`.
    pub fn from_declaration(name: &str) -> SettingKind {
        let trimmed = name.trim().trim_end_matches(':');
        let normalized: String = trimmed
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "library" => SettingKind::Library,
            "resource" => SettingKind::Resource,
            "variables" => SettingKind::Variables,
            "documentation" => SettingKind::Documentation,
            "metadata" => SettingKind::Metadata,
            "suitesetup" | "suiteprecondition" => SettingKind::SuiteSetup,
            "suiteteardown" | "suitepostcondition" => SettingKind::SuiteTeardown,
            "testsetup" | "tasksetup" | "testprecondition" | "taskprecondition" => {
                SettingKind::TestSetup
            }
            "testteardown" | "taskteardown" | "testpostcondition" | "taskpostcondition" => {
                SettingKind::TestTeardown
            }
            "testtemplate" | "tasktemplate" => SettingKind::TestTemplate,
            "testtimeout" | "tasktimeout" => SettingKind::TestTimeout,
            "forcetags" => SettingKind::ForceTags,
            "defaulttags" => SettingKind::DefaultTags,
            _ => SettingKind::Unknown,
        }
    }

    pub fn group(&self) -> SettingGroup {
        match self {
            SettingKind::Library | SettingKind::Resource | SettingKind::Variables => {
                SettingGroup::Import
            }
            SettingKind::Metadata => SettingGroup::Metadata,
            _ => SettingGroup::Generic,
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            SettingKind::Library => "Library",
            SettingKind::Resource => "Resource",
            SettingKind::Variables => "Variables",
            SettingKind::Documentation => "Documentation",
            SettingKind::Metadata => "Metadata",
            SettingKind::SuiteSetup => "Suite Setup",
            SettingKind::SuiteTeardown => "Suite Teardown",
            SettingKind::TestSetup => "Test Setup",
            SettingKind::TestTeardown => "Test Teardown",
            SettingKind::TestTemplate => "Test Template",
            SettingKind::TestTimeout => "Test Timeout",
            SettingKind::ForceTags => "Force Tags",
            SettingKind::DefaultTags => "Default Tags",
            SettingKind::Unknown => "Unknown",
        }
    }

    pub fn declaration_type(&self) -> TokenType {
        match self {
            SettingKind::Library => TokenType::SettingLibraryDeclaration,
            SettingKind::Resource => TokenType::SettingResourceDeclaration,
            SettingKind::Variables => TokenType::SettingVariablesDeclaration,
            SettingKind::Documentation => TokenType::SettingDocumentationDeclaration,
            SettingKind::Metadata => TokenType::SettingMetadataDeclaration,
            SettingKind::SuiteSetup => TokenType::SettingSuiteSetupDeclaration,
            SettingKind::SuiteTeardown => TokenType::SettingSuiteTeardownDeclaration,
            SettingKind::TestSetup => TokenType::SettingTestSetupDeclaration,
            SettingKind::TestTeardown => TokenType::SettingTestTeardownDeclaration,
            SettingKind::TestTemplate => TokenType::SettingTestTemplateDeclaration,
            SettingKind::TestTimeout => TokenType::SettingTestTimeoutDeclaration,
            SettingKind::ForceTags => TokenType::SettingForceTagsDeclaration,
            SettingKind::DefaultTags => TokenType::SettingDefaultTagsDeclaration,
            SettingKind::Unknown => TokenType::SettingUnknownDeclaration,
        }
    }

    /// Token type of the value at `index`, counted from the first value.
    pub fn value_type(&self, index: usize) -> TokenType {
        let first = index == 0;
        match self {
            SettingKind::Library if first => TokenType::SettingLibraryName,
            SettingKind::Library => TokenType::SettingLibraryArgument,
            SettingKind::Resource if first => TokenType::SettingResourceFileName,
            SettingKind::Resource => TokenType::SettingResourceUnwantedArgument,
            SettingKind::Variables if first => TokenType::SettingVariablesFileName,
            SettingKind::Variables => TokenType::SettingVariablesArgument,
            SettingKind::Documentation => TokenType::SettingDocumentationText,
            SettingKind::Metadata if first => TokenType::SettingMetadataKey,
            SettingKind::Metadata => TokenType::SettingMetadataValue,
            SettingKind::SuiteSetup if first => TokenType::SettingSuiteSetupKeywordName,
            SettingKind::SuiteSetup => TokenType::SettingSuiteSetupKeywordArgument,
            SettingKind::SuiteTeardown if first => TokenType::SettingSuiteTeardownKeywordName,
            SettingKind::SuiteTeardown => TokenType::SettingSuiteTeardownKeywordArgument,
            SettingKind::TestSetup if first => TokenType::SettingTestSetupKeywordName,
            SettingKind::TestSetup => TokenType::SettingTestSetupKeywordArgument,
            SettingKind::TestTeardown if first => TokenType::SettingTestTeardownKeywordName,
            SettingKind::TestTeardown => TokenType::SettingTestTeardownKeywordArgument,
            SettingKind::TestTemplate if first => TokenType::SettingTestTemplateKeywordName,
            SettingKind::TestTemplate => TokenType::SettingTestTemplateKeywordUnwantedArgument,
            SettingKind::TestTimeout if first => TokenType::SettingTestTimeoutValue,
            SettingKind::TestTimeout => TokenType::SettingTestTimeoutMessage,
            SettingKind::ForceTags => TokenType::SettingForceTags,
            SettingKind::DefaultTags => TokenType::SettingDefaultTags,
            SettingKind::Unknown => TokenType::SettingUnknownArgument,
        }
    }
}

/// One entry of the settings table.
#[derive(Debug, Clone)]
pub struct SuiteSetting {
    kind: SettingKind,
    declaration: TokenRef,
    values: Vec<TokenRef>,
    alias: Vec<TokenRef>,
    comments: Vec<TokenRef>,
    source_lines: Vec<usize>,
    modified: bool,
}

impl SuiteSetting {
    pub fn new(kind: SettingKind, declaration: TokenRef) -> Self {
        declaration.borrow_mut().set_type(kind.declaration_type());
        Self {
            kind,
            declaration,
            values: Vec::new(),
            alias: Vec::new(),
            comments: Vec::new(),
            source_lines: Vec::new(),
            modified: false,
        }
    }

    pub fn kind(&self) -> SettingKind {
        self.kind
    }

    pub fn name(&self) -> String {
        self.declaration.borrow().text().to_string()
    }

    pub fn values(&self) -> &[TokenRef] {
        &self.values
    }

    /// The `WITH NAME` marker and alias of a library import.
    pub fn alias(&self) -> &[TokenRef] {
        &self.alias
    }

    pub fn comments(&self) -> &[TokenRef] {
        &self.comments
    }

    /// Imported path or library name.
    pub fn import_path(&self) -> Option<String> {
        if self.kind.group() != SettingGroup::Import {
            return None;
        }
        self.values.first().map(|t| t.borrow().text().to_string())
    }

    /// Called keyword of a setup, teardown or template.
    pub fn keyword_name(&self) -> Option<String> {
        match self.kind {
            SettingKind::SuiteSetup
            | SettingKind::SuiteTeardown
            | SettingKind::TestSetup
            | SettingKind::TestTeardown
            | SettingKind::TestTemplate => {
                self.values.first().map(|t| t.borrow().text().to_string())
            }
            _ => None,
        }
    }

    /// Comment parts joined with ` | `.
    pub fn comment_text(&self) -> String {
        self.comments
            .iter()
            .map(|t| t.borrow().text().to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Grid view with `columns` cells, the comment in the last one.
    pub fn cell_values(&self, columns: usize) -> Vec<String> {
        let mut cells: Vec<String> = std::iter::once(&self.declaration)
            .chain(self.values.iter())
            .chain(self.alias.iter())
            .map(|t| t.borrow().text().to_string())
            .collect();
        let data_columns = columns.saturating_sub(1);
        cells.truncate(data_columns);
        while cells.len() < data_columns {
            cells.push(String::new());
        }
        if columns > 0 {
            cells.push(self.comment_text());
        }
        cells
    }

    // --- Building ---

    pub(crate) fn add_value(&mut self, token: TokenRef) {
        if token.borrow().is_comment() || !self.comments.is_empty() {
            self.add_comment(token);
            return;
        }
        if !self.alias.is_empty() {
            token.borrow_mut().set_type(TokenType::SettingLibraryAliasValue);
            self.alias.push(token);
            return;
        }
        let value_type = self.kind.value_type(self.values.len());
        token.borrow_mut().set_type(value_type);
        self.values.push(token);
    }

    pub(crate) fn add_alias_marker(&mut self, token: TokenRef) {
        token.borrow_mut().set_type(TokenType::SettingLibraryAlias);
        self.alias.push(token);
    }

    pub(crate) fn add_comment(&mut self, token: TokenRef) {
        self.comments.push(token);
        cells::fix_comment_types(&self.comments, self.kind.value_type(1));
    }

    pub(crate) fn note_line(&mut self, line: usize) {
        note_line(&mut self.source_lines, line);
    }

    // --- Editing ---

    /// Set the value at `index`, padding with escaped empty cells.
    pub(crate) fn set_value(&mut self, index: usize, text: &str) {
        if index < self.values.len() {
            self.values[index].borrow_mut().set_text(text);
            return;
        }
        while self.values.len() < index {
            let value_type = self.kind.value_type(self.values.len());
            self.values.push(new_token(EMPTY_CELL, value_type));
        }
        let value_type = self.kind.value_type(index);
        self.values.push(new_token(text, value_type));
        self.modified = true;
    }

    /// Set the alias cell: 0 is the marker, 1 the name.
    pub(crate) fn set_alias(&mut self, index: usize, text: &str) {
        if index < self.alias.len() {
            self.alias[index].borrow_mut().set_text(text);
            return;
        }
        if self.alias.is_empty() {
            self.alias
                .push(new_token(WITH_NAME, TokenType::SettingLibraryAlias));
        }
        if index >= self.alias.len() {
            self.alias
                .push(new_token(text, TokenType::SettingLibraryAliasValue));
        }
        self.modified = true;
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
        cells::fix_comment_types(&self.comments, self.kind.value_type(1));
        self.modified = true;
    }
}

impl ModelElement for SuiteSetting {
    fn model_type(&self) -> ModelType {
        ModelType::Setting(self.kind)
    }

    fn declaration(&self) -> TokenRef {
        Rc::clone(&self.declaration)
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        let mut tokens = vec![Rc::clone(&self.declaration)];
        tokens.extend(self.values.iter().cloned());
        tokens.extend(self.alias.iter().cloned());
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

/// The settings table of a file.
#[derive(Debug, Clone, Default)]
pub struct SettingTable {
    pub headers: Vec<TableHeader>,
    settings: Vec<SuiteSetting>,
}

impl SettingTable {
    pub fn is_present(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn settings(&self) -> &[SuiteSetting] {
        &self.settings
    }

    pub fn setting_mut(&mut self, index: usize) -> Option<&mut SuiteSetting> {
        self.settings.get_mut(index)
    }

    pub fn find_all(&self, kind: SettingKind) -> impl Iterator<Item = &SuiteSetting> {
        self.settings.iter().filter(move |s| s.kind() == kind)
    }

    /// First setting of a kind; later duplicates are ignored at run time.
    pub fn find(&self, kind: SettingKind) -> Option<&SuiteSetting> {
        self.find_all(kind).next()
    }

    pub fn imports(&self) -> impl Iterator<Item = &SuiteSetting> {
        self.settings
            .iter()
            .filter(|s| s.kind().group() == SettingGroup::Import)
    }

    pub(crate) fn push(&mut self, setting: SuiteSetting) {
        self.settings.push(setting);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut SuiteSetting> {
        self.settings.last_mut()
    }

    pub(crate) fn insert(&mut self, index: usize, setting: SuiteSetting) -> bool {
        if index > self.settings.len() {
            return false;
        }
        self.settings.insert(index, setting);
        true
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<SuiteSetting> {
        if index < self.settings.len() {
            Some(self.settings.remove(index))
        } else {
            None
        }
    }
}
