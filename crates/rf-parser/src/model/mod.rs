//! Document model of a Robot Framework file.
//!
//! The file owns its lines. Model elements reference the same tokens the
//! lines hold and record which lines they were built from, so the dumper can
//! reproduce untouched lines verbatim.

pub mod cells;
pub mod executables;
pub mod settings;
pub mod variables;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rf_lexer::{FilePosition, HolderKind, RobotLine, SourceDialect, TokenRef, TokenType};

pub use executables::{
    ExecutableElement, ExecutableHolder, ExecutableTable, LocalSetting, LocalSettingKind,
    RobotEmptyRow, RobotExecutableRow, RowType,
};
pub use settings::{SettingGroup, SettingKind, SettingTable, SuiteSetting};
pub use variables::{RobotVariable, VariableKind, VariableRef, VariableTable};

// =============================================================================
// File formats and tables
// =============================================================================

/// Source format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Robot,
    Txt,
    Tsv,
    Resource,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> FileFormat {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("txt") => FileFormat::Txt,
            Some("tsv") => FileFormat::Tsv,
            Some("resource") => FileFormat::Resource,
            _ => FileFormat::Robot,
        }
    }

    pub fn dialect(&self) -> SourceDialect {
        match self {
            FileFormat::Tsv => SourceDialect::Tsv,
            _ => SourceDialect::Text,
        }
    }
}

/// The five recognized tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableType {
    Settings,
    Variables,
    TestCases,
    Keywords,
    Tasks,
}

impl TableType {
    /// Recognize a `*** Name ***` header, ignoring case, spaces and asterisks.
    pub fn from_header_name(text: &str) -> Option<TableType> {
        let normalized: String = text
            .chars()
            .filter(|c| *c != '*' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "settings" | "setting" | "metadata" => Some(TableType::Settings),
            "variables" | "variable" => Some(TableType::Variables),
            "testcases" | "testcase" => Some(TableType::TestCases),
            "keywords" | "keyword" | "userkeywords" | "userkeyword" => Some(TableType::Keywords),
            "tasks" | "task" => Some(TableType::Tasks),
            _ => None,
        }
    }

    pub fn holder_kind(&self) -> Option<HolderKind> {
        match self {
            TableType::TestCases => Some(HolderKind::TestCase),
            TableType::Keywords => Some(HolderKind::Keyword),
            TableType::Tasks => Some(HolderKind::Task),
            _ => None,
        }
    }

    pub fn from_holder_kind(kind: HolderKind) -> TableType {
        match kind {
            HolderKind::TestCase => TableType::TestCases,
            HolderKind::Keyword => TableType::Keywords,
            HolderKind::Task => TableType::Tasks,
        }
    }

    pub fn header_token_type(&self) -> TokenType {
        match self {
            TableType::Settings => TokenType::SettingsTableHeader,
            TableType::Variables => TokenType::VariablesTableHeader,
            TableType::TestCases => TokenType::TestCasesTableHeader,
            TableType::Keywords => TokenType::KeywordsTableHeader,
            TableType::Tasks => TokenType::TasksTableHeader,
        }
    }

    pub fn default_header(&self) -> &'static str {
        match self {
            TableType::Settings => "*** Settings ***",
            TableType::Variables => "*** Variables ***",
            TableType::TestCases => "*** Test Cases ***",
            TableType::Keywords => "*** Keywords ***",
            TableType::Tasks => "*** Tasks ***",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableType::Settings => "settings",
            TableType::Variables => "variables",
            TableType::TestCases => "test cases",
            TableType::Keywords => "keywords",
            TableType::Tasks => "tasks",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Model elements
// =============================================================================

/// Kind of a model element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    TableHeader(TableType),
    Setting(SettingKind),
    Variable(VariableKind),
    Holder(HolderKind),
    LocalSetting(HolderKind, LocalSettingKind),
    ExecutableRow(HolderKind),
    EmptyLine(HolderKind),
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::TableHeader(table) => write!(f, "{table} table header"),
            ModelType::Setting(kind) => write!(f, "{kind:?} setting"),
            ModelType::Variable(kind) => write!(f, "{kind:?} variable"),
            ModelType::Holder(kind) => write!(f, "{kind}"),
            ModelType::LocalSetting(holder, kind) => write!(f, "{holder} {kind:?} setting"),
            ModelType::ExecutableRow(holder) => write!(f, "{holder} executable row"),
            ModelType::EmptyLine(holder) => write!(f, "{holder} empty line"),
        }
    }
}

/// Common view of everything the model is built from.
pub trait ModelElement {
    fn model_type(&self) -> ModelType;

    /// The token that names the element.
    fn declaration(&self) -> TokenRef;

    /// The element's cells in order, without separators.
    fn element_tokens(&self) -> Vec<TokenRef>;

    /// 0-based indexes of the lines the element was parsed from.
    fn source_lines(&self) -> &[usize];

    /// Whether cells were added or removed since parsing.
    fn is_modified(&self) -> bool;

    fn begin_position(&self) -> Option<FilePosition> {
        self.element_tokens()
            .iter()
            .filter_map(|t| t.borrow().position())
            .min()
    }

    /// Whether the element must be re-rendered instead of copied from source.
    fn is_dirty(&self) -> bool {
        self.is_modified()
            || self.element_tokens().iter().any(|t| {
                let token = t.borrow();
                !token.is_artificial() && token.is_dirty()
            })
    }
}

/// Record a source line once, keeping the list ordered.
pub(crate) fn note_line(lines: &mut Vec<usize>, line: usize) {
    if let Err(index) = lines.binary_search(&line) {
        lines.insert(index, line);
    }
}

/// A `*** Name ***` line with its column names and comment.
#[derive(Debug, Clone)]
pub struct TableHeader {
    pub table: TableType,
    declaration: TokenRef,
    columns: Vec<TokenRef>,
    comments: Vec<TokenRef>,
    source_lines: Vec<usize>,
}

impl TableHeader {
    pub fn new(table: TableType, declaration: TokenRef) -> Self {
        declaration.borrow_mut().set_type(table.header_token_type());
        Self {
            table,
            declaration,
            columns: Vec::new(),
            comments: Vec::new(),
            source_lines: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        self.declaration.borrow().text().to_string()
    }

    pub fn columns(&self) -> &[TokenRef] {
        &self.columns
    }

    pub fn comments(&self) -> &[TokenRef] {
        &self.comments
    }

    pub(crate) fn add_column(&mut self, token: TokenRef) {
        if token.borrow().is_comment() || !self.comments.is_empty() {
            self.comments.push(token);
            cells::fix_comment_types(&self.comments, TokenType::TableHeaderColumn);
            return;
        }
        token.borrow_mut().set_type(TokenType::TableHeaderColumn);
        self.columns.push(token);
    }

    pub(crate) fn note_line(&mut self, line: usize) {
        note_line(&mut self.source_lines, line);
    }
}

impl ModelElement for TableHeader {
    fn model_type(&self) -> ModelType {
        ModelType::TableHeader(self.table)
    }

    fn declaration(&self) -> TokenRef {
        Rc::clone(&self.declaration)
    }

    fn element_tokens(&self) -> Vec<TokenRef> {
        let mut tokens = vec![Rc::clone(&self.declaration)];
        tokens.extend(self.columns.iter().cloned());
        tokens.extend(self.comments.iter().cloned());
        tokens
    }

    fn source_lines(&self) -> &[usize] {
        &self.source_lines
    }

    fn is_modified(&self) -> bool {
        false
    }
}

// =============================================================================
// Build messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A tolerated problem found while building the model.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildMessage {
    pub severity: Severity,
    pub message: String,
    pub position: Option<FilePosition>,
}

impl fmt::Display for BuildMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} at {}: {}", self.severity, position, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

// =============================================================================
// Robot file
// =============================================================================

/// A parsed source file: its lines and the tables built from them.
#[derive(Debug, Clone)]
pub struct RobotFile {
    path: Option<PathBuf>,
    format: FileFormat,
    pub(crate) has_bom: bool,
    lines: Vec<RobotLine>,
    settings: SettingTable,
    variables: VariableTable,
    test_cases: ExecutableTable,
    keywords: ExecutableTable,
    tasks: ExecutableTable,
    free_lines: BTreeSet<usize>,
    messages: Vec<BuildMessage>,
}

impl RobotFile {
    pub fn new(path: Option<PathBuf>, format: FileFormat) -> Self {
        Self {
            path,
            format,
            has_bom: false,
            lines: Vec::new(),
            settings: SettingTable::default(),
            variables: VariableTable::default(),
            test_cases: ExecutableTable::new(HolderKind::TestCase),
            keywords: ExecutableTable::new(HolderKind::Keyword),
            tasks: ExecutableTable::new(HolderKind::Task),
            free_lines: BTreeSet::new(),
            messages: Vec::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Path as shown in messages.
    pub fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn is_tsv(&self) -> bool {
        self.format == FileFormat::Tsv
    }

    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    pub fn lines(&self) -> &[RobotLine] {
        &self.lines
    }

    pub(crate) fn push_line(&mut self, line: RobotLine) {
        self.lines.push(line);
    }

    // --- Tables ---

    pub fn settings(&self) -> &SettingTable {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingTable {
        &mut self.settings
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableTable {
        &mut self.variables
    }

    pub fn executable_table(&self, kind: HolderKind) -> &ExecutableTable {
        match kind {
            HolderKind::TestCase => &self.test_cases,
            HolderKind::Keyword => &self.keywords,
            HolderKind::Task => &self.tasks,
        }
    }

    pub fn executable_table_mut(&mut self, kind: HolderKind) -> &mut ExecutableTable {
        match kind {
            HolderKind::TestCase => &mut self.test_cases,
            HolderKind::Keyword => &mut self.keywords,
            HolderKind::Task => &mut self.tasks,
        }
    }

    pub fn test_cases(&self) -> &ExecutableTable {
        &self.test_cases
    }

    pub fn keywords(&self) -> &ExecutableTable {
        &self.keywords
    }

    pub fn tasks(&self) -> &ExecutableTable {
        &self.tasks
    }

    /// Headers of a table, in source order.
    pub fn headers(&self, table: TableType) -> &[TableHeader] {
        match table {
            TableType::Settings => &self.settings.headers,
            TableType::Variables => &self.variables.headers,
            TableType::TestCases => &self.test_cases.headers,
            TableType::Keywords => &self.keywords.headers,
            TableType::Tasks => &self.tasks.headers,
        }
    }

    pub(crate) fn headers_mut(&mut self, table: TableType) -> &mut Vec<TableHeader> {
        match table {
            TableType::Settings => &mut self.settings.headers,
            TableType::Variables => &mut self.variables.headers,
            TableType::TestCases => &mut self.test_cases.headers,
            TableType::Keywords => &mut self.keywords.headers,
            TableType::Tasks => &mut self.tasks.headers,
        }
    }

    /// Paths of all `Resource` imports, as written.
    pub fn resource_paths(&self) -> Vec<String> {
        self.settings
            .find_all(SettingKind::Resource)
            .filter_map(SuiteSetting::import_path)
            .collect()
    }

    // --- Line bookkeeping ---

    /// Lines that belong to no element and are always written verbatim.
    pub fn free_lines(&self) -> &BTreeSet<usize> {
        &self.free_lines
    }

    pub(crate) fn add_free_line(&mut self, line: usize) {
        self.free_lines.insert(line);
    }

    pub(crate) fn remove_free_line(&mut self, line: usize) {
        self.free_lines.remove(&line);
    }

    // --- Messages ---

    pub fn messages(&self) -> &[BuildMessage] {
        &self.messages
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub(crate) fn add_message(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        position: Option<FilePosition>,
    ) {
        self.messages.push(BuildMessage {
            severity,
            message: message.into(),
            position,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rf_lexer::new_token;

    #[test]
    fn test_header_names() {
        assert_eq!(TableType::from_header_name("*** Settings ***"), Some(TableType::Settings));
        assert_eq!(TableType::from_header_name("***Setting"), Some(TableType::Settings));
        assert_eq!(TableType::from_header_name("* Test Case *"), Some(TableType::TestCases));
        assert_eq!(
            TableType::from_header_name("*** User Keywords ***"),
            Some(TableType::Keywords)
        );
        assert_eq!(TableType::from_header_name("*** Task ***"), Some(TableType::Tasks));
        assert_eq!(TableType::from_header_name("*** Comments ***"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a/b.TSV")), FileFormat::Tsv);
        assert_eq!(FileFormat::from_path(Path::new("x.resource")), FileFormat::Resource);
        assert_eq!(FileFormat::from_path(Path::new("x")), FileFormat::Robot);
        assert_eq!(FileFormat::Tsv.dialect(), SourceDialect::Tsv);
    }

    #[test]
    fn test_note_line_keeps_order_without_duplicates() {
        let mut lines = vec![2, 5];
        note_line(&mut lines, 3);
        note_line(&mut lines, 5);
        assert_eq!(lines, vec![2, 3, 5]);
    }

    #[test]
    fn test_header_columns_then_comment() {
        let mut header = TableHeader::new(TableType::TestCases, new_token("*** Test Cases ***", TokenType::Unknown));
        header.add_column(new_token("Action", TokenType::Unknown));
        header.add_column(new_token("# c", TokenType::StartHashComment));
        header.add_column(new_token("more", TokenType::Unknown));
        assert_eq!(header.columns().len(), 1);
        assert_eq!(header.comments().len(), 2);
        assert!(header.comments()[1].borrow().has_type(TokenType::CommentContinue));
    }

    #[test]
    fn test_build_message_display() {
        let message = BuildMessage {
            severity: Severity::Warning,
            message: "unknown token".to_string(),
            position: Some(FilePosition::new(3, 4, 20)),
        };
        assert_eq!(message.to_string(), "warning at 3:4: unknown token");
    }
}
