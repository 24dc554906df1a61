use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::escape;

/// A position in source text.
///
/// `line` is 1-based, `column` and `offset` are 0-based character indexes.
/// Ordering is by line, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilePosition {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl FilePosition {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The kind of executable-steps holder a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HolderKind {
    TestCase,
    Keyword,
    Task,
}

impl HolderKind {
    pub const ALL: [HolderKind; 3] = [HolderKind::TestCase, HolderKind::Keyword, HolderKind::Task];
}

impl fmt::Display for HolderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolderKind::TestCase => write!(f, "test case"),
            HolderKind::Keyword => write!(f, "keyword"),
            HolderKind::Task => write!(f, "task"),
        }
    }
}

/// Semantic classification of a cell.
///
/// A token may carry several types at once, e.g. a `FOR` action is both
/// `Action(TestCase)` and `ForToken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // General
    Unknown,
    PrettyAlignSpace,
    PreviousLineContinue,
    StartHashComment,
    CommentContinue,
    EmptyLine,
    Assignment,

    // Table headers
    SettingsTableHeader,
    VariablesTableHeader,
    TestCasesTableHeader,
    KeywordsTableHeader,
    TasksTableHeader,
    UserOwnTableHeader,
    TableHeaderColumn,

    // Settings table: imports
    SettingLibraryDeclaration,
    SettingLibraryName,
    SettingLibraryArgument,
    SettingLibraryAlias,
    SettingLibraryAliasValue,
    SettingResourceDeclaration,
    SettingResourceFileName,
    SettingResourceUnwantedArgument,
    SettingVariablesDeclaration,
    SettingVariablesFileName,
    SettingVariablesArgument,

    // Settings table: documentation and metadata
    SettingDocumentationDeclaration,
    SettingDocumentationText,
    SettingMetadataDeclaration,
    SettingMetadataKey,
    SettingMetadataValue,

    // Settings table: keyword based settings
    SettingSuiteSetupDeclaration,
    SettingSuiteSetupKeywordName,
    SettingSuiteSetupKeywordArgument,
    SettingSuiteTeardownDeclaration,
    SettingSuiteTeardownKeywordName,
    SettingSuiteTeardownKeywordArgument,
    SettingTestSetupDeclaration,
    SettingTestSetupKeywordName,
    SettingTestSetupKeywordArgument,
    SettingTestTeardownDeclaration,
    SettingTestTeardownKeywordName,
    SettingTestTeardownKeywordArgument,
    SettingTestTemplateDeclaration,
    SettingTestTemplateKeywordName,
    SettingTestTemplateKeywordUnwantedArgument,
    SettingTestTimeoutDeclaration,
    SettingTestTimeoutValue,
    SettingTestTimeoutMessage,

    // Settings table: tags
    SettingForceTagsDeclaration,
    SettingForceTags,
    SettingDefaultTagsDeclaration,
    SettingDefaultTags,

    SettingUnknownDeclaration,
    SettingUnknownArgument,

    // Variables table
    VariablesScalarDeclaration,
    VariablesListDeclaration,
    VariablesDictionaryDeclaration,
    VariablesWrongDefined,
    VariablesValue,

    // Executable-steps holders
    HolderName(HolderKind),
    EmptyCell(HolderKind),
    Action(HolderKind),
    ActionArgument(HolderKind),
    LocalSettingDeclaration(HolderKind),
    LocalSettingArgument(HolderKind),

    // Loops
    ForToken,
    InToken,
    ForContinueToken,
    ForContinueArtificialToken,
    ForEndToken,
    ForWithEndContinuation,
}

impl TokenType {
    pub fn is_comment(&self) -> bool {
        matches!(self, TokenType::StartHashComment | TokenType::CommentContinue)
    }

    pub fn is_table_header(&self) -> bool {
        matches!(
            self,
            TokenType::SettingsTableHeader
                | TokenType::VariablesTableHeader
                | TokenType::TestCasesTableHeader
                | TokenType::KeywordsTableHeader
                | TokenType::TasksTableHeader
                | TokenType::UserOwnTableHeader
        )
    }
}

/// A classified cell of a Robot Framework line.
///
/// Tokens created by edits have no position.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotToken {
    text: String,
    types: Vec<TokenType>,
    position: Option<FilePosition>,
    dirty: bool,
}

/// Shared handle to a token.
///
/// The same token is referenced from its line and from the model element
/// that owns it, so text edits are visible through both.
pub type TokenRef = Rc<RefCell<RobotToken>>;

impl RobotToken {
    pub fn new(text: impl Into<String>, kind: TokenType, position: FilePosition) -> Self {
        Self {
            text: text.into(),
            types: vec![kind],
            position: Some(position),
            dirty: false,
        }
    }

    /// Create a token that does not come from source text.
    pub fn create(text: impl Into<String>, kind: TokenType) -> Self {
        Self {
            text: text.into(),
            types: vec![kind],
            position: None,
            dirty: true,
        }
    }

    pub fn into_ref(self) -> TokenRef {
        Rc::new(RefCell::new(self))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty = true;
    }

    /// Text with escape sequences resolved.
    pub fn display_text(&self) -> String {
        escape::unescape(&self.text)
    }

    pub fn types(&self) -> &[TokenType] {
        &self.types
    }

    /// The first assigned type, `Unknown` for an untyped token.
    pub fn primary_type(&self) -> TokenType {
        self.types.first().copied().unwrap_or(TokenType::Unknown)
    }

    /// Replace all types with a single one.
    pub fn set_type(&mut self, kind: TokenType) {
        self.types.clear();
        self.types.push(kind);
    }

    pub fn add_type(&mut self, kind: TokenType) {
        if !self.types.contains(&kind) {
            self.types.push(kind);
        }
    }

    pub fn remove_type(&mut self, kind: TokenType) {
        self.types.retain(|t| *t != kind);
    }

    pub fn has_type(&self, kind: TokenType) -> bool {
        self.types.contains(&kind)
    }

    pub fn is_comment(&self) -> bool {
        self.types.iter().any(TokenType::is_comment)
    }

    pub fn position(&self) -> Option<FilePosition> {
        self.position
    }

    pub fn is_artificial(&self) -> bool {
        self.position.is_none()
    }

    /// 1-based line number, if the token comes from source.
    pub fn line_number(&self) -> Option<usize> {
        self.position.map(|p| p.line)
    }

    pub fn start_offset(&self) -> Option<usize> {
        self.position.map(|p| p.offset)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl fmt::Display for RobotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Convenience for creating a shared artificial token.
pub fn new_token(text: impl Into<String>, kind: TokenType) -> TokenRef {
    RobotToken::create(text, kind).into_ref()
}
