//! Robot Framework Lexer
//!
//! Splits Robot Framework plain-text test data (`.robot`, `.txt`, `.tsv`,
//! `.resource`) into lines of separators and cell tokens. Tokens are shared
//! handles so the line view and a parsed model see the same text.
//!
//! # Example
//!
//! ```
//! use rf_lexer::{Scanner, SourceDialect};
//!
//! let scanned = Scanner::scan("*** Test Cases ***\n", SourceDialect::Text);
//! assert_eq!(scanned.lines.len(), 1);
//! ```

pub mod escape;
pub mod line;
pub mod position;
pub mod scanner;
pub mod token;

pub use line::{EndOfLine, LineElement, RobotLine, Separator, SeparatorType};
pub use position::PositionInformation;
pub use scanner::{Fragment, FragmentKind, ScannedLine, ScannedSource, Scanner, SourceDialect};
pub use token::{new_token, FilePosition, HolderKind, RobotToken, TokenRef, TokenType};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
