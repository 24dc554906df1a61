//! Robot Framework Parser
//!
//! Builds a lossless model of Robot Framework test data: every line keeps
//! its separators, alignment whitespace and comments, so an unedited model
//! dumps back to the exact input. On top of the model sit the update
//! operations used by editors and the resolution of `Resource` imports.
//!
//! # Example
//!
//! ```
//! use rf_parser::{Dumper, RobotParser};
//!
//! let source = "*** Test Cases ***\nGreet\n    Log    hello\n";
//! let file = RobotParser::parse(source).unwrap();
//! assert_eq!(file.test_cases().holders()[0].name_text(), "Greet");
//! assert_eq!(Dumper::default().dump(&file), source);
//! ```

pub mod config;
pub mod dumper;
pub mod fixer;
pub mod imports;
pub mod mapping;
pub mod model;
pub mod parser;
pub mod state;
pub mod update;

pub use config::{ConfigError, ParserConfig};
pub use dumper::Dumper;
pub use fixer::{ExecutableUnitFixer, FixerError};
pub use imports::{ImportError, ResourceImportReference, ResourceImporter};
pub use mapping::MapperRegistry;
pub use model::{FileFormat, ModelElement, RobotFile, TableType};
pub use parser::RobotParser;
pub use update::UpdateError;

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<rf_lexer::LexerError> for ParseError {
    fn from(e: rf_lexer::LexerError) -> Self {
        ParseError {
            message: e.message,
            line: e.line,
            column: e.column,
        }
    }
}

impl From<FixerError> for ParseError {
    fn from(e: FixerError) -> Self {
        ParseError {
            message: format!("{}: {}", e.path, e.message),
            line: e.line,
            column: e.column,
        }
    }
}
