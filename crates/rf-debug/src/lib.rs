//! Robot Framework execution tracking for debuggers
//!
//! A runner reports which suite, test and keyword starts and ends. This
//! crate maps those events back to the rows of the parsed files, so the
//! line a keyword was called from can be shown while the run is paused.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use rf_debug::RobotDebugExecutionContext;
//! use rf_parser::RobotParser;
//!
//! let parser = RobotParser::default();
//! let mut context = RobotDebugExecutionContext::new();
//! context.start_suite(Path::new("suite.robot"), &parser);
//! context.start_test("Login Works");
//! context.start_keyword("BuiltIn.Log", "Keyword", &[]);
//! if let Some(position) = context.find_keyword_position() {
//!     println!("{}:{:?}", position.path.display(), position.line);
//! }
//! ```

pub mod context;
pub mod execution;
pub mod finder;

pub use context::{FrameKind, KeywordContext, KeywordPosition};
pub use execution::RobotDebugExecutionContext;
pub use finder::{Definition, Sources};
