//! Structural edits of a parsed model.
//!
//! Every edit goes through an updater so tokens, element bookkeeping and
//! the dumper's view of what changed stay consistent.

pub mod executables;
pub mod settings;
pub mod variables;

pub use executables::{ExecutablesUpdater, LocalSettingOperation};
pub use settings::{SettingOperation, SettingsUpdater};
pub use variables::{DetailInput, VariableDetailEditor, VariablesUpdater};

/// Operation names used in missing-handler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Insert,
    Update,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Insert => write!(f, "insert"),
            Operation::Update => write!(f, "update"),
        }
    }
}

/// Errors raised by model edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpdateError {
    #[error("Unable to {operation} {target}. Operation handler is missing")]
    MissingHandler { operation: Operation, target: String },

    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_handler_message() {
        let err = UpdateError::MissingHandler {
            operation: Operation::Insert,
            target: "keyword [Setup] setting".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unable to insert keyword [Setup] setting. Operation handler is missing"
        );
    }
}
