//! Parser configuration from `rfmodel.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use rf_lexer::EndOfLine;

/// Line ending written after elements that have no source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_eol(&self) -> EndOfLine {
        match self {
            LineEnding::Lf => EndOfLine::Lf,
            LineEnding::CrLf => EndOfLine::CrLf,
        }
    }
}

/// Settings that shape parsing and dumping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Cell separator for re-rendered elements of whitespace separated files.
    pub separator: String,

    /// Line ending for new lines when the file gives no hint.
    pub line_ending: LineEnding,

    /// Whether `Resource` imports are parsed transitively.
    pub resolve_resources: bool,

    /// Deepest chain of nested resource imports that is followed.
    pub max_import_depth: usize,

    /// File extensions accepted as resource files.
    pub resource_extensions: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            separator: "    ".to_string(),
            line_ending: LineEnding::Lf,
            resolve_resources: true,
            max_import_depth: 32,
            resource_extensions: ["robot", "resource", "txt", "tsv"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl ParserConfig {
    /// Load configuration from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ParserConfig)` - Loaded configuration, missing keys take defaults
    /// * `Err(ConfigError)` - Error reading or parsing the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        if config.separator.is_empty() {
            return Err(ConfigError::Invalid("separator must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(&path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.resource_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Errors that can occur when loading or saving parser configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_keys_take_defaults() {
        let config = ParserConfig::from_toml("separator = \"  \"\n").unwrap();
        assert_eq!(config.separator, "  ");
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert!(config.resolve_resources);
    }

    #[test]
    fn test_line_ending_is_lowercase() {
        let config = ParserConfig::from_toml("line_ending = \"crlf\"\n").unwrap();
        assert_eq!(config.line_ending, LineEnding::CrLf);
        assert_eq!(config.line_ending.as_eol(), EndOfLine::CrLf);
    }

    #[test]
    fn test_empty_separator_is_rejected() {
        let err = ParserConfig::from_toml("separator = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rfmodel.toml");
        let config = ParserConfig {
            max_import_depth: 4,
            ..ParserConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ParserConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_extension_check_ignores_case() {
        assert!(ParserConfig::default().accepts_extension("ROBOT"));
        assert!(!ParserConfig::default().accepts_extension("py"));
    }
}
