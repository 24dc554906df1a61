//! Line-driven parser for Robot Framework test data.
//!
//! Scans the source into lines of separators and cells (from `rf-lexer`),
//! offers every cell to the rules of a [`MapperRegistry`], and keeps each
//! finished line in the model so the dumper can write it back unchanged.
//! Holder bodies are normalized by the [`ExecutableUnitFixer`] at the end.

use std::fs;
use std::path::{Path, PathBuf};

use rf_lexer::{
    FilePosition, FragmentKind, HolderKind, LineElement, PositionInformation, RobotLine,
    RobotToken, ScannedLine, ScannedSource, Scanner, Separator, TokenRef, TokenType,
};

use crate::config::ParserConfig;
use crate::fixer::ExecutableUnitFixer;
use crate::mapping::{ElementRef, MapperRegistry, MappingContext};
use crate::model::{ExecutableElement, FileFormat, RobotEmptyRow, RobotFile};
use crate::state::ParsingStateStack;
use crate::ParseError;

/// Robot Framework file parser.
///
/// Holds the mapping rules and the configuration; a single parser can parse
/// any number of files.
pub struct RobotParser {
    registry: MapperRegistry,
    config: ParserConfig,
}

impl Default for RobotParser {
    fn default() -> Self {
        Self::new(MapperRegistry::default(), ParserConfig::default())
    }
}

impl RobotParser {
    /// Create a parser with explicit rules and configuration.
    pub fn new(registry: MapperRegistry, config: ParserConfig) -> Self {
        Self { registry, config }
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self::new(MapperRegistry::default(), config)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `.robot` source held in memory with the standard rules.
    pub fn parse(source: &str) -> Result<RobotFile, ParseError> {
        RobotParser::default().parse_str(source, None, FileFormat::Robot)
    }

    /// Parse source text of the given format.
    pub fn parse_str(
        &self,
        source: &str,
        path: Option<PathBuf>,
        format: FileFormat,
    ) -> Result<RobotFile, ParseError> {
        let scanned = Scanner::scan(source, format.dialect());
        self.build(scanned, path, format)
    }

    /// Read and parse a file. The format follows the file extension.
    pub fn parse_file(&self, path: &Path) -> Result<RobotFile, ParseError> {
        let bytes = fs::read(path).map_err(|e| ParseError {
            message: format!("Cannot read {}: {e}", path.display()),
            line: 0,
            column: 0,
        })?;
        let source = Scanner::decode(&bytes)?;
        log::debug!("parsing {}", path.display());
        self.parse_str(&source, Some(path.to_path_buf()), FileFormat::from_path(path))
    }

    // =========================================================================
    // Model building
    // =========================================================================

    fn build(
        &self,
        scanned: ScannedSource,
        path: Option<PathBuf>,
        format: FileFormat,
    ) -> Result<RobotFile, ParseError> {
        let mut file = RobotFile::new(path, format);
        file.has_bom = scanned.has_bom;
        let mut states = ParsingStateStack::new();
        let mut next_offset = 0;

        for (line_index, scanned_line) in scanned.lines.into_iter().enumerate() {
            states.update_statuses_for_new_line();
            let line_start = scanned_line
                .fragments
                .first()
                .map(|f| f.position.offset)
                .unwrap_or(next_offset);
            next_offset = line_end(&scanned_line, line_start);

            let mut target: Option<ElementRef> = None;
            let line = self.map_line(&mut file, &mut states, scanned_line, line_index, &mut target);

            if is_blank(&line) {
                let line = blank_line(&mut file, &states, line, line_index, line_start);
                file.push_line(line);
                continue;
            }
            if target.is_none() {
                file.add_free_line(line_index);
            }
            file.push_line(line);
        }

        let fixer = ExecutableUnitFixer::new(file.is_tsv());
        let display_path = file.display_path();
        for kind in HolderKind::ALL {
            for holder in file.executable_table_mut(kind).holders_mut() {
                fixer.fix(&display_path, holder)?;
            }
        }
        Ok(file)
    }

    /// Build one line, mapping its cells as they are added.
    fn map_line(
        &self,
        file: &mut RobotFile,
        states: &mut ParsingStateStack,
        scanned: ScannedLine,
        line_index: usize,
        target: &mut Option<ElementRef>,
    ) -> RobotLine {
        let mut line = RobotLine::new(scanned.number);
        line.eol = scanned.eol;
        for fragment in scanned.fragments {
            match fragment.kind {
                FragmentKind::Separator(kind) => {
                    line.push(LineElement::Separator(Separator {
                        kind,
                        text: fragment.text,
                        position: fragment.position,
                    }));
                }
                FragmentKind::PrettyAlign => {
                    let token =
                        RobotToken::new(fragment.text, TokenType::PrettyAlignSpace, fragment.position);
                    line.push(LineElement::Token(token.into_ref()));
                }
                FragmentKind::Cell => {
                    let token =
                        RobotToken::new(fragment.text, TokenType::Unknown, fragment.position).into_ref();
                    let position = PositionInformation::build(&line.elements, Some(&token.borrow()));
                    let mut ctx = MappingContext {
                        file: &mut *file,
                        states: &mut *states,
                        line: &line,
                        line_index,
                        position,
                        target: &mut *target,
                    };
                    if !self.registry.map(&mut ctx, &token) {
                        log::debug!("no rule for '{}'", token.borrow().text());
                    }
                    line.push(LineElement::Token(token));
                }
            }
        }
        line
    }
}

/// Offset just past the end-of-line marker of a scanned line.
fn line_end(line: &ScannedLine, line_start: usize) -> usize {
    let content_end = line
        .fragments
        .last()
        .map(|f| f.position.offset + f.text.chars().count())
        .unwrap_or(line_start);
    content_end + line.eol.as_str().chars().count()
}

/// A line with nothing but alignment whitespace.
fn is_blank(line: &RobotLine) -> bool {
    line.elements.iter().all(|e| e.is_pretty_align())
}

/// Give a blank line its empty-line token and attach it to the open holder.
fn blank_line(
    file: &mut RobotFile,
    states: &ParsingStateStack,
    mut line: RobotLine,
    line_index: usize,
    line_start: usize,
) -> RobotLine {
    let token: TokenRef = match line.elements.first().and_then(|e| e.as_token()) {
        Some(token) => {
            token.borrow_mut().add_type(TokenType::EmptyLine);
            token.clone()
        }
        None => {
            let position = FilePosition::new(line.number, 0, line_start);
            let token = RobotToken::new("", TokenType::EmptyLine, position).into_ref();
            line.push(LineElement::Token(token.clone()));
            token
        }
    };

    let holder = if states.is_in_trash() {
        None
    } else {
        states
            .current_holder_kind()
            .and_then(|kind| file.executable_table_mut(kind).last_mut())
    };
    match holder {
        Some(holder) => {
            let mut row = RobotEmptyRow::new(holder.kind(), token);
            row.note_line(line_index);
            holder.push(ExecutableElement::Empty(row));
        }
        None => file.add_free_line(line_index),
    }
    line
}
