//! Writes a model back to Robot Framework text.
//!
//! Output is line driven. A source line is copied verbatim unless an element
//! owning it changed; changed elements are re-rendered at their first line,
//! and elements without source lines are placed after their previous
//! sibling. An unedited model therefore dumps to its exact input.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use rf_lexer::{EndOfLine, SeparatorType, TokenRef, TokenType};

use crate::config::ParserConfig;
use crate::model::{ModelElement, RobotFile, TableType};

const BOM: char = '\u{feff}';

/// Cell layout of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Whitespace,
    Pipe,
    Tsv,
}

/// How a block's cells are placed on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    /// Starts in the first column.
    Plain,
    /// A test case, keyword or task name.
    HolderName,
    /// A holder body element, indented by one empty cell.
    Step,
}

/// One model element as the dumper sees it.
#[derive(Debug, Clone)]
struct Block {
    kind: BlockKind,
    lines: Vec<usize>,
    dirty: bool,
    cells: Vec<String>,
}

impl Block {
    fn of(kind: BlockKind, element: &dyn ModelElement) -> Self {
        Block {
            kind,
            lines: element.source_lines().to_vec(),
            dirty: element.is_dirty(),
            cells: cell_texts(&element.element_tokens()),
        }
    }

    fn synthetic_header(table: TableType) -> Self {
        Block {
            kind: BlockKind::Plain,
            lines: Vec::new(),
            dirty: true,
            cells: vec![table.default_header().to_string()],
        }
    }

    fn first_line(&self) -> Option<usize> {
        self.lines.first().copied()
    }

    fn last_line(&self) -> Option<usize> {
        self.lines.iter().max().copied()
    }

    /// Cells of the rendered line, with the step indentation.
    fn row(&self) -> Vec<String> {
        match self.kind {
            BlockKind::Step if !self.cells.is_empty() => {
                let mut row = vec![String::new()];
                row.extend(self.cells.iter().cloned());
                row
            }
            _ => self.cells.clone(),
        }
    }
}

/// Model serializer.
#[derive(Debug, Clone)]
pub struct Dumper {
    separator: String,
    line_ending: EndOfLine,
}

impl Default for Dumper {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl Dumper {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            separator: config.separator.clone(),
            line_ending: config.line_ending.as_eol(),
        }
    }

    /// Serialize a file model to text.
    pub fn dump(&self, file: &RobotFile) -> String {
        let Layout {
            blocks,
            pending,
            trailing,
        } = Layout::of(file);
        let eol = self.default_eol(file);
        let file_style = file_style(file);

        let mut owners: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, block) in blocks.iter().enumerate() {
            for line in &block.lines {
                owners.entry(*line).or_default().push(index);
            }
        }

        let mut out = String::new();
        if file.has_bom() {
            out.push(BOM);
        }
        let mut rendered: HashSet<usize> = HashSet::new();
        let empty = Vec::new();

        for (index, line) in file.lines().iter().enumerate() {
            let owned = owners.get(&index).unwrap_or(&empty);
            if file.free_lines().contains(&index) {
                out.push_str(&line.raw_text());
            } else if owned.is_empty() || owned.iter().any(|b| rendered.contains(b)) {
                // deleted, or part of an element rendered at an earlier line
            } else if owned.iter().all(|b| !blocks[*b].dirty) {
                out.push_str(&line.raw_text());
            } else {
                let starting: Vec<usize> = owned
                    .iter()
                    .copied()
                    .filter(|b| blocks[*b].first_line() == Some(index))
                    .collect();
                let last = starting
                    .iter()
                    .filter_map(|b| blocks[*b].last_line())
                    .max()
                    .unwrap_or(index);
                let style = line_style(file, index, file_style);
                let rows = merge_rows(&blocks, &starting);
                let text: Vec<String> = rows.iter().map(|r| self.render(r, style)).collect();
                out.push_str(&text.join(eol.as_str()));
                let end = file.lines().get(last).map(|l| l.eol).unwrap_or(EndOfLine::None);
                out.push_str(end.as_str());
                rendered.extend(starting);
            }

            if let Some(new_blocks) = pending.get(&index) {
                self.emit_new(&mut out, &blocks, new_blocks, file_style, eol);
            }
        }
        self.emit_new(&mut out, &blocks, &trailing, file_style, eol);
        out
    }

    /// Serialize and write to a file.
    pub fn write(&self, file: &RobotFile, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.dump(file))
    }

    fn emit_new(
        &self,
        out: &mut String,
        blocks: &[Block],
        indexes: &[usize],
        style: Style,
        eol: EndOfLine,
    ) {
        for index in indexes {
            let content = out.strip_prefix(BOM).unwrap_or(out.as_str());
            if !content.is_empty() && !content.ends_with(['\n', '\r']) {
                out.push_str(eol.as_str());
            }
            out.push_str(&self.render(&blocks[*index].row(), style));
            out.push_str(eol.as_str());
        }
    }

    /// The line ending of the file, or the configured one.
    fn default_eol(&self, file: &RobotFile) -> EndOfLine {
        file.lines()
            .iter()
            .map(|l| l.eol)
            .find(|eol| *eol != EndOfLine::None)
            .unwrap_or(self.line_ending)
    }

    fn render(&self, cells: &[String], style: Style) -> String {
        let mut cells = cells.to_vec();
        while cells.len() > 1 && cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        match style {
            Style::Tsv => cells.join("\t"),
            Style::Pipe => {
                let mut line = String::from("|");
                for cell in &cells {
                    if cell.is_empty() {
                        line.push_str(" |");
                    } else {
                        line.push(' ');
                        line.push_str(cell);
                        line.push_str(" |");
                    }
                }
                line
            }
            Style::Whitespace => {
                let last = cells.len().saturating_sub(1);
                cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        if cell.is_empty() && i > 0 && i < last {
                            "\\".to_string()
                        } else {
                            cell.clone()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&self.separator)
            }
        }
    }
}

fn cell_texts(tokens: &[TokenRef]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !t.borrow().has_type(TokenType::ForContinueArtificialToken))
        .map(|t| t.borrow().text().to_string())
        .collect()
}

/// Blocks of every table, in file order of tables.
fn collect_groups(file: &RobotFile) -> Vec<(TableType, Vec<Block>)> {
    let mut groups = Vec::new();

    let mut settings: Vec<Block> = header_blocks(file, TableType::Settings);
    for setting in file.settings().settings() {
        settings.push(Block::of(BlockKind::Plain, setting));
    }
    groups.push((TableType::Settings, settings));

    let mut variables = header_blocks(file, TableType::Variables);
    for variable in file.variables().variables() {
        variables.push(Block::of(BlockKind::Plain, &*variable.borrow()));
    }
    groups.push((TableType::Variables, variables));

    for table in [TableType::TestCases, TableType::Keywords, TableType::Tasks] {
        let mut blocks = header_blocks(file, table);
        if let Some(kind) = table.holder_kind() {
            for holder in file.executable_table(kind).holders() {
                blocks.push(Block::of(BlockKind::HolderName, holder));
                for element in holder.elements() {
                    blocks.push(Block::of(BlockKind::Step, element));
                }
            }
        }
        groups.push((table, blocks));
    }
    groups
}

fn header_blocks(file: &RobotFile, table: TableType) -> Vec<Block> {
    file.headers(table)
        .iter()
        .map(|h| Block::of(BlockKind::Plain, h))
        .collect()
}

/// Blocks in output order with the placement of those without source lines.
struct Layout {
    blocks: Vec<Block>,
    /// New blocks to emit after a source line.
    pending: BTreeMap<usize, Vec<usize>>,
    /// New blocks with no line to follow, emitted at the end.
    trailing: Vec<usize>,
}

impl Layout {
    fn of(file: &RobotFile) -> Self {
        let mut layout = Layout {
            blocks: Vec::new(),
            pending: BTreeMap::new(),
            trailing: Vec::new(),
        };
        let mut anchor: Option<usize> = None;
        for (table, group) in collect_groups(file) {
            if !group.is_empty() && file.headers(table).is_empty() {
                anchor = None;
                layout.trailing.push(layout.blocks.len());
                layout.blocks.push(Block::synthetic_header(table));
            }
            for block in group {
                let index = layout.blocks.len();
                match (block.last_line(), anchor) {
                    (Some(line), _) => anchor = Some(line),
                    (None, Some(line)) => layout.pending.entry(line).or_default().push(index),
                    (None, None) => layout.trailing.push(index),
                }
                layout.blocks.push(block);
            }
        }
        layout
    }
}

/// Rows for blocks that start on the same line. A holder name shares its
/// line with the first step.
fn merge_rows(blocks: &[Block], starting: &[usize]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut previous: Option<BlockKind> = None;
    for index in starting {
        let block = &blocks[*index];
        let row = block.row();
        match (previous, block.kind, rows.last_mut()) {
            (Some(BlockKind::HolderName), BlockKind::Step, Some(last)) if !block.cells.is_empty() => {
                last.extend(block.cells.iter().cloned());
            }
            _ => rows.push(row),
        }
        previous = Some(block.kind);
    }
    rows
}

fn file_style(file: &RobotFile) -> Style {
    if file.is_tsv() {
        return Style::Tsv;
    }
    let first = file.lines().iter().find_map(|l| l.separator_style());
    match first {
        Some(SeparatorType::Pipe) => Style::Pipe,
        _ => Style::Whitespace,
    }
}

fn line_style(file: &RobotFile, index: usize, fallback: Style) -> Style {
    if file.is_tsv() {
        return Style::Tsv;
    }
    match file.lines().get(index).and_then(|l| l.separator_style()) {
        Some(SeparatorType::Pipe) => Style::Pipe,
        Some(SeparatorType::TabulatorOrDoubleSpace) => Style::Whitespace,
        None => fallback,
    }
}
