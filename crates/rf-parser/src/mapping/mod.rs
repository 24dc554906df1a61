//! Rules that attach classified tokens to the model.
//!
//! Each cell of a line is offered to the rules of a [`MapperRegistry`] in
//! order: the common rules, the rules of the current table, then the
//! fallbacks. The first rule whose `can_map` accepts the token maps it.

pub mod common;
pub mod executables;
pub mod fallback;
pub mod settings;
pub mod variables;

use std::collections::HashMap;

use rf_lexer::{HolderKind, PositionInformation, RobotLine, RobotToken, TokenRef};

use crate::model::{RobotFile, Severity, TableType};
use crate::state::ParsingStateStack;

/// The model element the current line contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    Header(TableType),
    Setting(usize),
    Variable(usize),
    /// A holder name line.
    Holder(HolderKind, usize),
    /// An element of a holder body: kind, holder index, element index.
    HolderElement(HolderKind, usize, usize),
}

/// Everything a rule may read or change while mapping one token.
pub struct MappingContext<'a> {
    pub file: &'a mut RobotFile,
    pub states: &'a mut ParsingStateStack,
    /// The line built so far, without the token being mapped.
    pub line: &'a RobotLine,
    /// 0-based index of the line in the file.
    pub line_index: usize,
    /// Layout of the line with the token as its last element.
    pub position: PositionInformation,
    pub target: &'a mut Option<ElementRef>,
}

impl MappingContext<'_> {
    /// Record a tolerated problem as a build message and a log entry.
    pub fn report(&mut self, severity: Severity, message: String, token: &RobotToken) {
        match severity {
            Severity::Error => log::error!("{}: {message}", self.file.display_path()),
            Severity::Warning => log::warn!("{}: {message}", self.file.display_path()),
            Severity::Info => log::info!("{}: {message}", self.file.display_path()),
        }
        self.file.add_message(severity, message, token.position());
    }
}

/// A mapping rule.
pub trait TokenMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool;

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef);
}

/// Ordered rule sets used by the parser.
pub struct MapperRegistry {
    common: Vec<Box<dyn TokenMapper>>,
    tables: HashMap<TableType, Vec<Box<dyn TokenMapper>>>,
    fallback: Vec<Box<dyn TokenMapper>>,
}

impl MapperRegistry {
    /// A registry without any rules.
    pub fn empty() -> Self {
        Self {
            common: Vec::new(),
            tables: HashMap::new(),
            fallback: Vec::new(),
        }
    }

    pub fn with_common(mut self, mapper: impl TokenMapper + 'static) -> Self {
        self.common.push(Box::new(mapper));
        self
    }

    pub fn with_table(mut self, table: TableType, mapper: impl TokenMapper + 'static) -> Self {
        self.tables.entry(table).or_default().push(Box::new(mapper));
        self
    }

    pub fn with_fallback(mut self, mapper: impl TokenMapper + 'static) -> Self {
        self.fallback.push(Box::new(mapper));
        self
    }

    /// Map a token with the first accepting rule. Returns whether a rule accepted it.
    pub fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) -> bool {
        let table_rules = ctx
            .states
            .current_table()
            .and_then(|t| self.tables.get(&t))
            .map(|rules| rules.as_slice())
            .unwrap_or(&[]);
        let rules = self
            .common
            .iter()
            .chain(table_rules.iter())
            .chain(self.fallback.iter());
        for rule in rules {
            let accepted = rule.can_map(ctx, &token.borrow());
            if accepted {
                rule.map(ctx, token);
                return true;
            }
        }
        false
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        let mut registry = MapperRegistry::empty()
            .with_common(common::HeaderMapper)
            .with_common(common::CommentMapper)
            .with_common(common::HeaderColumnMapper)
            .with_common(common::ContinueMapper)
            .with_table(TableType::Settings, settings::SettingDeclarationMapper)
            .with_table(TableType::Settings, settings::SettingValueMapper)
            .with_table(TableType::Variables, variables::VariableDeclarationMapper)
            .with_table(TableType::Variables, variables::VariableValueMapper);
        for kind in HolderKind::ALL {
            let table = TableType::from_holder_kind(kind);
            registry = registry
                .with_table(table, executables::HolderNameMapper(kind))
                .with_table(table, executables::EmptyCellMapper(kind))
                .with_table(table, executables::LocalSettingMapper(kind))
                .with_table(table, executables::LocalSettingValueMapper(kind))
                .with_table(table, executables::ActionMapper(kind))
                .with_table(table, executables::ArgumentMapper(kind));
        }
        registry
            .with_fallback(fallback::GarbageBeforeFirstTableMapper)
            .with_fallback(fallback::TrashMapper)
            .with_fallback(fallback::BlankCellMapper)
            .with_fallback(fallback::UnknownTokenMapper)
    }
}
