//! Rules for tokens no table rule accepts.

use rf_lexer::{RobotToken, TokenRef, TokenType};

use super::{MappingContext, TokenMapper};
use crate::model::Severity;

/// Text before the first table header is ignored.
pub struct GarbageBeforeFirstTableMapper;

impl TokenMapper for GarbageBeforeFirstTableMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        ctx.states.is_empty()
    }

    fn map(&self, _ctx: &mut MappingContext<'_>, token: &TokenRef) {
        log::debug!("ignoring '{}' before the first table", token.borrow().text());
    }
}

/// Content of an unrecognized table is kept but not modelled.
pub struct TrashMapper;

impl TokenMapper for TrashMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        ctx.states.is_in_trash()
    }

    fn map(&self, _ctx: &mut MappingContext<'_>, _token: &TokenRef) {}
}

/// Empty cells outside of any element, e.g. the first cell of a pipe line.
pub struct BlankCellMapper;

impl TokenMapper for BlankCellMapper {
    fn can_map(&self, _ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        token.text().trim().is_empty()
    }

    fn map(&self, _ctx: &mut MappingContext<'_>, _token: &TokenRef) {}
}

/// Anything else is classified unknown and reported.
pub struct UnknownTokenMapper;

impl TokenMapper for UnknownTokenMapper {
    fn can_map(&self, _ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        true
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        token.borrow_mut().set_type(TokenType::Unknown);
        let message = format!("Unrecognized token '{}'", token.borrow().text());
        ctx.report(Severity::Warning, message, &token.borrow());
    }
}
