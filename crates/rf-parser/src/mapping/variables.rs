//! Rules of the variables table.

use rf_lexer::{RobotToken, TokenRef};

use super::{ElementRef, MappingContext, TokenMapper};
use crate::model::{RobotVariable, Severity, TableType, VariableKind};
use crate::state::ParsingState;

/// `${name}`, `@{name}` or `&{name}` in the first cell.
pub struct VariableDeclarationMapper;

impl TokenMapper for VariableDeclarationMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        ctx.states.top() == Some(ParsingState::TableInside(TableType::Variables))
            && !token.text().trim().is_empty()
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let mut variable = RobotVariable::new(token.clone());
        if variable.kind() == VariableKind::Invalid {
            let message = format!("Invalid variable declaration '{}'", variable.name());
            ctx.report(Severity::Warning, message, &token.borrow());
        }
        variable.note_line(ctx.line_index);
        let table = ctx.file.variables_mut();
        table.push(variable);
        let index = table.variables().len() - 1;
        ctx.states.push(ParsingState::VariableDeclaration);
        *ctx.target = Some(ElementRef::Variable(index));
    }
}

/// Values of the variable declared on the line.
pub struct VariableValueMapper;

impl TokenMapper for VariableValueMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        ctx.states.top() == Some(ParsingState::VariableDeclaration)
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        if let Some(variable) = ctx.file.variables().last() {
            variable.borrow_mut().add_value(token.clone());
        }
    }
}
