//! Rules shared by every table: headers, comments and `...` continuations.

use rf_lexer::{escape, HolderKind, RobotToken, TokenRef, TokenType};

use super::{ElementRef, MappingContext, TokenMapper};
use crate::model::executables::RobotExecutableRow;
use crate::model::{ExecutableElement, Severity, TableHeader, TableType};
use crate::state::ParsingState;

const CONTINUE_MARKER: &str = "...";

// =============================================================================
// Table headers
// =============================================================================

/// `*** Name ***` in the first cell of a line.
pub struct HeaderMapper;

impl TokenMapper for HeaderMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        ctx.position.is_really_first_element() && token.text().trim_start().starts_with('*')
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let name = token.borrow().text().to_string();
        ctx.states.clear();
        match TableType::from_header_name(&name) {
            Some(table) => {
                let mut header = TableHeader::new(table, token.clone());
                header.note_line(ctx.line_index);
                ctx.file.headers_mut(table).push(header);
                ctx.states.push(ParsingState::TableHeader(table));
                *ctx.target = Some(ElementRef::Header(table));
            }
            None => {
                token.borrow_mut().set_type(TokenType::UserOwnTableHeader);
                ctx.states.push(ParsingState::Trash);
                let message = format!("Unrecognized table header '{}'", name.trim());
                ctx.report(Severity::Warning, message, &token.borrow());
            }
        }
    }
}

/// Column names following a table header on its line.
pub struct HeaderColumnMapper;

impl TokenMapper for HeaderColumnMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        matches!(ctx.states.top(), Some(ParsingState::TableHeader(_)))
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let Some(table) = ctx.states.current_table() else {
            return;
        };
        match ctx.file.headers_mut(table).last_mut() {
            Some(header) => header.add_column(token.clone()),
            None => {
                let message = format!("Column '{}' has no table header", token.borrow().text());
                ctx.report(Severity::Error, message, &token.borrow());
            }
        }
    }
}

// =============================================================================
// Comments
// =============================================================================

/// A `#` cell and everything after it on the line.
pub struct CommentMapper;

impl TokenMapper for CommentMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        escape::is_comment_start(token.text())
            || ctx
                .line
                .tokens()
                .any(|t| t.borrow().has_type(TokenType::StartHashComment))
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let opened = ctx
            .line
            .tokens()
            .any(|t| t.borrow().has_type(TokenType::StartHashComment));
        let comment_type = if opened {
            TokenType::CommentContinue
        } else {
            TokenType::StartHashComment
        };
        token.borrow_mut().set_type(comment_type);

        let target = match *ctx.target {
            Some(target) => target,
            None => match comment_row_target(ctx) {
                Some(target) => target,
                None => return,
            },
        };
        *ctx.target = Some(target);
        attach_comment(ctx, target, token);
    }
}

/// A comment-only line inside a holder becomes a row with an empty action.
fn comment_row_target(ctx: &mut MappingContext<'_>) -> Option<ElementRef> {
    if ctx.states.is_in_trash() {
        return None;
    }
    let kind = ctx.states.current_holder_kind()?;
    let table = ctx.file.executable_table_mut(kind);
    let holder_index = table.holders().len().checked_sub(1)?;
    let holder = table.last_mut()?;
    let mut row = RobotExecutableRow::new(kind);
    row.note_line(ctx.line_index);
    holder.push(ExecutableElement::Row(row));
    let element_index = holder.elements().len() - 1;
    ctx.states.push(ParsingState::ExecutableRow(kind));
    Some(ElementRef::HolderElement(kind, holder_index, element_index))
}

fn attach_comment(ctx: &mut MappingContext<'_>, target: ElementRef, token: &TokenRef) {
    let token = token.clone();
    match target {
        ElementRef::Header(table) => {
            if let Some(header) = ctx.file.headers_mut(table).last_mut() {
                header.add_column(token);
            }
        }
        ElementRef::Setting(index) => {
            if let Some(setting) = ctx.file.settings_mut().setting_mut(index) {
                setting.add_comment(token);
            }
        }
        ElementRef::Variable(index) => {
            if let Some(variable) = ctx.file.variables().get(index) {
                variable.borrow_mut().add_comment(token);
            }
        }
        ElementRef::Holder(kind, holder_index) => {
            let line_index = ctx.line_index;
            let Some(holder) = ctx.file.executable_table_mut(kind).holder_mut(holder_index) else {
                return;
            };
            let mut row = RobotExecutableRow::new(kind);
            row.note_line(line_index);
            row.add_comment(token);
            holder.push(ExecutableElement::Row(row));
            let element_index = holder.elements().len() - 1;
            ctx.states.push(ParsingState::ExecutableRow(kind));
            *ctx.target = Some(ElementRef::HolderElement(kind, holder_index, element_index));
        }
        ElementRef::HolderElement(kind, holder_index, element_index) => {
            let element = ctx
                .file
                .executable_table_mut(kind)
                .holder_mut(holder_index)
                .and_then(|h| h.element_mut(element_index));
            match element {
                Some(ExecutableElement::Row(row)) => row.add_comment(token),
                Some(ExecutableElement::Setting(setting)) => setting.add_comment(token),
                _ => {}
            }
        }
    }
}

// =============================================================================
// Continuation
// =============================================================================

/// A leading `...` that continues the previous element.
pub struct ContinueMapper;

impl TokenMapper for ContinueMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        if token.text().trim() != CONTINUE_MARKER || ctx.states.is_in_trash() {
            return false;
        }
        match ctx.states.current_table() {
            Some(table) => ctx
                .position
                .is_continue_previous_line_first_token(table.holder_kind().is_some()),
            None => false,
        }
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        token.borrow_mut().set_type(TokenType::PreviousLineContinue);
        let line_index = ctx.line_index;
        match ctx.states.current_table() {
            Some(TableType::Settings) => {
                let settings = ctx.file.settings_mut();
                let index = settings.settings().len().checked_sub(1);
                if let (Some(index), Some(setting)) = (index, settings.last_mut()) {
                    setting.note_line(line_index);
                    let kind = setting.kind();
                    ctx.states.push(ParsingState::SettingDeclaration(kind));
                    *ctx.target = Some(ElementRef::Setting(index));
                }
            }
            Some(TableType::Variables) => {
                let index = ctx.file.variables().variables().len().checked_sub(1);
                if let (Some(index), Some(variable)) = (index, ctx.file.variables().last()) {
                    variable.borrow_mut().note_line(line_index);
                    ctx.states.push(ParsingState::VariableDeclaration);
                    *ctx.target = Some(ElementRef::Variable(index));
                }
            }
            Some(table) => {
                let Some(kind) = table.holder_kind() else {
                    return;
                };
                continue_in_holder(ctx, kind, token);
            }
            None => {}
        }
    }
}

/// Reopen a local setting, otherwise start a row the fixer merges later.
fn continue_in_holder(ctx: &mut MappingContext<'_>, kind: HolderKind, token: &TokenRef) {
    let line_index = ctx.line_index;
    let table = ctx.file.executable_table_mut(kind);
    let Some(holder_index) = table.holders().len().checked_sub(1) else {
        return;
    };
    let Some(holder) = table.last_mut() else {
        return;
    };
    let reopened = match holder.last_mut() {
        Some(ExecutableElement::Setting(setting)) => {
            setting.note_line(line_index);
            true
        }
        _ => false,
    };
    if reopened {
        let element_index = holder.elements().len() - 1;
        ctx.states.push(ParsingState::LocalSettingDeclaration(kind));
        *ctx.target = Some(ElementRef::HolderElement(kind, holder_index, element_index));
        return;
    }
    let mut row = RobotExecutableRow::with_action(kind, token.clone());
    row.note_line(line_index);
    holder.push(ExecutableElement::Row(row));
    let element_index = holder.elements().len() - 1;
    ctx.states.push(ParsingState::ExecutableRow(kind));
    *ctx.target = Some(ElementRef::HolderElement(kind, holder_index, element_index));
}
