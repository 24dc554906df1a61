//! Rules of the test case, keyword and task tables, one set per holder kind.

use rf_lexer::{HolderKind, RobotToken, TokenRef, TokenType};

use super::{ElementRef, MappingContext, TokenMapper};
use crate::model::executables::{
    is_assignment_text, is_end_text, is_for_in_text, is_for_text, RowType,
};
use crate::model::{
    ExecutableElement, ExecutableHolder, LocalSetting, LocalSettingKind, RobotExecutableRow,
    Severity,
};
use crate::state::ParsingState;

fn in_table(ctx: &MappingContext<'_>, kind: HolderKind) -> bool {
    ctx.states.current_holder_kind() == Some(kind)
}

fn at_line_start(ctx: &MappingContext<'_>, kind: HolderKind) -> bool {
    matches!(
        ctx.states.top(),
        Some(ParsingState::HolderDeclaration(k)) if k == kind
    )
}

fn has_holder(ctx: &MappingContext<'_>, kind: HolderKind) -> bool {
    !ctx.file.executable_table(kind).holders().is_empty()
}

fn push_element(ctx: &mut MappingContext<'_>, kind: HolderKind, element: ExecutableElement) -> bool {
    let table = ctx.file.executable_table_mut(kind);
    let Some(holder_index) = table.holders().len().checked_sub(1) else {
        return false;
    };
    let Some(holder) = table.last_mut() else {
        return false;
    };
    holder.push(element);
    let element_index = holder.elements().len() - 1;
    *ctx.target = Some(ElementRef::HolderElement(kind, holder_index, element_index));
    true
}

fn last_element<'c>(
    ctx: &'c mut MappingContext<'_>,
    kind: HolderKind,
) -> Option<&'c mut ExecutableElement> {
    ctx.file
        .executable_table_mut(kind)
        .last_mut()
        .and_then(|h| h.last_mut())
}

// =============================================================================
// Holder declarations
// =============================================================================

/// A name in the first cell starts a new test case, keyword or task.
pub struct HolderNameMapper(pub HolderKind);

impl TokenMapper for HolderNameMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        in_table(ctx, self.0)
            && ctx.position.is_really_first_element()
            && !token.text().trim().is_empty()
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let kind = self.0;
        let mut holder = ExecutableHolder::new(kind, token.clone());
        holder.note_line(ctx.line_index);
        let table = ctx.file.executable_table_mut(kind);
        table.push(holder);
        let index = table.holders().len() - 1;
        if at_line_start(ctx, kind) {
            ctx.states.pop();
        }
        ctx.states.push(ParsingState::HolderDeclaration(kind));
        *ctx.target = Some(ElementRef::Holder(kind, index));
    }
}

/// An empty first cell, as in pipe and TSV files.
pub struct EmptyCellMapper(pub HolderKind);

impl TokenMapper for EmptyCellMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        in_table(ctx, self.0)
            && ctx.position.is_really_first_element()
            && token.text().trim().is_empty()
    }

    fn map(&self, _ctx: &mut MappingContext<'_>, token: &TokenRef) {
        token.borrow_mut().set_type(TokenType::EmptyCell(self.0));
    }
}

// =============================================================================
// Local settings
// =============================================================================

/// `[Setting]` as the first step cell.
pub struct LocalSettingMapper(pub HolderKind);

impl TokenMapper for LocalSettingMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        at_line_start(ctx, self.0)
            && has_holder(ctx, self.0)
            && LocalSettingKind::recognize(self.0, token.text()).is_some()
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let kind = self.0;
        let name = token.borrow().text().to_string();
        let setting_kind =
            LocalSettingKind::recognize(kind, &name).unwrap_or(LocalSettingKind::Unknown);
        if setting_kind == LocalSettingKind::Unknown {
            let message = format!("Unknown {kind} setting '{}'", name.trim());
            ctx.report(Severity::Warning, message, &token.borrow());
        }
        let mut setting = LocalSetting::new(kind, setting_kind, token.clone());
        setting.note_line(ctx.line_index);
        if push_element(ctx, kind, ExecutableElement::Setting(setting)) {
            ctx.states.push(ParsingState::LocalSettingDeclaration(kind));
        }
    }
}

pub struct LocalSettingValueMapper(pub HolderKind);

impl TokenMapper for LocalSettingValueMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        ctx.states.top() == Some(ParsingState::LocalSettingDeclaration(self.0))
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        if let Some(ExecutableElement::Setting(setting)) = last_element(ctx, self.0) {
            setting.add_value(token.clone());
        }
    }
}

// =============================================================================
// Executable rows
// =============================================================================

/// The first step cell that is not a setting: a keyword call or loop marker.
pub struct ActionMapper(pub HolderKind);

impl TokenMapper for ActionMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        at_line_start(ctx, self.0) && has_holder(ctx, self.0)
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let kind = self.0;
        {
            let mut t = token.borrow_mut();
            let text = t.text().to_string();
            t.set_type(TokenType::Action(kind));
            if is_for_text(&text) {
                t.add_type(TokenType::ForToken);
            } else if is_end_text(&text) {
                t.add_type(TokenType::ForEndToken);
            } else if text.trim() == "\\" {
                t.add_type(TokenType::ForContinueToken);
            } else if is_assignment_text(&text) {
                t.add_type(TokenType::Assignment);
            }
        }
        let mut row = RobotExecutableRow::with_action(kind, token.clone());
        row.note_line(ctx.line_index);
        if push_element(ctx, kind, ExecutableElement::Row(row)) {
            ctx.states.push(ParsingState::ExecutableRow(kind));
        }
    }
}

/// Cells after the action.
pub struct ArgumentMapper(pub HolderKind);

impl TokenMapper for ArgumentMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        ctx.states.top() == Some(ParsingState::ExecutableRow(self.0))
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let Some(ExecutableElement::Row(row)) = last_element(ctx, self.0) else {
            return;
        };
        let text = token.borrow().text().to_string();
        let in_loop_header = row.row_type() == RowType::For;
        let leading_assignment = row.arguments().is_empty()
            || row
                .arguments()
                .last()
                .is_some_and(|a| a.borrow().has_type(TokenType::Assignment));
        row.add_argument(token.clone());
        let mut t = token.borrow_mut();
        if in_loop_header && is_for_in_text(&text) {
            t.add_type(TokenType::InToken);
        } else if !in_loop_header
            && leading_assignment
            && row_action_is_assignment(row.action())
            && is_assignment_text(&text)
        {
            t.add_type(TokenType::Assignment);
        }
    }
}

fn row_action_is_assignment(action: &TokenRef) -> bool {
    action.borrow().has_type(TokenType::Assignment)
}
