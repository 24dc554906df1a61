//! Rules of the settings table.

use rf_lexer::{RobotToken, TokenRef};

use super::{ElementRef, MappingContext, TokenMapper};
use crate::model::settings::WITH_NAME;
use crate::model::{Severity, SettingKind, SuiteSetting, TableType};
use crate::state::ParsingState;

/// The first cell of a settings line names the setting.
pub struct SettingDeclarationMapper;

impl TokenMapper for SettingDeclarationMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, token: &RobotToken) -> bool {
        ctx.states.top() == Some(ParsingState::TableInside(TableType::Settings))
            && !token.text().trim().is_empty()
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let name = token.borrow().text().to_string();
        let kind = SettingKind::from_declaration(&name);
        if kind == SettingKind::Unknown {
            let message = format!("Unknown setting '{}'", name.trim());
            ctx.report(Severity::Warning, message, &token.borrow());
        }
        let mut setting = SuiteSetting::new(kind, token.clone());
        setting.note_line(ctx.line_index);
        let settings = ctx.file.settings_mut();
        settings.push(setting);
        let index = settings.settings().len() - 1;
        ctx.states.push(ParsingState::SettingDeclaration(kind));
        *ctx.target = Some(ElementRef::Setting(index));
    }
}

/// Cells after a setting name, including a library alias.
pub struct SettingValueMapper;

impl TokenMapper for SettingValueMapper {
    fn can_map(&self, ctx: &MappingContext<'_>, _token: &RobotToken) -> bool {
        matches!(
            ctx.states.top(),
            Some(ParsingState::SettingDeclaration(_)) | Some(ParsingState::LibraryAlias)
        )
    }

    fn map(&self, ctx: &mut MappingContext<'_>, token: &TokenRef) {
        let is_alias_marker = token.borrow().text().trim() == WITH_NAME;
        let library = ctx.states.top() == Some(ParsingState::SettingDeclaration(SettingKind::Library));
        let Some(setting) = ctx.file.settings_mut().last_mut() else {
            return;
        };
        if library && is_alias_marker && !setting.values().is_empty() {
            setting.add_alias_marker(token.clone());
            ctx.states.push(ParsingState::LibraryAlias);
        } else {
            setting.add_value(token.clone());
        }
    }
}
