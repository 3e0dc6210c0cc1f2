use crate::line_editor::context::EditContext;
use crate::line_editor::module::{EditorModule, UnboundAction};
use tracing::debug;

pub const DEFAULT_GROUP: &str = "default";
pub const SELECT_COMPLETE_GROUP: &str = "selectcomplete";
pub const PAGER_GROUP: &str = "pager";

/// Base module: plain editing.
#[derive(Debug, Default)]
pub struct CoreModule;

impl EditorModule for CoreModule {
    fn name(&self) -> &'static str {
        "core"
    }

    fn bind_group(&self) -> &'static str {
        DEFAULT_GROUP
    }

    fn on_end_line(&mut self, ctx: &mut EditContext<'_>) {
        ctx.menu = None;
    }

    fn on_unbound(&mut self, _chord: &[u8], _ctx: &mut EditContext<'_>) -> UnboundAction {
        UnboundAction::Insert
    }
}

/// Active while long output is being paged.
#[derive(Debug, Default)]
pub struct PagerModule;

impl EditorModule for PagerModule {
    fn name(&self) -> &'static str {
        "pager"
    }

    fn bind_group(&self) -> &'static str {
        PAGER_GROUP
    }

    fn on_end_line(&mut self, ctx: &mut EditContext<'_>) {
        ctx.pager = None;
    }

    fn on_unbound(&mut self, _chord: &[u8], ctx: &mut EditContext<'_>) -> UnboundAction {
        ctx.pager_quit();
        UnboundAction::Consumed
    }

    fn on_update(&mut self, ctx: &mut EditContext<'_>) -> bool {
        ctx.pager.is_some()
    }
}

/// Active while the completion or directory popup is open.
#[derive(Debug, Default)]
pub struct SelectCompleteModule;

impl EditorModule for SelectCompleteModule {
    fn name(&self) -> &'static str {
        "selectcomplete"
    }

    fn bind_group(&self) -> &'static str {
        SELECT_COMPLETE_GROUP
    }

    fn on_end_line(&mut self, ctx: &mut EditContext<'_>) {
        ctx.close_popup();
    }

    fn on_unbound(&mut self, chord: &[u8], _ctx: &mut EditContext<'_>) -> UnboundAction {
        debug!(len = chord.len(), "unbound key in popup");
        UnboundAction::Ding
    }

    fn on_update(&mut self, ctx: &mut EditContext<'_>) -> bool {
        ctx.popup.is_some()
    }

    fn draw(&mut self, ctx: &mut EditContext<'_>) {
        ctx.draw_popup();
    }
}
