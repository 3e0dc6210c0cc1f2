//! Editor modules
//!
//! The session keeps a stack of modules. The innermost one chooses the bind
//! group keys resolve through and decides what happens to unbound input.

use crate::line_editor::context::EditContext;

/// What to do with a key sequence that has no binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnboundAction {
    /// Insert it as text when it is printable.
    Insert,
    Ding,
    /// The module handled it.
    Consumed,
}

pub trait EditorModule {
    fn name(&self) -> &'static str;

    /// Bind group used while this module is innermost.
    fn bind_group(&self) -> &'static str;

    fn on_begin_line(&mut self, _ctx: &mut EditContext<'_>) {}

    fn on_end_line(&mut self, _ctx: &mut EditContext<'_>) {}

    fn on_unbound(&mut self, chord: &[u8], ctx: &mut EditContext<'_>) -> UnboundAction;

    /// Called after every dispatched key. Returning false pops the module.
    fn on_update(&mut self, _ctx: &mut EditContext<'_>) -> bool {
        true
    }

    /// Draw anything the module shows besides the line.
    fn draw(&mut self, _ctx: &mut EditContext<'_>) {}
}
