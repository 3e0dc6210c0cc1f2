//! Editing Session
//!
//! Reads key bytes, resolves them through the innermost module's bind group
//! and runs the bound command. After every key the match cache and the
//! word classifications are checked against the buffer and the line is
//! redrawn.

use crate::binder::{describe_keyseq, BindResolver, Binder, Binding, GroupId, Resolution};
use crate::cli::commands::{CommandCategory, EditCommand};
use crate::cli::editor::LineBuffer;
use crate::cli::history::HistoryCursor;
use crate::cli::input::{InputEvent, InputSource};
use crate::line_editor::context::{CommandResult, EditContext, EditFlags};
use crate::line_editor::handlers;
use crate::line_editor::module::{EditorModule, UnboundAction};
use crate::line_editor::modules::{CoreModule, PagerModule, SelectCompleteModule, SELECT_COMPLETE_GROUP};
use crate::matches::engine::MatchEngine;
use crate::matches::generator::MatchGenerator;
use crate::matches::matches::MatchFolding;
use crate::words::classifier::{Classifier, ClassifierCache};
use crate::words::collector::WordCollector;
use std::cell::Cell;
use std::io::Write;
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

thread_local! {
    static EDITING: Cell<bool> = Cell::new(false);
}

/// Marks an edit in progress on this thread.
struct EditGuard;

impl EditGuard {
    fn enter() -> Self {
        EDITING.with(|editing| {
            assert!(!editing.get(), "edit() called while another edit is in progress");
            editing.set(true);
        });
        EditGuard
    }
}

impl Drop for EditGuard {
    fn drop(&mut self) {
        EDITING.with(|editing| editing.set(false));
    }
}

pub struct EditingSession<'a> {
    ctx: EditContext<'a>,
    binder: &'a Binder,
    resolver: BindResolver,
    modules: Vec<Box<dyn EditorModule>>,
    input: &'a mut dyn InputSource,
    classifiers: Vec<&'a dyn Classifier>,
    classifier_cache: ClassifierCache,
    collector: WordCollector,
    colorize: bool,
    prompt: String,
    transient: Option<String>,
    start_history: Option<usize>,
}

impl<'a> EditingSession<'a> {
    /// # Panics
    ///
    /// If `binder` has no default group.
    pub fn new(
        binder: &'a Binder,
        buffer: &'a mut dyn LineBuffer,
        out: &'a mut dyn Write,
        input: &'a mut dyn InputSource,
    ) -> Self {
        let core: Box<dyn EditorModule> = Box::new(CoreModule);
        let group = Self::group_of(binder, core.as_ref());
        Self {
            ctx: EditContext::new(buffer, out, MatchEngine::new(MatchFolding::default())),
            binder,
            resolver: BindResolver::new(group),
            modules: vec![core],
            input,
            classifiers: Vec::new(),
            classifier_cache: ClassifierCache::new(),
            collector: WordCollector::new(),
            colorize: true,
            prompt: String::new(),
            transient: None,
            start_history: None,
        }
    }

    fn group_of(binder: &Binder, module: &dyn EditorModule) -> GroupId {
        binder
            .get_group(module.bind_group())
            .unwrap_or_else(|| panic!("bind group {} is not installed", module.bind_group()))
    }

    pub fn add_generator(&mut self, generator: &'a dyn MatchGenerator) {
        self.ctx.generators.push(generator);
    }

    pub fn add_classifier(&mut self, classifier: &'a dyn Classifier) {
        self.classifiers.push(classifier);
    }

    /// History to navigate, oldest first, optionally starting on `start`.
    pub fn set_history(&mut self, entries: Vec<String>, start: Option<usize>) {
        self.ctx.history = HistoryCursor::new(entries);
        self.start_history = start;
    }

    pub fn set_dir_history(&mut self, dirs: Vec<PathBuf>) {
        self.ctx.dir_history = dirs;
    }

    /// Prompt to draw, and the transient prompt redrawn over the accepted
    /// line if any.
    pub fn set_prompt(&mut self, prompt: &str, transient: Option<String>) {
        self.prompt = prompt.to_string();
        self.transient = transient;
    }

    pub fn set_colorize(&mut self, colorize: bool) {
        self.colorize = colorize;
    }

    pub fn set_folding(&mut self, folding: MatchFolding) {
        self.ctx.engine.set_folding(folding);
    }

    pub fn set_terminal_size(&mut self, columns: usize, rows: usize) {
        self.ctx.columns = columns.max(1);
        self.ctx.rows = rows.max(2);
    }

    /// History entry to edit next, after operate-and-get-next.
    pub fn operate_next(&self) -> Option<usize> {
        self.ctx.operate_next
    }

    /// History entry the accepted line was recalled from.
    pub fn history_index(&self) -> Option<usize> {
        self.ctx.history.current_index()
    }

    pub fn generations(&self) -> usize {
        self.ctx.engine.generations()
    }

    pub fn classifier_runs(&self) -> usize {
        self.classifier_cache.runs()
    }

    /// Edit one line starting from `initial`. Returns `None` at end of input.
    ///
    /// # Panics
    ///
    /// If called while another edit is in progress on this thread.
    pub fn edit(&mut self, initial: &str) -> Option<String> {
        let _guard = EditGuard::enter();
        assert!(!self.ctx.flags.contains(EditFlags::EDITING), "edit() is not re-entrant");
        self.begin_line(initial);

        while !self.ctx.flags.intersects(EditFlags::DONE | EditFlags::EOF) {
            match self.input.read() {
                InputEvent::Byte(byte) => {
                    let resolution = self.resolver.consume(self.binder, byte);
                    self.dispatch(resolution);
                }
                InputEvent::Idle => {
                    if let Some(resolution) = self.resolver.finish() {
                        self.dispatch(resolution);
                    }
                }
                InputEvent::Resize => self.ctx.buffer.set_need_draw(),
                InputEvent::Eof => self.ctx.flags.insert(EditFlags::EOF),
            }
            if !self.ctx.flags.intersects(EditFlags::DONE | EditFlags::EOF) {
                self.update();
            }
        }

        self.end_line()
    }

    fn begin_line(&mut self, initial: &str) {
        self.ctx.flags = EditFlags::INIT | EditFlags::EDITING;
        self.ctx.operate_next = None;
        self.ctx.last_command = None;
        self.input.begin();
        let recalled = self
            .start_history
            .take()
            .and_then(|index| self.ctx.history.jump_to(index).map(str::to_string));
        self.ctx.buffer.begin_line(&self.prompt, recalled.as_deref().unwrap_or(initial));
        self.ctx.engine.reset();
        self.classifier_cache.reset();

        self.modules.truncate(1);
        let group = Self::group_of(self.binder, self.modules[0].as_ref());
        self.resolver.set_group(group);
        for module in &mut self.modules {
            module.on_begin_line(&mut self.ctx);
        }
        debug!(initial_len = initial.len(), "edit started");
        self.update();
        self.ctx.flags.remove(EditFlags::INIT);
    }

    fn end_line(&mut self) -> Option<String> {
        for module in self.modules.iter_mut().rev() {
            module.on_end_line(&mut self.ctx);
        }
        self.modules.truncate(1);
        self.resolver.reset();

        let eof = self.ctx.flags.contains(EditFlags::EOF);
        let transient = if eof { None } else { self.transient.as_deref() };
        if let Err(e) = self.ctx.buffer.end_line(transient, &mut *self.ctx.out) {
            warn!(error = %e, "terminal write failed");
        }
        self.input.end();
        self.ctx.flags.remove(EditFlags::EDITING);
        debug!(eof, "edit finished");

        if eof {
            None
        } else {
            Some(self.ctx.buffer.text().to_string())
        }
    }

    fn dispatch(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::NeedMore | Resolution::Discarded => {}
            Resolution::Resolved { binding: Binding::Command(command), .. } => self.run_command(command),
            Resolution::Resolved { binding: Binding::Macro(text), .. } => {
                self.ctx.menu = None;
                self.ctx.buffer.begin_undo_group();
                self.ctx.buffer.insert(&text);
                self.ctx.buffer.end_undo_group();
            }
            Resolution::Unbound { chord } => self.unbound(&chord),
        }
    }

    fn unbound(&mut self, chord: &[u8]) {
        let Some(module) = self.modules.last_mut() else {
            return;
        };
        match module.on_unbound(chord, &mut self.ctx) {
            UnboundAction::Insert => match std::str::from_utf8(chord) {
                Ok(text) if !text.chars().any(char::is_control) => {
                    self.ctx.menu = None;
                    self.ctx.buffer.insert(text);
                }
                _ => self.ctx.ding(),
            },
            UnboundAction::Ding => self.ctx.ding(),
            UnboundAction::Consumed => {}
        }
    }

    fn run_command(&mut self, command: EditCommand) {
        let result = (handlers::lookup(command).handler)(&mut self.ctx);
        debug!(command = %command, ?result, "command");
        match result {
            CommandResult::Handled | CommandResult::Done | CommandResult::Eof => {}
            CommandResult::Ding => self.ctx.ding(),
            CommandResult::PushPopup => self.push_module(Box::new(SelectCompleteModule)),
            CommandResult::PushPager => self.push_module(Box::new(PagerModule)),
            CommandResult::ShowHelp => {
                let lines = self.help_lines();
                if self.ctx.page(lines) {
                    self.push_module(Box::new(PagerModule));
                }
            }
        }
        if !matches!(command, EditCommand::MenuComplete | EditCommand::MenuCompleteBackward) {
            self.ctx.menu = None;
        }
        self.ctx.last_command = Some(command);
    }

    fn push_module(&mut self, mut module: Box<dyn EditorModule>) {
        let group = Self::group_of(self.binder, module.as_ref());
        module.on_begin_line(&mut self.ctx);
        debug!(module = module.name(), "module pushed");
        self.modules.push(module);
        self.resolver.set_group(group);
    }

    fn pop_module(&mut self) {
        assert!(self.modules.len() > 1, "cannot pop the base editor module");
        if let Some(module) = self.modules.pop() {
            debug!(module = module.name(), "module popped");
        }
        let group = Self::group_of(self.binder, self.top());
        if self.resolver.group() != group {
            self.resolver.set_group(group);
        }
    }

    fn top(&self) -> &dyn EditorModule {
        self.modules[self.modules.len() - 1].as_ref()
    }

    /// Pop finished modules, refresh the caches and redraw.
    fn update(&mut self) {
        while self.modules.len() > 1 {
            let keep = match self.modules.last_mut() {
                Some(module) => module.on_update(&mut self.ctx),
                None => true,
            };
            if keep {
                break;
            }
            self.pop_module();
        }

        let block_generate = self.top().bind_group() == SELECT_COMPLETE_GROUP;
        self.ctx.update_internal(block_generate);

        if self.colorize {
            let changed = self.classifier_cache.update(
                self.ctx.buffer.text(),
                self.ctx.buffer.cursor(),
                &self.collector,
                &self.classifiers,
            );
            if changed {
                self.ctx.buffer.set_colors(self.classifier_cache.classifications().colors());
            }
        }

        self.ctx.draw();
        if let Some(module) = self.modules.last_mut() {
            module.draw(&mut self.ctx);
        }
    }

    /// Bindings of the current group, listed by category.
    fn help_lines(&self) -> Vec<String> {
        let bindings = self.binder.bindings(self.resolver.group());
        let mut lines = Vec::new();
        for category in CommandCategory::iter() {
            let mut rows = Vec::new();
            if category == CommandCategory::Macros {
                for (seq, binding) in &bindings {
                    if let Binding::Macro(_) = binding {
                        rows.push(format!("  {:<20} {}", describe_keyseq(seq), binding.label()));
                    }
                }
            } else {
                for command in EditCommand::by_category(category) {
                    let keys: Vec<String> = bindings
                        .iter()
                        .filter(|(_, binding)| *binding == Binding::Command(command))
                        .map(|(seq, _)| describe_keyseq(seq))
                        .collect();
                    if !keys.is_empty() {
                        rows.push(format!("  {:<20} {:<26} {}", keys.join(", "), command.name(), command.description()));
                    }
                }
            }
            if !rows.is_empty() {
                lines.push(format!("{}:", category));
                lines.extend(rows);
            }
        }
        lines
    }
}
