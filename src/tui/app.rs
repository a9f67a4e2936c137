//! TUI application state management.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use crate::config::{MAX_OUTPUT_HEIGHT, MIN_OUTPUT_HEIGHT};
use crate::editor::TextBuffer;
use crate::execution::{Artifact, Executor, InvocationController, RunOutcome};
use crate::notebook::Notebook;
use crate::output::{ArtifactView, OutputState};
use crate::store::{KvStore, ScreenStore};
use crate::view::ViewMode;

/// Which part of the screen receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    /// Variable buttons and selected entries in the output pane.
    Output,
}

/// Application state for the TUI
pub struct App {
    /// Persisted state for this screen
    pub screen: ScreenStore<Box<dyn KvStore>>,
    /// Source being edited
    pub editor: TextBuffer,
    pub notebook: Notebook,
    /// Pre-rendered data-file previews, one per data file
    pub file_views: Vec<ArtifactView>,
    pub view: ViewMode,
    pub focus: Focus,
    pub output: OutputState,
    pub controller: InvocationController,
    /// Index of the highlighted variable button
    pub variable_cursor: usize,
    /// Selected entry to bring into view on the next draw
    pub scroll_anchor: Option<String>,
    /// First visible line of the output pane
    pub output_scroll: usize,
    /// First visible line of the file preview
    pub preview_scroll: usize,
    /// First visible column of the file preview
    pub preview_hscroll: usize,
    /// Output pane height in rows
    pub output_height: u16,
    /// Where `s` writes image artifacts
    pub image_dir: PathBuf,
    pub status_message: String,
    pub show_help: bool,
    /// Frame counter for the running indicator
    pub tick: usize,
    artifact_views: HashMap<String, ArtifactView>,
}

impl App {
    /// Create a new TUI application instance, restoring the saved source and output.
    pub fn new(
        screen: ScreenStore<Box<dyn KvStore>>,
        notebook: Notebook,
        default_code: &str,
        output_height: u16,
        image_dir: PathBuf,
    ) -> Self {
        let editor = TextBuffer::new(&screen.load_code(default_code));
        let output = OutputState::with_output(screen.load_output().unwrap_or_default());
        let file_views = notebook
            .data_files()
            .iter()
            .map(|f| ArtifactView::from_artifact(&Artifact::Table(f.content.clone())))
            .collect();
        let view = ViewMode::initial(notebook.data_files().len());

        Self {
            screen,
            editor,
            notebook,
            file_views,
            view,
            focus: Focus::Editor,
            output,
            controller: InvocationController::new(),
            variable_cursor: 0,
            scroll_anchor: None,
            output_scroll: 0,
            preview_scroll: 0,
            preview_hscroll: 0,
            output_height: output_height.clamp(MIN_OUTPUT_HEIGHT, MAX_OUTPUT_HEIGHT),
            image_dir,
            status_message: String::new(),
            show_help: false,
            tick: 0,
            artifact_views: HashMap::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Whether the output pane is visible.
    pub fn shows_output(&self) -> bool {
        self.view.is_editor() && self.output.has_content()
    }

    // ----- Editing -----

    /// Apply an edit to the buffer and persist the new source.
    pub fn edit(&mut self, f: impl FnOnce(&mut TextBuffer)) {
        let before = self.editor.text();
        f(&mut self.editor);
        let after = self.editor.text();
        if before != after {
            if let Err(e) = self.screen.save_code(&after) {
                tracing::warn!(error = %e, "failed to persist source");
            }
        }
    }

    // ----- Views -----

    pub fn show_editor(&mut self) {
        self.view.show_editor();
    }

    pub fn show_file(&mut self, index: usize) {
        self.view.show_file(index, self.notebook.data_files().len());
        self.preview_scroll = 0;
        self.preview_hscroll = 0;
    }

    pub fn next_tab(&mut self) {
        self.view.next_tab(self.notebook.data_files().len());
        self.preview_scroll = 0;
        self.preview_hscroll = 0;
    }

    pub fn prev_tab(&mut self) {
        self.view.prev_tab(self.notebook.data_files().len());
        self.preview_scroll = 0;
        self.preview_hscroll = 0;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor if self.shows_output() => Focus::Output,
            _ => Focus::Editor,
        };
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn grow_output(&mut self) {
        self.output_height = (self.output_height + 1).min(MAX_OUTPUT_HEIGHT);
    }

    pub fn shrink_output(&mut self) {
        self.output_height = self.output_height.saturating_sub(1).max(MIN_OUTPUT_HEIGHT);
    }

    // ----- Runs -----

    /// Start a run of the current source. Returns the future to drive, or `None`
    /// when a run is already in flight.
    pub fn start_run<E>(&mut self, executor: E) -> Option<impl Future<Output = RunOutcome> + Send + 'static>
    where
        E: Executor + Send + Sync + 'static,
    {
        let fut = self
            .controller
            .start(executor, self.editor.text(), self.notebook.session_id())?;
        self.output.begin_run();
        self.output_scroll = 0;
        self.scroll_anchor = None;
        self.status_message = "Running...".to_string();
        tracing::info!(screen = self.screen.screen(), "run started");
        Some(fut)
    }

    /// Reconcile a finished run into the output state.
    pub fn finish_run(&mut self, outcome: RunOutcome) {
        if !self.controller.finish(outcome.ticket) {
            tracing::warn!("ignoring outcome of a run that is not in flight");
            return;
        }
        self.artifact_views.clear();
        self.variable_cursor = 0;
        self.output_scroll = 0;
        match outcome.result {
            Ok(result) => {
                let count = result.variables.len();
                self.output.apply(result);
                self.status_message = format!("Run finished: {} variable(s)", count);
                self.persist_output();
                self.persist_selection();
            }
            Err(e) => {
                self.output.fail(e.user_message());
                self.status_message = "Run failed".to_string();
                self.persist_output();
            }
        }
        if self.focus == Focus::Output && !self.shows_output() {
            self.focus = Focus::Editor;
        }
    }

    fn persist_output(&self) {
        if let Err(e) = self.screen.save_output(self.output.output()) {
            tracing::warn!(error = %e, "failed to persist output");
        }
    }

    fn persist_selection(&self) {
        if let Err(e) = self.screen.save_selected(self.output.selected()) {
            tracing::warn!(error = %e, "failed to persist selected variables");
        }
    }

    // ----- Variables -----

    pub fn variable_count(&self) -> usize {
        self.output.variables().len()
    }

    /// Name under the variable cursor.
    pub fn current_variable(&self) -> Option<String> {
        self.output
            .variable_names()
            .nth(self.variable_cursor)
            .map(str::to_string)
    }

    pub fn variable_cursor_next(&mut self) {
        if self.variable_cursor + 1 < self.variable_count() {
            self.variable_cursor += 1;
        }
    }

    pub fn variable_cursor_prev(&mut self) {
        self.variable_cursor = self.variable_cursor.saturating_sub(1);
    }

    pub fn select_variable(&mut self, name: &str) {
        if let Some(anchor) = self.output.select(name) {
            self.scroll_anchor = Some(anchor);
            self.persist_selection();
        }
    }

    pub fn deselect_variable(&mut self, name: &str) {
        self.output.deselect(name);
        self.persist_selection();
    }

    pub fn select_current(&mut self) {
        if let Some(name) = self.current_variable() {
            self.select_variable(&name);
        }
    }

    pub fn deselect_current(&mut self) {
        if let Some(name) = self.current_variable() {
            self.deselect_variable(&name);
        }
    }

    /// Cached display form of variable `name`.
    pub fn artifact_view(&mut self, name: &str) -> Option<&ArtifactView> {
        if !self.artifact_views.contains_key(name) {
            let artifact = self.output.variables().get(name)?;
            let view = ArtifactView::from_artifact(artifact);
            self.artifact_views.insert(name.to_string(), view);
        }
        self.artifact_views.get(name)
    }

    /// Write the image under the variable cursor to `image_dir`.
    pub fn save_current_image(&mut self) {
        let Some(name) = self.current_variable() else {
            return;
        };
        let dir = self.image_dir.clone();
        self.status_message = match self.artifact_view(&name) {
            Some(ArtifactView::Image(info)) => match info.save(&dir, &name) {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => {
                    tracing::warn!(error = %e, variable = %name, "failed to save image");
                    format!("Could not save {}: {}", name, e)
                }
            },
            _ => format!("{} is not an image", name),
        };
    }

    pub fn scroll_output_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    pub fn scroll_output_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }
}
