//! Async event handler for the editor TUI.

use std::io::{self, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use super::{
    app::{App, Focus},
    events::TuiEvent,
    ui::render_ui,
};
use crate::execution::Executor;
use crate::view::ViewMode;

/// What the main loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Run,
    Quit,
}

/// Leaves raw mode, bracketed paste and the alternate screen when dropped, so the
/// terminal is restored on setup errors and panics as well as on a normal exit.
pub struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    /// Call right after `enable_raw_mode`.
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!(error = %e, "failed to disable raw mode");
        }
        if let Err(e) = execute!(self.out, DisableBracketedPaste, LeaveAlternateScreen, Show) {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
    }
}

/// Run the editor TUI until the user quits
pub async fn run_tui<E>(mut app: App, executor: E) -> Result<()>
where
    E: Executor + Clone + Send + Sync + 'static,
{
    // Check if we're in a proper terminal environment
    if !io::IsTerminal::is_terminal(&io::stdout()) {
        return Err(anyhow::anyhow!("TUI mode requires a proper terminal environment"));
    }

    // Setup terminal; the guard restores it however we leave this function
    enable_raw_mode()?;
    let _guard = TerminalGuard::new(io::stdout());
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();

    run_app(&mut terminal, &mut app, executor, event_tx, event_rx).await
}

/// Main application loop
async fn run_app<E>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    executor: E,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()>
where
    E: Executor + Clone + Send + Sync + 'static,
{
    // Spawn input handler
    let stop = Arc::new(AtomicBool::new(false));
    let input_stop = stop.clone();
    let input_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || {
        while !input_stop.load(Ordering::Relaxed) {
            // Poll for keyboard events
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                let sent = match event::read() {
                    Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                        input_tx.send(TuiEvent::Key(key))
                    }
                    Ok(Event::Paste(text)) => input_tx.send(TuiEvent::Paste(text)),
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break; // Channel closed
                }
            }
        }
    });

    let result: Result<()> = loop {
        // Render UI
        if let Err(e) = terminal.draw(|frame| render_ui(frame, app)) {
            break Err(e.into());
        }

        // Handle events
        let mut quit = false;
        while let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => match handle_key_event(app, key) {
                    KeyAction::Quit => {
                        quit = true;
                        break;
                    }
                    KeyAction::Run => {
                        if let Some(run) = app.start_run(executor.clone()) {
                            let tx = event_tx.clone();
                            tokio::spawn(async move {
                                let _ = tx.send(TuiEvent::RunFinished(run.await));
                            });
                        }
                    }
                    KeyAction::None => {}
                },
                TuiEvent::Paste(text) => {
                    if app.view.is_editor() && app.focus == Focus::Editor {
                        app.edit(|buf| buf.insert_str(&text));
                    }
                }
                TuiEvent::RunFinished(outcome) => app.finish_run(outcome),
            }
        }
        if quit {
            break Ok(());
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await; // ~60 FPS
    };

    stop.store(true, Ordering::Relaxed);
    result
}

/// Handle keyboard events
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    // Help overlay swallows the next key
    if app.show_help {
        app.show_help = false;
        return KeyAction::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return KeyAction::Quit,
        KeyCode::Char('r') if ctrl => return KeyAction::Run,
        KeyCode::F(5) => return KeyAction::Run,
        KeyCode::F(1) => {
            app.toggle_help();
            return KeyAction::None;
        }
        KeyCode::Char('n') if ctrl => {
            app.next_tab();
            return KeyAction::None;
        }
        KeyCode::Char('p') if ctrl => {
            app.prev_tab();
            return KeyAction::None;
        }
        KeyCode::Char('e') if ctrl => {
            app.show_editor();
            return KeyAction::None;
        }
        KeyCode::Up if ctrl => {
            app.grow_output();
            return KeyAction::None;
        }
        KeyCode::Down if ctrl => {
            app.shrink_output();
            return KeyAction::None;
        }
        KeyCode::Esc => {
            app.toggle_focus();
            return KeyAction::None;
        }
        _ => {}
    }

    match app.view {
        ViewMode::FilePreview(_) => handle_preview_key(app, key),
        ViewMode::Editor => match app.focus {
            Focus::Editor => handle_editor_key(app, key),
            Focus::Output => handle_output_key(app, key),
        },
    }
    KeyAction::None
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return;
    }
    match key.code {
        KeyCode::Char(c) => app.edit(|buf| buf.insert_char(c)),
        KeyCode::Enter => app.edit(|buf| buf.newline()),
        KeyCode::Tab => app.edit(|buf| buf.insert_indent()),
        KeyCode::Backspace => app.edit(|buf| buf.backspace()),
        KeyCode::Delete => app.edit(|buf| buf.delete()),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Home => app.editor.move_home(),
        KeyCode::End => app.editor.move_end(),
        _ => {}
    }
}

fn handle_output_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.variable_cursor_prev(),
        KeyCode::Down => app.variable_cursor_next(),
        KeyCode::Enter | KeyCode::Char(' ') => app.select_current(),
        KeyCode::Char('d') | KeyCode::Delete => app.deselect_current(),
        KeyCode::Char('s') => app.save_current_image(),
        KeyCode::PageUp => app.scroll_output_up(),
        KeyCode::PageDown => app.scroll_output_down(),
        _ => {}
    }
}

fn handle_preview_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.preview_scroll = app.preview_scroll.saturating_sub(1),
        KeyCode::Down => app.preview_scroll = app.preview_scroll.saturating_add(1),
        KeyCode::PageUp => app.preview_scroll = app.preview_scroll.saturating_sub(10),
        KeyCode::PageDown => app.preview_scroll = app.preview_scroll.saturating_add(10),
        KeyCode::Left => app.preview_hscroll = app.preview_hscroll.saturating_sub(4),
        KeyCode::Right => app.preview_hscroll = app.preview_hscroll.saturating_add(4),
        _ => {}
    }
}
