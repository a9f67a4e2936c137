//! Custom event types for TUI application.

use crossterm::event::KeyEvent;

use crate::execution::RunOutcome;

/// Events that can occur in the TUI application
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input
    Key(KeyEvent),
    /// Bracketed paste content
    Paste(String),
    /// A run of the current source finished
    RunFinished(RunOutcome),
}
