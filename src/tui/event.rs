//! Messages that drive the TUI update loop.
//!
//! The runner multiplexes crossterm input, the owner-loop tick and the
//! render interval; only input and quit reach `TuiApp::update`.

use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum TuiMessage {
    /// Keyboard input.
    Input(KeyEvent),
    /// Tick: marshaled navigation work was drained.
    Tick,
    /// Quit the TUI.
    Quit,
}
