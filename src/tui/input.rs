// ABOUTME: Keyboard input handling for the TUI: translates key events into actions.
// ABOUTME: Editing keys change TuiState directly; everything touching sessions is returned to the app.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::tui::commands::{SlashCommand, parse_command};
use crate::tui::state::TuiState;

const PAGE_SCROLL: u16 = 10;

/// The result of processing a key event.
#[derive(Debug, PartialEq)]
pub enum InputResult {
    /// No action needed.
    None,
    /// Dispatch the prompt buffer (and staged attachment).
    Submit,
    /// User ran a slash command; the buffer has already been cleared.
    Command(SlashCommand),
    /// Malformed slash command; the message is shown in the status line.
    Invalid(String),
    ScrollUp(u16),
    ScrollDown(u16),
    NextSession,
    PrevSession,
    Quit,
}

/// Process a key event against the current TUI state and return the resulting action.
pub fn handle_key(state: &mut TuiState, key: KeyEvent) -> InputResult {
    if key.kind == KeyEventKind::Release {
        return InputResult::None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => InputResult::Quit,
            KeyCode::Char('b') => {
                state.toggle_sidebar();
                InputResult::None
            }
            _ => InputResult::None,
        };
    }

    match key.code {
        KeyCode::PageUp => InputResult::ScrollUp(PAGE_SCROLL),
        KeyCode::PageDown => InputResult::ScrollDown(PAGE_SCROLL),
        KeyCode::Up => InputResult::ScrollUp(1),
        KeyCode::Down => InputResult::ScrollDown(1),
        KeyCode::Tab => InputResult::NextSession,
        KeyCode::BackTab => InputResult::PrevSession,
        KeyCode::Enter => submit(state),
        KeyCode::Char(c) => {
            state.insert_char_at_cursor(c);
            InputResult::None
        }
        KeyCode::Backspace => {
            state.backspace_char();
            InputResult::None
        }
        KeyCode::Delete => {
            state.delete_char_at_cursor();
            InputResult::None
        }
        KeyCode::Left => {
            state.move_cursor_left();
            InputResult::None
        }
        KeyCode::Right => {
            state.move_cursor_right();
            InputResult::None
        }
        KeyCode::Home => {
            state.move_cursor_home();
            InputResult::None
        }
        KeyCode::End => {
            state.move_cursor_end();
            InputResult::None
        }
        _ => InputResult::None,
    }
}

/// Enter either runs a slash command or hands the buffer to the dispatcher.
/// Prompts are not validated; an empty buffer is still submitted.
fn submit(state: &mut TuiState) -> InputResult {
    if !state.input_is_command() {
        return InputResult::Submit;
    }
    let line = state.take_input();
    match parse_command(&line) {
        Ok(command) => InputResult::Command(command),
        Err(message) => InputResult::Invalid(message),
    }
}
