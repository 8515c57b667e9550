// ABOUTME: TUI module: ratatui full-screen interface for the chat client.
// ABOUTME: History sidebar, chat view, input handling with slash commands, and status bar.

pub mod commands;
pub mod events;
pub mod input;
pub mod state;
pub mod ui;
pub mod widgets;

pub use state::TuiState;
