// ABOUTME: TUI widget sub-modules for the chat view, history sidebar, and status bar.
// ABOUTME: Each widget is a pure function from view-model data to ratatui Lines.

pub mod chat;
pub mod history;
pub mod status;
