// ABOUTME: Library root for vinnie-chat: exposes all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod app;
pub mod chat;
pub mod config;
pub mod logging;
pub mod remote;
pub mod render;
pub mod tui;
