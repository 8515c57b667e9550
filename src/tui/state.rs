// ABOUTME: TUI state: the prompt buffer, staged attachment, status line, and layout toggles.
// ABOUTME: Implements the dispatcher's input controls so Enter hands the buffer straight over.

use crate::chat::attachment::Attachment;
use crate::chat::controls::{InputControls, STATUS_READY};

/// Front-end state that is not part of any session.
pub struct TuiState {
    pub input: String,
    pub cursor_pos: usize,
    /// File staged with `/attach`, sent with the next prompt.
    pub attachment: Option<Attachment>,
    pub status: String,
    pub sidebar_open: bool,
    pub server: String,
    pub assistant_name: String,
    pub language: String,
}

impl TuiState {
    pub fn new(server: String, assistant_name: String, language: String) -> Self {
        Self {
            input: String::new(),
            cursor_pos: 0,
            attachment: None,
            status: STATUS_READY.to_string(),
            sidebar_open: true,
            server,
            assistant_name,
            language,
        }
    }

    /// Take the whole input buffer and reset the cursor.
    pub fn take_input(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }

    /// Whether the buffer holds a slash command rather than a prompt.
    pub fn input_is_command(&self) -> bool {
        self.input.trim_start().starts_with('/')
    }

    pub fn stage_attachment(&mut self, attachment: Attachment) {
        self.status = format!("Attached: {}", attachment.file_name);
        self.attachment = Some(attachment);
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
        self.status = STATUS_READY.to_string();
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    /// Clamp the cursor position to the valid character range of the input buffer.
    pub fn clamp_cursor(&mut self) {
        self.cursor_pos = self.cursor_pos.min(self.input_char_len());
    }

    /// Return the current cursor byte index in the UTF-8 input buffer.
    pub fn cursor_byte_index(&self) -> usize {
        char_index_to_byte_index(&self.input, self.cursor_pos)
    }

    pub fn input_char_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Insert a character at the cursor and advance by one character.
    pub fn insert_char_at_cursor(&mut self, c: char) {
        self.clamp_cursor();
        let byte_index = self.cursor_byte_index();
        self.input.insert(byte_index, c);
        self.cursor_pos += 1;
    }

    /// Delete the character before the cursor (backspace behavior).
    pub fn backspace_char(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos == 0 {
            return;
        }

        let end = self.cursor_byte_index();
        let start = char_index_to_byte_index(&self.input, self.cursor_pos - 1);
        self.input.replace_range(start..end, "");
        self.cursor_pos -= 1;
    }

    /// Delete the character at the cursor (delete behavior).
    pub fn delete_char_at_cursor(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos >= self.input_char_len() {
            return;
        }

        let start = self.cursor_byte_index();
        let end = char_index_to_byte_index(&self.input, self.cursor_pos + 1);
        self.input.replace_range(start..end, "");
    }

    pub fn move_cursor_left(&mut self) {
        self.clamp_cursor();
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos < self.input_char_len() {
            self.cursor_pos += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_pos = self.input_char_len();
    }
}

impl InputControls for TuiState {
    fn take_prompt(&mut self) -> String {
        self.take_input()
    }

    fn take_attachment(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }

    match s.char_indices().nth(char_index) {
        Some((idx, _)) => idx,
        None => s.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> TuiState {
        TuiState::new(
            "http://127.0.0.1:5000".to_string(),
            "Vinnie AI".to_string(),
            "en".to_string(),
        )
    }

    #[test]
    fn new_state_is_empty() {
        let state = state();
        assert_eq!(state.input, "");
        assert_eq!(state.cursor_pos, 0);
        assert!(state.attachment.is_none());
        assert_eq!(state.status, STATUS_READY);
        assert!(state.sidebar_open);
    }

    #[test]
    fn take_prompt_clears_buffer_and_attachment() {
        let mut state = state();
        state.input = "  hello  ".to_string();
        state.cursor_pos = 5;
        state.stage_attachment(Attachment::new("a.pdf", vec![0]));
        assert_eq!(state.status, "Attached: a.pdf");

        assert_eq!(state.take_prompt(), "  hello  ");
        assert_eq!(state.take_attachment().unwrap().file_name, "a.pdf");
        assert_eq!(state.input, "");
        assert_eq!(state.cursor_pos, 0);
        assert!(state.attachment.is_none());
    }

    #[test]
    fn detects_slash_commands() {
        let mut state = state();
        state.input = " /new".to_string();
        assert!(state.input_is_command());
        state.input = "what is /new?".to_string();
        assert!(!state.input_is_command());
    }

    #[test]
    fn clear_attachment_resets_status() {
        let mut state = state();
        state.stage_attachment(Attachment::new("a.txt", vec![]));
        state.clear_attachment();
        assert!(state.attachment.is_none());
        assert_eq!(state.status, STATUS_READY);
    }

    #[test]
    fn utf8_input_editing_is_safe() {
        let mut state = state();
        state.insert_char_at_cursor('a');
        state.insert_char_at_cursor('🙂');
        state.insert_char_at_cursor('é');
        assert_eq!(state.input, "a🙂é");
        assert_eq!(state.cursor_pos, 3);

        state.move_cursor_left();
        state.backspace_char();
        assert_eq!(state.input, "aé");
        assert_eq!(state.cursor_pos, 1);

        state.delete_char_at_cursor();
        assert_eq!(state.input, "a");
        assert_eq!(state.cursor_pos, 1);
    }

    #[test]
    fn clamp_cursor_handles_out_of_range_positions() {
        let mut state = state();
        state.input = "hi🙂".to_string();
        state.cursor_pos = 999;
        state.clamp_cursor();
        assert_eq!(state.cursor_pos, 3);
        assert_eq!(state.cursor_byte_index(), state.input.len());
    }
}
