// ABOUTME: Input controls seam: where the dispatcher reads the prompt and attachment.
// ABOUTME: The TUI implements it; FormControls is the plain in-memory version.

use crate::chat::attachment::Attachment;

/// Status shown while a request is being sent.
pub const STATUS_SENDING: &str = "Sending...";
/// Status shown once a reply has arrived.
pub const STATUS_READY: &str = "No file attached.";
/// Status shown when the request never completed.
pub const STATUS_FAILED: &str = "Error: could not reach the server.";

/// The prompt box, file picker, and status indicator of a chat front end.
pub trait InputControls {
    /// Read the prompt and clear the prompt box.
    fn take_prompt(&mut self) -> String;
    /// Read the attached file, if any, and clear the picker.
    fn take_attachment(&mut self) -> Option<Attachment>;
    fn set_status(&mut self, status: &str);
}

/// Input controls held in plain fields.
#[derive(Debug, Clone)]
pub struct FormControls {
    pub prompt: String,
    pub attachment: Option<Attachment>,
    pub status: String,
}

impl FormControls {
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

impl Default for FormControls {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            attachment: None,
            status: STATUS_READY.to_string(),
        }
    }
}

impl InputControls for FormControls {
    fn take_prompt(&mut self) -> String {
        std::mem::take(&mut self.prompt)
    }

    fn take_attachment(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}
