// ABOUTME: Merges terminal input and request completions into one stream for the UI loop.
// ABOUTME: The completion receiver is wrapped with ReceiverStream so both sides are plain Streams.

use crossterm::event::{Event, EventStream};
use futures::stream::{self, BoxStream, Stream};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::chat::dispatch::Completion;

#[derive(Debug)]
pub enum UiEvent {
    Terminal(Event),
    Completion(Completion),
    TerminalError(String),
}

pub fn completion_stream(rx: mpsc::Receiver<Completion>) -> BoxStream<'static, UiEvent> {
    ReceiverStream::new(rx).map(UiEvent::Completion).boxed()
}

/// Interleave `terminal` with completions, whichever is ready first.
pub fn merge<S>(terminal: S, completions: mpsc::Receiver<Completion>) -> BoxStream<'static, UiEvent>
where
    S: Stream<Item = UiEvent> + Send + 'static,
{
    stream::select(terminal, completion_stream(completions)).boxed()
}

/// Crossterm key/resize events plus completions.
pub fn ui_events(completions: mpsc::Receiver<Completion>) -> BoxStream<'static, UiEvent> {
    let terminal = EventStream::new().map(|event| match event {
        Ok(event) => UiEvent::Terminal(event),
        Err(e) => UiEvent::TerminalError(e.to_string()),
    });
    merge(terminal, completions)
}
