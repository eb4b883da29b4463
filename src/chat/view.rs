//! Events the chat session emits for the front-end to render.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use url::Url;

use crate::types::Message;

/// Something the front-end should show or do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// A message was appended to the conversation.
    MessageAppended(Message),

    /// A blocking notice for the user.
    Alert(String),

    /// The input field was overwritten with new text.
    InputFilled(String),

    /// Synthesized audio is ready at the given URL.
    PlayAudio(Url),
}

/// Handle the session uses to emit [`ViewEvent`]s.
///
/// Emitting never fails: if the front-end has gone away the event is dropped.
#[derive(Debug, Clone, Default)]
pub struct View {
    tx: Option<UnboundedSender<ViewEvent>>,
}

impl View {
    /// Create a view and the receiver the front-end drains.
    pub fn channel() -> (Self, UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A view that discards every event.
    pub fn detached() -> Self {
        Self { tx: None }
    }

    /// Emit an event.
    pub fn emit(&self, event: ViewEvent) {
        if let Some(tx) = &self.tx
            && tx.send(event).is_err()
        {
            tracing::trace!("view receiver dropped; discarding event");
        }
    }
}
