//! UI event dispatch.
//!
//! Each user interface event is looked up in a table of handlers and run as
//! its own task.  Tasks are never cancelled and are not ordered relative to
//! each other; the only suspension points are the backend requests.

use std::collections::HashMap;
use std::path::PathBuf;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;

use crate::chat::session::ChatSession;
use crate::client::Backend;
use crate::error::{Error, Result};
use crate::observability::{DISPATCH_ACTIONS, DISPATCH_FAILURES};
use crate::types::{SelectedFile, UploadIntent};

/// An event raised by the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Text typed and submitted in one go.
    Send(String),

    /// Send whatever is currently in the input field.
    SendInput,

    /// Upload the file at `path`; `None` means nothing was selected.
    Upload {
        /// Selected notes file.
        path: Option<PathBuf>,
        /// Whether the admin modifier was held.
        admin: bool,
    },

    /// Transcribe the audio file at the path.
    ConvertVoice(Option<PathBuf>),

    /// Speak the last answer.
    TextToVoice,
}

/// The kinds of [`UiEvent`], used as keys of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// [`UiEvent::Send`]
    Send,
    /// [`UiEvent::SendInput`]
    SendInput,
    /// [`UiEvent::Upload`]
    Upload,
    /// [`UiEvent::ConvertVoice`]
    ConvertVoice,
    /// [`UiEvent::TextToVoice`]
    TextToVoice,
}

impl UiEvent {
    /// The key this event dispatches on.
    pub fn kind(&self) -> ActionKind {
        match self {
            UiEvent::Send(_) => ActionKind::Send,
            UiEvent::SendInput => ActionKind::SendInput,
            UiEvent::Upload { .. } => ActionKind::Upload,
            UiEvent::ConvertVoice(_) => ActionKind::ConvertVoice,
            UiEvent::TextToVoice => ActionKind::TextToVoice,
        }
    }
}

/// A handler receives its own clone of the session and the event.
pub type Handler<B> = fn(ChatSession<B>, UiEvent) -> BoxFuture<'static, Result<()>>;

/// Maps UI events onto session actions.
pub struct Dispatcher<B: Backend> {
    session: ChatSession<B>,
    handlers: HashMap<ActionKind, Handler<B>>,
}

impl<B: Backend> Dispatcher<B> {
    /// Creates a dispatcher with the default handler for every event kind.
    pub fn new(session: ChatSession<B>) -> Self {
        let mut dispatcher = Self::empty(session);
        dispatcher.register(ActionKind::Send, handle_send::<B>);
        dispatcher.register(ActionKind::SendInput, handle_send_input::<B>);
        dispatcher.register(ActionKind::Upload, handle_upload::<B>);
        dispatcher.register(ActionKind::ConvertVoice, handle_convert_voice::<B>);
        dispatcher.register(ActionKind::TextToVoice, handle_text_to_voice::<B>);
        dispatcher
    }

    /// Creates a dispatcher with no handlers.
    pub fn empty(session: ChatSession<B>) -> Self {
        Self {
            session,
            handlers: HashMap::new(),
        }
    }

    /// Installs `handler` for `kind`, returning the handler it replaces.
    pub fn register(&mut self, kind: ActionKind, handler: Handler<B>) -> Option<Handler<B>> {
        self.handlers.insert(kind, handler)
    }

    /// The session handlers act on.
    pub fn session(&self) -> &ChatSession<B> {
        &self.session
    }

    /// Runs the handler for `event` on a new task.
    ///
    /// The task's error, if any, is logged and also returned through the
    /// join handle.  Callers that treat actions as fire-and-forget can drop
    /// the handle.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no handler is registered for the
    /// event's kind.  Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: UiEvent) -> Result<JoinHandle<Result<()>>> {
        let kind = event.kind();
        let handler = *self
            .handlers
            .get(&kind)
            .ok_or_else(|| Error::config(format!("no handler registered for {kind:?}")))?;
        let session = self.session.clone();
        DISPATCH_ACTIONS.click();
        tracing::debug!(action = ?kind, "dispatching");
        Ok(tokio::spawn(async move {
            let result = handler(session, event).await;
            if let Err(err) = &result {
                DISPATCH_FAILURES.click();
                tracing::error!(action = ?kind, %err, "action failed");
            }
            result
        }))
    }
}

fn handle_send<B: Backend>(session: ChatSession<B>, event: UiEvent) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        match event {
            UiEvent::Send(text) => session.send_typed(text).await,
            other => Err(mismatched(ActionKind::Send, &other)),
        }
    })
}

fn handle_send_input<B: Backend>(
    session: ChatSession<B>,
    event: UiEvent,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        match event {
            UiEvent::SendInput => session.send_message().await,
            other => Err(mismatched(ActionKind::SendInput, &other)),
        }
    })
}

fn handle_upload<B: Backend>(
    session: ChatSession<B>,
    event: UiEvent,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        match event {
            UiEvent::Upload { path, admin } => {
                let file = load(path).await?;
                session
                    .upload_notes(UploadIntent::new(file).with_admin(admin))
                    .await
            }
            other => Err(mismatched(ActionKind::Upload, &other)),
        }
    })
}

fn handle_convert_voice<B: Backend>(
    session: ChatSession<B>,
    event: UiEvent,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        match event {
            UiEvent::ConvertVoice(path) => {
                let file = load(path).await?;
                session.convert_voice(file).await
            }
            other => Err(mismatched(ActionKind::ConvertVoice, &other)),
        }
    })
}

fn handle_text_to_voice<B: Backend>(
    session: ChatSession<B>,
    event: UiEvent,
) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        match event {
            UiEvent::TextToVoice => session.text_to_voice().await,
            other => Err(mismatched(ActionKind::TextToVoice, &other)),
        }
    })
}

async fn load(path: Option<PathBuf>) -> Result<Option<SelectedFile>> {
    match path {
        Some(path) => SelectedFile::from_path(path).await.map(Some),
        None => Ok(None),
    }
}

fn mismatched(expected: ActionKind, event: &UiEvent) -> Error {
    Error::validation(
        format!("handler for {expected:?} received {:?}", event.kind()),
        Some("event".to_string()),
    )
}
