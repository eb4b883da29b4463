//! Chat application module for asking questions about uploaded notes.
//!
//! This module provides the client-side chat session on top of a
//! [`Backend`](crate::client::Backend).  It supports:
//!
//! - Asking questions and keeping the last answer
//! - Uploading notes files, optionally as an admin upload
//! - Transcribing audio into the input field
//! - Speaking the last answer
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation state and the four user actions
//! - [`view`]: Events the session emits for the front-end
//! - [`dispatch`]: Maps UI events to actions, one task per action
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod dispatch;
mod session;
mod view;

#[cfg(test)]
mod testing;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile, Variant};
pub use dispatch::{ActionKind, Dispatcher, Handler, UiEvent};
pub use session::{
    ChatSession, EndpointStats, NO_ANSWER_ALERT, NO_AUDIO_ALERT, NO_FILE_ALERT,
    SEND_FAILURE_MESSAGE, SessionStats, UPLOAD_CONFIRMATION, VOICE_INPUT_PREFIX,
};
pub use view::{View, ViewEvent};
