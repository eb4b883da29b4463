use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::Sender;

/// One entry of the conversation view.
///
/// Messages are created when the user sends something or when an answer
/// arrives, and are only ever appended to the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The text shown in the bubble.
    pub text: String,

    /// Who produced the text.
    pub sender: Sender,

    /// When the message was appended to the view.
    #[serde(with = "crate::utils::time")]
    pub sent_at: OffsetDateTime,
}

impl Message {
    /// Create a new message stamped with the current time.
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            sent_at: OffsetDateTime::now_utc(),
        }
    }

    /// Create a message authored by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    /// Create a message authored by the backend.
    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Ai)
    }

    /// Returns true if the user authored this message.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
