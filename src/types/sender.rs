use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a [`Message`](crate::types::Message) in the conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Text typed or dictated by the person at the keyboard.
    User,

    /// Text produced by the backend.
    Ai,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Ai => write!(f, "ai"),
        }
    }
}
