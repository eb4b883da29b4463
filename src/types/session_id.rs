use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PREFIX: &str = "sess_";
const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque tag the backend uses to scope uploaded notes to one client.
///
/// A fresh identifier is drawn for every chat session and never renewed.
/// It is very likely unique, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new identifier of the form `sess_` followed by nine
    /// lowercase base-36 characters.
    pub fn generate() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        let suffix: String = bytes
            .iter()
            .take(SUFFIX_LEN)
            .map(|b| ALPHABET[(*b as usize) % ALPHABET.len()] as char)
            .collect();
        Self(format!("{PREFIX}{suffix}"))
    }

    /// Returns the identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
