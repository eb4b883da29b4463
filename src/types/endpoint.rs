use std::fmt;

/// The backend routes the chat client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Question answering.
    Ask,
    /// Note upload.
    UploadNotes,
    /// Speech to text.
    VoiceToText,
    /// Text to speech.
    TextToVoice,
}

impl Endpoint {
    /// All endpoints, in the order they are reported.
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Ask,
        Endpoint::UploadNotes,
        Endpoint::VoiceToText,
        Endpoint::TextToVoice,
    ];

    /// Root-relative path of the endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Ask => "/ask",
            Endpoint::UploadNotes => "/upload-notes",
            Endpoint::VoiceToText => "/voice-to-text",
            Endpoint::TextToVoice => "/text-to-voice",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
