use serde_json::{Map, Value, json};

use crate::types::{Endpoint, SelectedFile, SessionId};

/// A single multipart form value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A plain text field.
    Text(String),
    /// A file part.
    File(SelectedFile),
}

/// A multipart form submission to one backend endpoint.
///
/// Fields keep their insertion order, which is also the order they are
/// written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    endpoint: Endpoint,
    fields: Vec<(String, FormValue)>,
}

impl FormRequest {
    /// Create an empty form for the endpoint.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            fields: Vec::new(),
        }
    }

    /// Form for `/ask`.
    pub fn ask(question: impl Into<String>) -> Self {
        Self::new(Endpoint::Ask).with_text("question", question)
    }

    /// Form for `/upload-notes`.
    pub fn upload_notes(file: SelectedFile) -> Self {
        Self::new(Endpoint::UploadNotes).with_file("file", file)
    }

    /// Form for `/voice-to-text`.
    pub fn voice_to_text(file: SelectedFile) -> Self {
        Self::new(Endpoint::VoiceToText).with_file("file", file)
    }

    /// Form for `/text-to-voice`.
    pub fn text_to_voice(text: impl Into<String>) -> Self {
        Self::new(Endpoint::TextToVoice).with_text("text", text)
    }

    /// Append a text field.
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Append a file field.
    pub fn with_file(mut self, name: impl Into<String>, file: SelectedFile) -> Self {
        self.fields.push((name.into(), FormValue::File(file)));
        self
    }

    /// Append the `session_id` field.
    pub fn with_session_id(self, session_id: &SessionId) -> Self {
        self.with_text("session_id", session_id.as_str())
    }

    /// Append the `is_admin` field as `"true"` or `"false"`.
    pub fn with_admin_flag(self, admin: bool) -> Self {
        self.with_text("is_admin", if admin { "true" } else { "false" })
    }

    /// The endpoint this form is submitted to.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// All fields in submission order.
    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    /// Consume the form, returning its fields.
    pub fn into_fields(self) -> Vec<(String, FormValue)> {
        self.fields
    }

    /// Names of all fields in submission order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Value of the first text field with the given name.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(n, v)| match v {
            FormValue::Text(text) if n == name => Some(text.as_str()),
            _ => None,
        })
    }

    /// The first file field with the given name.
    pub fn file_field(&self, name: &str) -> Option<&SelectedFile> {
        self.fields.iter().find_map(|(n, v)| match v {
            FormValue::File(file) if n == name => Some(file),
            _ => None,
        })
    }

    /// JSON summary of the form suitable for logs.  File contents are
    /// replaced by their name and size.
    pub fn summary(&self) -> Value {
        let mut fields = Map::new();
        for (name, value) in &self.fields {
            let value = match value {
                FormValue::Text(text) => Value::String(text.clone()),
                FormValue::File(file) => json!({
                    "filename": file.name,
                    "bytes": file.len(),
                }),
            };
            fields.insert(name.clone(), value);
        }
        json!({
            "endpoint": self.endpoint.path(),
            "fields": fields,
        })
    }
}
