//! In-memory backend used by the chat tests.

use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::client::Backend;
use crate::error::{Error, Result};
use crate::types::{
    AskResponse, FormRequest, SpeechResponse, TranscriptionResponse, UploadResponse,
};

pub(crate) struct FakeBackend {
    origin: Url,
    requests: Mutex<Vec<FormRequest>>,
    answer: Mutex<String>,
    upload_message: Option<String>,
    transcription: String,
    audio: String,
    failing: bool,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            origin: Url::parse("http://127.0.0.1:8000/").unwrap(),
            requests: Mutex::new(Vec::new()),
            answer: Mutex::new("4".to_string()),
            upload_message: Some("Notes uploaded successfully!".to_string()),
            transcription: "what is osmosis".to_string(),
            audio: "uploads/answer.mp3".to_string(),
            failing: false,
        }
    }

    pub(crate) fn with_answer(self, answer: &str) -> Self {
        self.set_answer(answer);
        self
    }

    pub(crate) fn set_answer(&self, answer: &str) {
        *self.answer.lock().unwrap() = answer.to_string();
    }

    pub(crate) fn with_upload_message(mut self, message: Option<&str>) -> Self {
        self.upload_message = message.map(String::from);
        self
    }

    pub(crate) fn with_transcription(mut self, text: &str) -> Self {
        self.transcription = text.to_string();
        self
    }

    pub(crate) fn with_audio(mut self, audio: &str) -> Self {
        self.audio = audio.to_string();
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn requests(&self) -> Vec<FormRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, form: FormRequest) -> Result<()> {
        self.requests.lock().unwrap().push(form);
        if self.failing {
            Err(Error::connection("connection refused", None))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn origin(&self) -> &Url {
        &self.origin
    }

    async fn ask(&self, form: FormRequest) -> Result<AskResponse> {
        self.record(form)?;
        Ok(AskResponse {
            answer: self.answer.lock().unwrap().clone(),
        })
    }

    async fn upload_notes(&self, form: FormRequest) -> Result<UploadResponse> {
        self.record(form)?;
        Ok(UploadResponse {
            message: self.upload_message.clone(),
        })
    }

    async fn voice_to_text(&self, form: FormRequest) -> Result<TranscriptionResponse> {
        self.record(form)?;
        Ok(TranscriptionResponse {
            text: self.transcription.clone(),
        })
    }

    async fn text_to_voice(&self, form: FormRequest) -> Result<SpeechResponse> {
        self.record(form)?;
        Ok(SpeechResponse {
            audio: self.audio.clone(),
        })
    }
}
