//! Core chat session management.
//!
//! This module provides the [`ChatSession`] which owns the conversation view,
//! the input field, the last answer, and the session identifier, and which
//! implements the four user-facing actions against a [`Backend`].
//!
//! A session is cheap to clone; clones share state so each action can run as
//! its own task.  State is only locked in short synchronous sections, never
//! across a request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::chat::config::Variant;
use crate::chat::view::{View, ViewEvent};
use crate::client::{Backend, resolve_audio_url};
use crate::error::Result;
use crate::observability::{
    SESSION_ADMIN_UPLOADS, SESSION_ALERTS, SESSION_ANSWERS, SESSION_SEND_FAILURES,
};
use crate::types::{Endpoint, FormRequest, Message, SelectedFile, SessionId, UploadIntent};

/// Shown in place of an answer when the session-aware variant cannot reach
/// the backend.
pub const SEND_FAILURE_MESSAGE: &str = "Error: could not reach the server.";

/// Upload confirmation used when the server does not supply one.
pub const UPLOAD_CONFIRMATION: &str = "Notes uploaded!";

/// Alert raised when an upload is triggered without a file.
pub const NO_FILE_ALERT: &str = "Choose a file.";

/// Alert raised when transcription is triggered without a file.
pub const NO_AUDIO_ALERT: &str = "Choose audio.";

/// Alert raised when speech is requested before any answer arrived.
pub const NO_ANSWER_ALERT: &str = "No answer yet.";

/// Prefix of the user message that echoes a transcription.
pub const VOICE_INPUT_PREFIX: &str = "🎤 Voice Input: ";

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<Message>,
    last_answer: Option<String>,
    input: String,
    requests: [u64; 4],
    failures: [u64; 4],
    alerts: u64,
}

impl SessionState {
    fn count_request(&mut self, endpoint: Endpoint) {
        self.requests[endpoint_index(endpoint)] += 1;
    }

    fn count_failure(&mut self, endpoint: Endpoint) {
        self.failures[endpoint_index(endpoint)] += 1;
    }
}

fn endpoint_index(endpoint: Endpoint) -> usize {
    match endpoint {
        Endpoint::Ask => 0,
        Endpoint::UploadNotes => 1,
        Endpoint::VoiceToText => 2,
        Endpoint::TextToVoice => 3,
    }
}

/// Request counters for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointStats {
    /// The endpoint.
    pub endpoint: Endpoint,
    /// Requests issued.
    pub requests: u64,
    /// Requests that failed.
    pub failures: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The variant the session runs as.
    pub variant: Variant,
    /// The session identifier, if the variant uses one.
    pub session_id: Option<SessionId>,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Messages authored by the user.
    pub user_messages: usize,
    /// Messages authored by the backend.
    pub ai_messages: usize,
    /// Whether an answer is available for text-to-speech.
    pub has_answer: bool,
    /// Alerts raised so far.
    pub alerts: u64,
    /// Per-endpoint request counters, in [`Endpoint::ALL`] order.
    pub endpoints: Vec<EndpointStats>,
}

impl SessionStats {
    /// Total requests issued across all endpoints.
    pub fn total_requests(&self) -> u64 {
        self.endpoints.iter().map(|e| e.requests).sum()
    }

    /// Total failed requests across all endpoints.
    pub fn total_failures(&self) -> u64 {
        self.endpoints.iter().map(|e| e.failures).sum()
    }
}

/// A chat session that manages conversation state and backend interactions.
pub struct ChatSession<B: Backend> {
    backend: Arc<B>,
    variant: Variant,
    session_id: Option<SessionId>,
    state: Arc<Mutex<SessionState>>,
    view: View,
}

impl<B: Backend> Clone for ChatSession<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            variant: self.variant,
            session_id: self.session_id.clone(),
            state: Arc::clone(&self.state),
            view: self.view.clone(),
        }
    }
}

impl<B: Backend> ChatSession<B> {
    /// Creates a new chat session.
    ///
    /// The session-aware variant draws its session identifier here, once.
    pub fn new(backend: B, variant: Variant, view: View) -> Self {
        Self::with_shared_backend(Arc::new(backend), variant, view)
    }

    /// Creates a new chat session over a backend shared with the caller.
    pub fn with_shared_backend(backend: Arc<B>, variant: Variant, view: View) -> Self {
        let session_id = variant.is_session_aware().then(SessionId::generate);
        Self {
            backend,
            variant,
            session_id,
            state: Arc::new(Mutex::new(SessionState::default())),
            view,
        }
    }

    /// Sends the contents of the input field as a question.
    ///
    /// Whitespace-only input is ignored without a request.  The input field
    /// is cleared as soon as the question is taken, before the answer
    /// arrives.
    ///
    /// # Errors
    ///
    /// The classic variant returns the request error.  The session-aware
    /// variant reports it in the conversation and returns `Ok`.
    pub async fn send_message(&self) -> Result<()> {
        let question = {
            let mut state = self.lock();
            take_question(&mut state)
        };
        match question {
            Some(question) => self.ask(question).await,
            None => Ok(()),
        }
    }

    /// Replaces the input field with `text` and sends it, as one step.
    pub async fn send_typed(&self, text: impl Into<String>) -> Result<()> {
        let question = {
            let mut state = self.lock();
            state.input = text.into();
            take_question(&mut state)
        };
        match question {
            Some(question) => self.ask(question).await,
            None => Ok(()),
        }
    }

    async fn ask(&self, question: String) -> Result<()> {
        {
            let mut state = self.lock();
            self.append_locked(&mut state, Message::user(question.as_str()));
            state.count_request(Endpoint::Ask);
        }

        let mut form = FormRequest::ask(question);
        if let Some(session_id) = &self.session_id {
            form = form.with_session_id(session_id);
        }

        match self.backend.ask(form).await {
            Ok(resp) => {
                SESSION_ANSWERS.click();
                let mut state = self.lock();
                state.last_answer = Some(resp.answer.clone());
                self.append_locked(&mut state, Message::ai(resp.answer));
                Ok(())
            }
            Err(err) => {
                self.lock().count_failure(Endpoint::Ask);
                match self.variant {
                    Variant::Session => {
                        SESSION_SEND_FAILURES.click();
                        tracing::warn!(%err, "question could not be answered");
                        let mut state = self.lock();
                        self.append_locked(&mut state, Message::ai(SEND_FAILURE_MESSAGE));
                        Ok(())
                    }
                    Variant::Classic => Err(err),
                }
            }
        }
    }

    /// Uploads a notes file.
    ///
    /// Without a file this raises [`NO_FILE_ALERT`] and issues no request.
    /// The session-aware variant attaches the session identifier and the
    /// admin flag; the flag is a request the backend may refuse.
    pub async fn upload_notes(&self, intent: UploadIntent) -> Result<()> {
        let UploadIntent { file, admin } = intent;
        let Some(file) = file else {
            self.alert(NO_FILE_ALERT);
            return Ok(());
        };

        let mut form = FormRequest::upload_notes(file);
        if let Some(session_id) = &self.session_id {
            form = form.with_session_id(session_id).with_admin_flag(admin);
            if admin {
                SESSION_ADMIN_UPLOADS.click();
                tracing::warn!(
                    session_id = %session_id,
                    "requesting admin upload; the flag is client-asserted"
                );
            }
        }

        self.lock().count_request(Endpoint::UploadNotes);
        let resp = match self.backend.upload_notes(form).await {
            Ok(resp) => resp,
            Err(err) => {
                self.lock().count_failure(Endpoint::UploadNotes);
                return Err(err);
            }
        };

        let confirmation = match self.variant {
            Variant::Classic => UPLOAD_CONFIRMATION.to_string(),
            Variant::Session => resp
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UPLOAD_CONFIRMATION.to_string()),
        };
        self.alert(confirmation);
        Ok(())
    }

    /// Transcribes an audio file into the input field.
    ///
    /// Without a file this raises [`NO_AUDIO_ALERT`] and issues no request.
    /// On success the transcription replaces the input field and is echoed
    /// as a user message.
    pub async fn convert_voice(&self, file: Option<SelectedFile>) -> Result<()> {
        let Some(file) = file else {
            self.alert(NO_AUDIO_ALERT);
            return Ok(());
        };

        self.lock().count_request(Endpoint::VoiceToText);
        let resp = match self.backend.voice_to_text(FormRequest::voice_to_text(file)).await {
            Ok(resp) => resp,
            Err(err) => {
                self.lock().count_failure(Endpoint::VoiceToText);
                return Err(err);
            }
        };

        let mut state = self.lock();
        state.input = resp.text.clone();
        self.view.emit(ViewEvent::InputFilled(resp.text.clone()));
        let echo = format!("{VOICE_INPUT_PREFIX}{}", resp.text);
        self.append_locked(&mut state, Message::user(echo));
        Ok(())
    }

    /// Synthesizes the last answer and asks the view to play it.
    ///
    /// Without an answer this raises [`NO_ANSWER_ALERT`] and issues no
    /// request.  The audio URL is resolved against the backend origin.
    pub async fn text_to_voice(&self) -> Result<()> {
        let answer = {
            let state = self.lock();
            state.last_answer.clone().filter(|a| !a.is_empty())
        };
        let Some(answer) = answer else {
            self.alert(NO_ANSWER_ALERT);
            return Ok(());
        };

        self.lock().count_request(Endpoint::TextToVoice);
        let resp = match self
            .backend
            .text_to_voice(FormRequest::text_to_voice(answer))
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                self.lock().count_failure(Endpoint::TextToVoice);
                return Err(err);
            }
        };

        let url = resolve_audio_url(self.backend.origin(), &resp.audio)?;
        self.view.emit(ViewEvent::PlayAudio(url));
        Ok(())
    }

    /// Returns a snapshot of the conversation.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    /// Returns the most recent answer, if any.
    pub fn last_answer(&self) -> Option<String> {
        self.lock().last_answer.clone()
    }

    /// Returns the current contents of the input field.
    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    /// Replaces the contents of the input field.
    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    /// Returns the session identifier, if the variant uses one.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Returns the variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let state = self.lock();
        let user_messages = state.messages.iter().filter(|m| m.is_user()).count();
        SessionStats {
            variant: self.variant,
            session_id: self.session_id.clone(),
            message_count: state.messages.len(),
            user_messages,
            ai_messages: state.messages.len() - user_messages,
            has_answer: state
                .last_answer
                .as_deref()
                .is_some_and(|a| !a.is_empty()),
            alerts: state.alerts,
            endpoints: Endpoint::ALL
                .iter()
                .map(|endpoint| EndpointStats {
                    endpoint: *endpoint,
                    requests: state.requests[endpoint_index(*endpoint)],
                    failures: state.failures[endpoint_index(*endpoint)],
                })
                .collect(),
        }
    }

    fn alert(&self, text: impl Into<String>) {
        SESSION_ALERTS.click();
        self.lock().alerts += 1;
        self.view.emit(ViewEvent::Alert(text.into()));
    }

    fn append_locked(&self, state: &mut SessionState, message: Message) {
        state.messages.push(message.clone());
        self.view.emit(ViewEvent::MessageAppended(message));
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Empty input is left untouched; anything else is taken and the field cleared.
fn take_question(state: &mut SessionState) -> Option<String> {
    let question = state.input.trim();
    if question.is_empty() {
        return None;
    }
    let question = question.to_string();
    state.input.clear();
    Some(question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::FakeBackend;
    use crate::types::Sender;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn make_session(
        backend: FakeBackend,
        variant: Variant,
    ) -> (
        ChatSession<FakeBackend>,
        Arc<FakeBackend>,
        UnboundedReceiver<ViewEvent>,
    ) {
        let backend = Arc::new(backend);
        let (view, rx) = View::channel();
        let session = ChatSession::with_shared_backend(Arc::clone(&backend), variant, view);
        (session, backend, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn new_session_empty() {
        let (session, _, _) = make_session(FakeBackend::new(), Variant::Session);
        assert_eq!(session.message_count(), 0);
        assert!(session.last_answer().is_none());
        assert!(session.input().is_empty());
        assert!(
            session
                .session_id()
                .is_some_and(|id| id.as_str().starts_with("sess_"))
        );
    }

    #[test]
    fn classic_has_no_session_id() {
        let (session, _, _) = make_session(FakeBackend::new(), Variant::Classic);
        assert!(session.session_id().is_none());
    }

    #[tokio::test]
    async fn whitespace_input_is_ignored() {
        let (session, backend, mut rx) = make_session(FakeBackend::new(), Variant::Session);
        session.set_input("   \t ");
        session.send_message().await.unwrap();
        session.send_typed("").await.unwrap();
        assert!(backend.requests().is_empty());
        assert_eq!(session.message_count(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn send_appends_question_and_answer() {
        let (session, backend, mut rx) =
            make_session(FakeBackend::new().with_answer("4"), Variant::Session);
        session.set_input("  What is 2+2?  ");
        session.send_message().await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "What is 2+2?");
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].text, "4");
        assert_eq!(messages[1].sender, Sender::Ai);
        assert_eq!(session.last_answer().as_deref(), Some("4"));
        assert!(session.input().is_empty());

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text_field("question"), Some("What is 2+2?"));
        assert_eq!(
            requests[0].text_field("session_id"),
            session.session_id().map(|id| id.as_str())
        );

        let events = drain(&mut rx);
        assert!(matches!(&events[..], [
            ViewEvent::MessageAppended(q),
            ViewEvent::MessageAppended(a),
        ] if q.is_user() && a.text == "4"));
    }

    #[tokio::test]
    async fn classic_send_omits_session_id() {
        let (session, backend, _) = make_session(FakeBackend::new(), Variant::Classic);
        session.send_typed("hello").await.unwrap();
        let requests = backend.requests();
        assert_eq!(requests[0].field_names(), vec!["question"]);
    }

    #[tokio::test]
    async fn session_variant_reports_send_failure() {
        let (session, _, _) = make_session(FakeBackend::new().failing(), Variant::Session);
        session.send_typed("What is 2+2?").await.unwrap();
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, SEND_FAILURE_MESSAGE);
        assert!(session.last_answer().is_none());
        assert!(session.input().is_empty());
        assert_eq!(session.stats().total_failures(), 1);
    }

    #[tokio::test]
    async fn classic_variant_propagates_send_failure() {
        let (session, _, _) = make_session(FakeBackend::new().failing(), Variant::Classic);
        let err = session.send_typed("What is 2+2?").await.unwrap_err();
        assert!(err.is_connection());
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_user());
        assert!(session.input().is_empty());
    }

    #[tokio::test]
    async fn last_answer_is_overwritten() {
        let (session, backend, _) = make_session(FakeBackend::new().with_answer("first"), Variant::Session);
        session.send_typed("one").await.unwrap();
        backend.set_answer("second");
        session.send_typed("two").await.unwrap();
        assert_eq!(session.last_answer().as_deref(), Some("second"));
        assert_eq!(session.message_count(), 4);
    }

    #[tokio::test]
    async fn text_to_voice_requires_answer() {
        let (session, backend, mut rx) = make_session(FakeBackend::new(), Variant::Session);
        session.text_to_voice().await.unwrap();
        assert!(backend.requests().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![ViewEvent::Alert(NO_ANSWER_ALERT.to_string())]
        );
    }

    #[tokio::test]
    async fn text_to_voice_plays_on_origin() {
        let (session, backend, mut rx) = make_session(
            FakeBackend::new()
                .with_answer("Mitochondria make ATP.")
                .with_audio("http://elsewhere.example.com/uploads/answer.mp3"),
            Variant::Session,
        );
        session.send_typed("What do mitochondria do?").await.unwrap();
        drain(&mut rx);
        session.text_to_voice().await.unwrap();

        let requests = backend.requests();
        assert_eq!(
            requests[1].text_field("text"),
            Some("Mitochondria make ATP.")
        );
        match drain(&mut rx).as_slice() {
            [ViewEvent::PlayAudio(url)] => {
                assert_eq!(url.origin(), backend.origin().origin());
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_requires_file() {
        let (session, backend, mut rx) = make_session(FakeBackend::new(), Variant::Session);
        session
            .upload_notes(UploadIntent::new(None).with_admin(true))
            .await
            .unwrap();
        assert!(backend.requests().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![ViewEvent::Alert(NO_FILE_ALERT.to_string())]
        );
        assert_eq!(session.stats().alerts, 1);
    }

    #[tokio::test]
    async fn upload_sends_admin_flag() {
        let (session, backend, _) = make_session(FakeBackend::new(), Variant::Session);
        let file = SelectedFile::new("biology.txt", "cells");
        session
            .upload_notes(UploadIntent::new(Some(file.clone())).with_admin(true))
            .await
            .unwrap();
        session
            .upload_notes(UploadIntent::new(Some(file)))
            .await
            .unwrap();

        let requests = backend.requests();
        assert_eq!(requests[0].text_field("is_admin"), Some("true"));
        assert_eq!(requests[1].text_field("is_admin"), Some("false"));
        assert_eq!(
            requests[0].text_field("session_id"),
            session.session_id().map(|id| id.as_str())
        );
        assert_eq!(
            requests[0].file_field("file").map(|f| f.name.as_str()),
            Some("biology.txt")
        );
    }

    #[tokio::test]
    async fn upload_confirmation_by_variant() {
        let file = SelectedFile::new("biology.txt", "cells");

        let (session, _, mut rx) = make_session(
            FakeBackend::new().with_upload_message(Some("Stored for this tab")),
            Variant::Session,
        );
        session
            .upload_notes(UploadIntent::new(Some(file.clone())))
            .await
            .unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![ViewEvent::Alert("Stored for this tab".to_string())]
        );

        let (session, _, mut rx) =
            make_session(FakeBackend::new().with_upload_message(None), Variant::Session);
        session
            .upload_notes(UploadIntent::new(Some(file.clone())))
            .await
            .unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![ViewEvent::Alert(UPLOAD_CONFIRMATION.to_string())]
        );

        let (session, backend, mut rx) = make_session(
            FakeBackend::new().with_upload_message(Some("Stored for this tab")),
            Variant::Classic,
        );
        session
            .upload_notes(UploadIntent::new(Some(file)).with_admin(true))
            .await
            .unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![ViewEvent::Alert(UPLOAD_CONFIRMATION.to_string())]
        );
        assert_eq!(backend.requests()[0].field_names(), vec!["file"]);
    }

    #[tokio::test]
    async fn convert_voice_fills_input() {
        let (session, backend, mut rx) = make_session(
            FakeBackend::new().with_transcription("what is osmosis"),
            Variant::Session,
        );
        session.convert_voice(None).await.unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![ViewEvent::Alert(NO_AUDIO_ALERT.to_string())]
        );
        assert!(backend.requests().is_empty());

        session
            .convert_voice(Some(SelectedFile::new("question.wav", vec![0u8; 8])))
            .await
            .unwrap();
        assert_eq!(session.input(), "what is osmosis");
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "🎤 Voice Input: what is osmosis");
        assert!(messages[0].is_user());
        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            ViewEvent::InputFilled("what is osmosis".to_string())
        );

        session.send_message().await.unwrap();
        assert_eq!(
            backend.requests()[1].text_field("question"),
            Some("what is osmosis")
        );
    }

    #[tokio::test]
    async fn failures_other_than_send_propagate() {
        let (session, _, _) = make_session(FakeBackend::new().failing(), Variant::Session);
        let file = SelectedFile::new("notes.txt", "x");
        assert!(
            session
                .upload_notes(UploadIntent::new(Some(file.clone())))
                .await
                .is_err()
        );
        assert!(session.convert_voice(Some(file)).await.is_err());
        let stats = session.stats();
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.total_failures(), 2);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let (session, _, _) = make_session(FakeBackend::new(), Variant::Session);
        let other = session.clone();
        other.send_typed("shared?").await.unwrap();
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.session_id(), other.session_id());
    }

    #[tokio::test]
    async fn stats_count_messages() {
        let (session, _, _) = make_session(FakeBackend::new(), Variant::Session);
        session.send_typed("a").await.unwrap();
        session.send_typed("b").await.unwrap();
        let stats = session.stats();
        assert_eq!(stats.message_count, 4);
        assert_eq!(stats.user_messages, 2);
        assert_eq!(stats.ai_messages, 2);
        assert!(stats.has_answer);
        assert_eq!(stats.endpoints[0].requests, 2);
        assert_eq!(stats.endpoints[0].endpoint, Endpoint::Ask);
    }
}
