use super::client::{GenerationOutcome, GenerativeBackend, parse_generate_response};
use super::content::{ImageAttachment, build_request};
use crate::types::ChatMessage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Generating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Both messages of the cycle were appended.
    Completed,
    /// Nothing to send: blank text and no image.
    Empty,
    /// Another cycle is still generating.
    Busy,
}

#[derive(Default)]
struct Transcript {
    messages: Vec<ChatMessage>,
    generating: bool,
}

/// One chat conversation with the generative endpoint.
///
/// Clones share the same transcript, so a view can keep reading while a
/// [`submit`](Self::submit) is awaiting the endpoint. The transcript is
/// append-only and lives as long as the session does.
#[derive(Clone)]
pub struct ChatSession {
    backend: Arc<dyn GenerativeBackend>,
    transcript: Arc<Mutex<Transcript>>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            transcript: Arc::new(Mutex::new(Transcript::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        if self.lock().generating {
            SessionState::Generating
        } else {
            SessionState::Idle
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    /// Messages appended at or after `index`.
    pub fn messages_since(&self, index: usize) -> Vec<ChatMessage> {
        let transcript = self.lock();
        transcript
            .messages
            .get(index..)
            .map(<[ChatMessage]>::to_vec)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    /// Whether a submit with this input would be accepted right now.
    pub fn can_submit(&self, text: &str, has_image: bool) -> bool {
        (has_image || !text.trim().is_empty()) && self.state() == SessionState::Idle
    }

    /// Run one request/response cycle.
    ///
    /// The user message is appended before the endpoint is called. Failures are
    /// absorbed into the appended reply; the image is dropped when the cycle ends.
    pub async fn submit(&self, text: &str, image: Option<ImageAttachment>) -> SubmitStatus {
        let text = text.trim();
        if text.is_empty() && image.is_none() {
            return SubmitStatus::Empty;
        }

        {
            let mut transcript = self.lock();
            if transcript.generating {
                return SubmitStatus::Busy;
            }
            let preview = image.as_ref().map(|img| img.preview().clone());
            transcript.messages.push(ChatMessage::user(text, preview));
            transcript.generating = true;
        }

        let request = build_request(text, image.as_ref());
        let outcome = match self.backend.generate_content(&request).await {
            Ok(body) => parse_generate_response(&body),
            Err(err) => GenerationOutcome::TransportError(err),
        };
        let reply = outcome.into_reply();
        drop(image);

        let mut transcript = self.lock();
        transcript.messages.push(ChatMessage::answer(reply));
        transcript.generating = false;
        SubmitStatus::Completed
    }
}
