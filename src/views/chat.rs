use crate::ai::{ChatSession, ImageAttachment, SessionState, SubmitStatus};
use crate::types::{ChatMessage, Role};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

const ASSISTANT_NAME: &str = "Pet assistant";

/// Input state under the transcript: the text box and the picked image.
#[derive(Default)]
pub struct Composer {
    input: String,
    image: Option<ImageAttachment>,
}

impl Composer {
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.image = Some(image);
    }

    pub fn remove_image(&mut self) -> Option<ImageAttachment> {
        self.image.take()
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    /// Whether the send button is enabled.
    pub fn can_send(&self, session: &ChatSession) -> bool {
        session.can_submit(&self.input, self.image.is_some())
    }

    /// Submit the current input. The text box is cleared right away; the image
    /// is handed to the session and does not come back.
    pub async fn send(&mut self, session: &ChatSession) -> SubmitStatus {
        if session.state() == SessionState::Generating {
            return SubmitStatus::Busy;
        }
        let text = std::mem::take(&mut self.input);
        let image = self.image.take();
        session.submit(&text, image).await
    }
}

/// Renders transcript lines incrementally, newest last.
#[derive(Default)]
pub struct TranscriptView {
    rendered: usize,
}

impl TranscriptView {
    /// Lines for messages not rendered yet.
    pub fn render_new(&mut self, session: &ChatSession) -> Vec<String> {
        let fresh = session.messages_since(self.rendered);
        self.rendered += fresh.len();
        fresh.iter().map(render_message).collect()
    }
}

pub fn render_message(msg: &ChatMessage) -> String {
    let speaker = match msg.role {
        Role::User => "You",
        Role::Assistant | Role::Answer => ASSISTANT_NAME,
    };
    let marker = if msg.role == Role::Answer { "*" } else { "" };
    let mut line = match format_message_timestamp(msg.created_at) {
        Some(ts) => format!("[{ts}] {marker}{speaker}: {}", msg.content),
        None => format!("{marker}{speaker}: {}", msg.content),
    };
    if msg.image.is_some() {
        line.push_str(" [image]");
    }
    line
}

fn format_message_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ChatResult, GenerateContentRequest, GenerativeBackend};
    use crate::types::PreviewRef;
    use async_trait::async_trait;
    use std::sync::Arc;
    use time::macros::datetime;

    struct Echo;

    #[async_trait]
    impl GenerativeBackend for Echo {
        async fn generate_content(&self, _request: &GenerateContentRequest) -> ChatResult<String> {
            Ok(r#"{"candidates":[{"content":{"parts":[{"text":"pong"}]}}]}"#.into())
        }
    }

    #[test]
    fn timestamp_uses_twelve_hour_clock() {
        let formatted = datetime!(2025-03-14 15:07 UTC)
            .format(MESSAGE_TIME_FORMAT)
            .unwrap();
        assert_eq!(formatted, "03:07 PM");
    }

    #[test]
    fn image_messages_are_marked() {
        let mut msg = ChatMessage::user("look", Some(PreviewRef::new()));
        assert!(render_message(&msg).ends_with("You: look [image]"));
        msg.image = None;
        assert!(render_message(&msg).ends_with("You: look"));
    }

    #[tokio::test]
    async fn send_clears_input_and_image() {
        let session = ChatSession::new(Arc::new(Echo));
        let mut composer = Composer::default();
        composer.set_input("ping");
        composer.attach_image(ImageAttachment::from_bytes("image/png", b"p"));
        assert!(composer.can_send(&session));

        assert_eq!(composer.send(&session).await, SubmitStatus::Completed);
        assert_eq!(composer.input(), "");
        assert!(composer.image().is_none());
        assert!(!composer.can_send(&session));
        assert_eq!(composer.send(&session).await, SubmitStatus::Empty);
    }

    #[tokio::test]
    async fn renders_each_message_once() {
        let session = ChatSession::new(Arc::new(Echo));
        let mut view = TranscriptView::default();
        session.submit("ping", None).await;

        let lines = view.render_new(&session);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("You: ping"));
        assert!(lines[1].ends_with("*Pet assistant: pong"));
        assert!(view.render_new(&session).is_empty());
    }
}
