/// AI assistant module for petpal
///
/// This module owns everything between the chat composer and the generative
/// endpoint: payload construction, the HTTP provider, response parsing and the
/// transcript-keeping session.
///
/// # Architecture
///
/// - `client` - Error type, backend trait, and the explicit response-parsing step
/// - `content` - Request payload parts and image attachments
/// - `providers` - Concrete endpoints (Gemini `generateContent`)
/// - `session` - `ChatSession`, one request/response cycle at a time
///
/// # Usage
///
/// ```rust,no_run
/// use petpal::ai::{ChatSession, GeminiClient};
/// use petpal::config::Config;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let session = ChatSession::new(Arc::new(GeminiClient::new(&config.gemini)));
/// session.submit("How often should I walk a beagle?", None).await;
/// # Ok(())
/// # }
/// ```
mod client;
mod content;
mod providers;
mod session;

pub use client::{
    ChatError, ChatResult, FALLBACK_APOLOGY, GenerationOutcome, GenerativeBackend, NO_RESPONSE,
    parse_generate_response,
};
pub use content::{
    Content, GenerateContentRequest, ImageAttachment, InlineData, Part, build_request,
    strip_data_url_prefix,
};
pub use providers::GeminiClient;
pub use session::{ChatSession, SessionState, SubmitStatus};
