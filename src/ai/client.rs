use super::content::GenerateContentRequest;
use async_trait::async_trait;
use serde::Deserialize;

/// Reply text used when the endpoint answered but carried no usable text.
pub const NO_RESPONSE: &str = "No response received.";

/// Reply text used when the call itself failed.
pub const FALLBACK_APOLOGY: &str = "Sorry - Something went wrong. Please try again!";

// ============================================
// Error Types
// ============================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generative endpoint error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;

/// A generative endpoint reachable with one `generateContent` call.
///
/// Implementations return the raw body of a 2xx response and map everything
/// else to an error; interpreting the body is left to [`parse_generate_response`].
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_content(&self, request: &GenerateContentRequest) -> ChatResult<String>;
}

// ============================================
// Response parsing
// ============================================

#[derive(Debug)]
pub enum GenerationOutcome {
    Success { text: String },
    /// Decodable body without a first candidate's first text part.
    Malformed,
    TransportError(ChatError),
}

impl GenerationOutcome {
    /// Text appended to the transcript for this outcome.
    pub fn into_reply(self) -> String {
        match self {
            GenerationOutcome::Success { text } => text,
            GenerationOutcome::Malformed => {
                tracing::debug!("generateContent response carried no text");
                NO_RESPONSE.to_string()
            }
            GenerationOutcome::TransportError(err) => {
                tracing::warn!(error = %err, "generateContent call failed");
                FALLBACK_APOLOGY.to_string()
            }
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Turn a 2xx `generateContent` body into an outcome.
///
/// Only `candidates[0].content.parts[0].text` is read. An empty string counts
/// as missing.
pub fn parse_generate_response(body: &str) -> GenerationOutcome {
    let parsed = match serde_json::from_str::<GenerateContentResponse>(body) {
        Ok(parsed) => parsed,
        Err(err) => return GenerationOutcome::TransportError(ChatError::from(err)),
    };

    let text = parsed
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.is_empty());

    match text {
        Some(text) => GenerationOutcome::Success { text },
        None => GenerationOutcome::Malformed,
    }
}
