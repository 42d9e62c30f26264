use crate::ai::client::{ChatError, ChatResult, GenerativeBackend};
use crate::ai::content::GenerateContentRequest;
use crate::config::GeminiConfig;
use async_trait::async_trait;

/// Client for the Gemini `generateContent` endpoint, authenticated with the
/// `key` query parameter.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_content(&self, request: &GenerateContentRequest) -> ChatResult<String> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Status { status, body });
        }

        tracing::debug!(model = %self.model, bytes = body.len(), "generateContent ok");
        Ok(body)
    }
}
