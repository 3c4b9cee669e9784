use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use super::{ChatMessage, TextGenerator};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completions client for an OpenAI-compatible generation service.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenAiGenerator {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        api_key: Option<&str>,
    ) -> Result<String> {
        let key = api_key
            .filter(|k| !k.is_empty())
            .unwrap_or(self.api_key.as_str());
        if key.is_empty() {
            return Err(anyhow::anyhow!(
                "API key required: set OPENAI_API_KEY or provide one in the request"
            ));
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        info!("Requesting completion from {} ({} messages)", url, messages.len());

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(key)
            .json(&CompletionRequest { model: &self.model, messages, max_tokens })
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("generation request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "generation service returned {}",
                response.status()
            ));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("malformed generation response: {}", e))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("generation response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_everywhere_is_an_error() {
        let generator = OpenAiGenerator::new("http://localhost:0", "");
        let messages = [ChatMessage::user("hello")];

        let err = generator.complete(&messages, 10, None).await.unwrap_err();
        assert!(err.to_string().contains("API key required"));

        // an empty per-request key does not count as an override
        let err = generator.complete(&messages, 10, Some("")).await.unwrap_err();
        assert!(err.to_string().contains("API key required"));
    }
}
