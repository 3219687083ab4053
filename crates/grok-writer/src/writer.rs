//! GrokWriter: nudge wording via the xAI chat-completions API.

use async_trait::async_trait;
use nudge_core::{GenerationError, PromptContext, TextGenerator};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::GrokWriterConfig;

/// A [`TextGenerator`] backed by xAI's Grok models.
///
/// Stateless: every nudge is a fresh two-message conversation (system prompt
/// plus the rendered [`PromptContext`]).
pub struct GrokWriter {
    client: Client,
    config: GrokWriterConfig,
}

impl GrokWriter {
    /// Create a new GrokWriter with the given configuration.
    pub fn new(config: GrokWriterConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                GenerationError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("GrokWriter initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a GrokWriter from environment variables, or `None` when no key is set.
    pub fn from_env_optional() -> Result<Option<Self>, GenerationError> {
        GrokWriterConfig::from_env_optional()?
            .map(Self::new)
            .transpose()
    }

    /// Get the configuration.
    pub fn config(&self) -> &GrokWriterConfig {
        &self.config
    }

    fn build_messages(&self, context: &PromptContext) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(&self.config.system_prompt),
            ChatMessage::user(context.to_prompt()),
        ]
    }

    /// Make a chat completion request to the xAI API.
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResponse, GenerationError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to xAI API: {:?}", request);

        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);
            let message = format!("API error ({}): {}", status.as_u16(), detail);

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                return Err(GenerationError::Unavailable(message));
            }
            return Err(GenerationError::ProcessingFailed(message));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            GenerationError::ProcessingFailed(format!("Failed to parse response: {}", e))
        })?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl TextGenerator for GrokWriter {
    async fn generate(&self, context: &PromptContext) -> Result<String, GenerationError> {
        let completion = self.chat_completion(self.build_messages(context)).await?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| clean_reply(&text))
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "GrokWriter"
    }
}

/// Trim whitespace and one layer of wrapping quotes.
fn clean_reply(text: &str) -> String {
    let text = text.trim();
    let unquoted = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    unquoted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_name() {
        let writer = GrokWriter::new(GrokWriterConfig::builder().api_key("k").build()).unwrap();
        assert_eq!(writer.name(), "GrokWriter");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            GrokWriter::new(GrokWriterConfig::default()),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn test_clean_reply() {
        assert_eq!(clean_reply("  \"Walk it out!\" \n"), "Walk it out!");
        assert_eq!(clean_reply("Sip some water"), "Sip some water");
        assert_eq!(clean_reply("\""), "\"");
        assert_eq!(clean_reply("   "), "");
    }
}
