//! Configuration for GrokWriter.

use std::env;
use std::time::Duration;

use nudge_core::GenerationError;

/// System prompt used when `GROK_SYSTEM_PROMPT` is unset.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You write short, friendly wellness nudges for a \
personal health companion. Reply with the message text only: one or two sentences, at most \
one emoji, no medical advice, no hashtags, no quotes around the text.";

/// Configuration for GrokWriter.
#[derive(Debug, Clone)]
pub struct GrokWriterConfig {
    /// xAI API URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// System prompt framing every request.
    pub system_prompt: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// HTTP request timeout. The content selector applies its own, usually shorter, limit.
    pub request_timeout: Duration,
}

impl Default for GrokWriterConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.x.ai".to_string(),
            api_key: String::new(),
            model: "grok-4-1-fast".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: Some(120),
            temperature: Some(0.7),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl GrokWriterConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GROK_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GROK_API_URL` - API URL (default: https://api.x.ai)
    /// - `GROK_MODEL` - Model name (default: grok-4-1-fast)
    /// - `GROK_SYSTEM_PROMPT` - System prompt (default: [`DEFAULT_SYSTEM_PROMPT`])
    /// - `GROK_MAX_TOKENS` - Max tokens (default: 120)
    /// - `GROK_TEMPERATURE` - Temperature (default: 0.7)
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = env::var("GROK_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GenerationError::Configuration("GROK_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("GROK_API_URL").unwrap_or(defaults.api_url);

        let model = env::var("GROK_MODEL").unwrap_or(defaults.model);

        let system_prompt = env::var("GROK_SYSTEM_PROMPT")
            .ok()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(defaults.system_prompt);

        let max_tokens = env::var("GROK_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.max_tokens);

        let temperature = env::var("GROK_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.temperature);

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model,
            system_prompt,
            max_tokens,
            temperature,
            request_timeout: defaults.request_timeout,
        })
    }

    /// Like [`from_env`](Self::from_env), but `Ok(None)` when no API key is configured.
    pub fn from_env_optional() -> Result<Option<Self>, GenerationError> {
        match env::var("GROK_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Self::from_env().map(Some),
            _ => Ok(None),
        }
    }

    /// Create a new config builder.
    pub fn builder() -> GrokWriterConfigBuilder {
        GrokWriterConfigBuilder::default()
    }

    /// Chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_url)
    }
}

/// Builder for GrokWriterConfig.
#[derive(Debug, Default)]
pub struct GrokWriterConfigBuilder {
    config: GrokWriterConfig,
}

impl GrokWriterConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the HTTP request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GrokWriterConfig {
        self.config
    }
}
