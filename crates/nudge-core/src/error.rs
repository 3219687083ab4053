//! Error types for the nudge engine.

use thiserror::Error;

/// Errors from a text-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service is temporarily unavailable.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// Network error talking to the service.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be completed.
    #[error("generation failed: {0}")]
    ProcessingFailed(String),

    /// The service answered with no usable text.
    #[error("generator returned empty text")]
    Empty,

    /// The service did not answer in time.
    #[error("generation timed out")]
    Timeout,

    /// The generator is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Stored preferences that cannot drive a nudge decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    /// A required setting is absent.
    #[error("missing {0}")]
    Missing(&'static str),

    /// A setting could not be parsed.
    #[error("invalid {field}: {value:?}")]
    Invalid { field: &'static str, value: String },
}

impl PreferenceError {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            value: value.into(),
        }
    }
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
