//! Error types for the contextual chat client

use thiserror::Error;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Chat client errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (raised at construction time)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected user input (blank names and the like)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// URL that does not parse as an absolute URL
    #[error("Please enter a valid URL (e.g., https://example.com): {0}")]
    InvalidUrl(String),

    /// URL already present in the group
    #[error("This URL has already been added: {0}")]
    DuplicateUrl(String),

    /// Unknown knowledge base group
    #[error("URL group not found: {0}")]
    GroupNotFound(String),

    /// Built-in groups cannot be edited or deleted
    #[error("URL group is not editable: {0}")]
    GroupNotEditable(String),

    /// The model API rejected the key
    #[error("Invalid API Key. Please check your API_KEY environment variable.")]
    InvalidApiKey,

    /// The model API quota is exhausted
    #[error("API quota exceeded. Please check your Gemini API quota.")]
    QuotaExceeded,

    /// Any other model API failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Whether the error came from the model API rather than local state
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::InvalidApiKey | Error::QuotaExceeded | Error::Llm(_) | Error::Http(_)
        )
    }
}
