//! Error types for llm-panel

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} returned an error: {message}")]
    Provider { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No API key configured for {provider} (set {var})")]
    MissingApiKey { provider: String, var: String },

    #[error("timeout")]
    Timeout,

    #[error("cancelled")]
    Cancelled,
}

impl PanelError {
    /// Short reason carried by a failed provider result.
    pub fn reason(&self) -> String {
        match self {
            PanelError::Network(e) if e.is_timeout() => "timeout".to_string(),
            PanelError::Network(e) if e.is_connect() => format!("connection failed: {}", e),
            PanelError::Network(e) if e.is_decode() => format!("malformed response: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
