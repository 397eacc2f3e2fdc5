//! Configuration management for llm-panel

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PanelError, Result};

const DEFAULT_JUDGE_INSTRUCTIONS: &str = "Evaluate which answer is best and explain why.\n\
Then provide a final improved summarized answer.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider configurations, keyed by short name
    pub providers: HashMap<String, ProviderConfig>,

    /// Panel composition and judging
    pub panel: PanelConfig,

    /// Console preferences
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible base URL (without `/chat/completions`)
    pub endpoint: String,

    /// API key (can be env var reference like $GROQ_API_KEY)
    pub api_key: String,

    /// Model to use
    pub model: String,

    /// Whether this provider is enabled
    pub enabled: bool,

    /// Max tokens for responses
    pub max_tokens: Option<u32>,

    /// Temperature setting
    pub temperature: Option<f32>,

    /// Upper bound on a single call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Providers queried on the full pipeline, in report order
    pub members: Vec<String>,

    /// Provider that synthesizes the final answer
    pub judge: String,

    /// Provider answering simple queries on its own
    pub fast_path: String,

    /// Closing instructions appended to the judge prompt
    #[serde(default = "default_judge_instructions")]
    pub judge_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show a spinner while providers are working
    pub show_progress: bool,

    /// Colorize report headers
    pub color: bool,

    /// Prompt printed before each question
    pub prompt: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_judge_instructions() -> String {
    DEFAULT_JUDGE_INSTRUCTIONS.to_string()
}

/// API keys resolved once at startup, keyed by provider name.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: HashMap<String, String>,
}

impl Credentials {
    pub fn get(&self, provider: &str) -> Option<&str> {
        self.keys.get(provider).map(String::as_str)
    }

    pub fn insert(&mut self, provider: impl Into<String>, key: impl Into<String>) {
        self.keys.insert(provider.into(), key.into());
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut providers = HashMap::new();

        providers.insert(
            "groq".to_string(),
            ProviderConfig {
                endpoint: "https://api.groq.com/openai/v1".to_string(),
                api_key: "$GROQ_API_KEY".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                enabled: true,
                max_tokens: None,
                temperature: None,
                timeout_secs: default_timeout_secs(),
            },
        );

        providers.insert(
            "mistral".to_string(),
            ProviderConfig {
                endpoint: "https://api.mistral.ai/v1".to_string(),
                api_key: "$MISTRAL_API_KEY".to_string(),
                model: "mistral-small-latest".to_string(),
                enabled: true,
                max_tokens: None,
                temperature: None,
                timeout_secs: default_timeout_secs(),
            },
        );

        providers.insert(
            "openrouter".to_string(),
            ProviderConfig {
                endpoint: "https://openrouter.ai/api/v1".to_string(),
                api_key: "$OPENROUTER_API_KEY".to_string(),
                model: "meta-llama/llama-3.1-8b-instruct:free".to_string(),
                enabled: true,
                max_tokens: None,
                temperature: None,
                timeout_secs: default_timeout_secs(),
            },
        );

        Self {
            providers,
            panel: PanelConfig {
                members: vec![
                    "groq".to_string(),
                    "mistral".to_string(),
                    "openrouter".to_string(),
                ],
                judge: "groq".to_string(),
                fast_path: "groq".to_string(),
                judge_instructions: default_judge_instructions(),
            },
            ui: UiConfig {
                show_progress: true,
                color: true,
                prompt: "Enter your question: ".to_string(),
            },
        }
    }
}

impl Config {
    /// Load config from an explicit path, the default path, or built-in defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    return Err(PanelError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(&path)?
            }
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Config::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("llm-panel")
            .join("config.toml")
    }

    /// Check that every provider the panel refers to exists and is enabled
    pub fn validate(&self) -> Result<()> {
        if self.panel.members.is_empty() {
            return Err(PanelError::Config("panel.members is empty".to_string()));
        }

        for name in self.required_providers() {
            match self.providers.get(name) {
                None => {
                    return Err(PanelError::Config(format!(
                        "panel refers to unknown provider '{}'",
                        name
                    )))
                }
                Some(p) if !p.enabled => {
                    return Err(PanelError::Config(format!(
                        "panel refers to disabled provider '{}'",
                        name
                    )))
                }
                Some(p) if p.timeout_secs == 0 => {
                    return Err(PanelError::Config(format!(
                        "providers.{}.timeout_secs must be at least 1",
                        name
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Members, judge and fast-path provider, each named once
    pub fn required_providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self
            .panel
            .members
            .iter()
            .chain(std::iter::once(&self.panel.judge))
            .chain(std::iter::once(&self.panel.fast_path));

        for name in all {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Resolve API key from config (handles env var references)
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        self.resolve_api_key_with(provider, |var| std::env::var(var).ok())
    }

    fn resolve_api_key_with<F>(&self, provider: &str, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.providers.get(provider).and_then(|p| {
            if let Some(var) = p.api_key.strip_prefix('$') {
                lookup(var).filter(|v| !v.trim().is_empty())
            } else if p.api_key.is_empty() {
                None
            } else {
                Some(p.api_key.clone())
            }
        })
    }

    /// Resolve every required credential from the process environment
    pub fn resolve_credentials(&self) -> Result<Credentials> {
        self.resolve_credentials_with(|var| std::env::var(var).ok())
    }

    /// Resolve every required credential; a missing one is a fatal error
    pub fn resolve_credentials_with<F>(&self, lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut credentials = Credentials::default();

        for name in self.required_providers() {
            match self.resolve_api_key_with(name, &lookup) {
                Some(key) => credentials.insert(name, key),
                None => {
                    let var = self
                        .providers
                        .get(name)
                        .and_then(|p| p.api_key.strip_prefix('$'))
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("providers.{}.api_key", name));
                    return Err(PanelError::MissingApiKey {
                        provider: name.to_string(),
                        var,
                    });
                }
            }
        }

        Ok(credentials)
    }
}
