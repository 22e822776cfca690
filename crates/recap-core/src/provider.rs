use std::fmt;

use serde::{Deserialize, Serialize};

/// Available LLM providers for summary generation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Anthropic,
    Gemini,
    Mistral,
    Ollama,
}

impl LlmProvider {
    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Mistral => "mistral",
            LlmProvider::Ollama => "ollama",
        }
    }

    /// Human-readable display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OpenAI",
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::Gemini => "Google Gemini",
            LlmProvider::Mistral => "Mistral AI",
            LlmProvider::Ollama => "Ollama",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::Mistral => "MISTRAL_API_KEY",
            LlmProvider::Ollama => "OLLAMA_URL",
        }
    }

    /// Whether this provider requires an API key (Ollama runs locally)
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }

    /// Default model when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o",
            LlmProvider::Anthropic => "claude-3-opus-20240229",
            LlmProvider::Gemini => "gemini-1.5-pro",
            LlmProvider::Mistral => "mistral-large-latest",
            LlmProvider::Ollama => "llama3",
        }
    }

    /// Known models for this provider, surfaced by the setup wizard
    pub fn available_models(&self) -> &'static [&'static str] {
        match self {
            LlmProvider::OpenAi => &["gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
            LlmProvider::Anthropic => &[
                "claude-3-opus-20240229",
                "claude-3-sonnet-20240229",
                "claude-3-haiku-20240307",
            ],
            LlmProvider::Gemini => &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-pro"],
            LlmProvider::Mistral => &[
                "mistral-large-latest",
                "mistral-medium-latest",
                "mistral-small-latest",
            ],
            LlmProvider::Ollama => &["llama3", "mistral", "gemma"],
        }
    }

    /// List all available providers
    pub fn all() -> &'static [LlmProvider] {
        &[
            LlmProvider::OpenAi,
            LlmProvider::Anthropic,
            LlmProvider::Gemini,
            LlmProvider::Mistral,
            LlmProvider::Ollama,
        ]
    }

    /// Label identifying a provider/model pair, stored on generated summaries
    pub fn label(&self, model: &str) -> String {
        format!("{} - {}", self.display_name(), model)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "mistral" => Ok(LlmProvider::Mistral),
            "ollama" => Ok(LlmProvider::Ollama),
            _ => Err(format!(
                "Unknown provider: {}. Available: openai, anthropic, gemini, mistral, ollama",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_provider() {
        for provider in LlmProvider::all() {
            let parsed: LlmProvider = provider.as_str().parse().unwrap();
            assert_eq!(&parsed, provider);
        }
    }

    #[test]
    fn parse_rejects_unknown_provider() {
        assert!("copilot".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn only_ollama_skips_api_key() {
        for provider in LlmProvider::all() {
            assert_eq!(
                provider.requires_api_key(),
                *provider != LlmProvider::Ollama
            );
        }
    }

    #[test]
    fn default_model_is_listed_as_available() {
        for provider in LlmProvider::all() {
            assert!(
                provider
                    .available_models()
                    .contains(&provider.default_model())
            );
        }
    }

    #[test]
    fn label_combines_display_name_and_model() {
        assert_eq!(LlmProvider::OpenAi.label("m1"), "OpenAI - m1");
        assert_eq!(
            LlmProvider::Mistral.label("mistral-large-latest"),
            "Mistral AI - mistral-large-latest"
        );
    }
}
