//! Application settings.
//!
//! One JSON document under the user config dir. The settings value is loaded
//! once at startup and passed explicitly into the pipeline and LLM client;
//! there is no ambient global configuration. A missing or unreadable file
//! falls back to defaults so a fresh install works without a setup step.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::llm::{DEFAULT_OLLAMA_URL, DEFAULT_SUMMARY_PROMPT};
use crate::provider::LlmProvider;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub transcription: TranscriptionSettings,

    /// Override for the data directory (recordings index, documents, audio)
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

/// Settings for summary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Default provider for new summaries
    #[serde(default)]
    pub provider: LlmProvider,

    /// Default model (None = provider default)
    #[serde(default)]
    pub model: Option<String>,

    /// Custom summary instruction (None = built-in prompt)
    #[serde(default)]
    pub summary_prompt: Option<String>,

    /// Ollama server URL
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            summary_prompt: None,
            ollama_url: default_ollama_url(),
        }
    }
}

/// Settings for the transcription engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Whisper server URL (e.g. http://localhost:8765)
    #[serde(default)]
    pub server_url: Option<String>,

    /// Optional API key for the whisper server
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name passed to the server (None = server default)
    #[serde(default)]
    pub model: Option<String>,

    /// Optional language hint (e.g. "en", "pl")
    #[serde(default)]
    pub language: Option<String>,
}

impl Settings {
    /// Path of the settings document under the user config dir.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("recap").join("settings.json"))
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(settings) => settings,
                Err(err) => {
                    crate::warn!("settings file is corrupted, using defaults: {err}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist settings to the config dir.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Model to use for the given provider, falling back to its default.
    pub fn resolve_model(&self, provider: &LlmProvider) -> String {
        if *provider == self.llm.provider
            && let Some(model) = &self.llm.model
        {
            return model.clone();
        }
        provider.default_model().to_string()
    }

    /// Summary instruction, falling back to the built-in prompt.
    pub fn summary_instruction(&self) -> String {
        self.llm
            .summary_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SUMMARY_PROMPT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_model_prefers_configured_model_for_matching_provider() {
        let mut settings = Settings::default();
        settings.llm.provider = LlmProvider::Mistral;
        settings.llm.model = Some("mistral-small-latest".to_string());

        assert_eq!(
            settings.resolve_model(&LlmProvider::Mistral),
            "mistral-small-latest"
        );
        // A different provider falls back to its own default
        assert_eq!(settings.resolve_model(&LlmProvider::OpenAi), "gpt-4o");
    }

    #[test]
    fn summary_instruction_falls_back_to_builtin() {
        let settings = Settings::default();
        assert_eq!(settings.summary_instruction(), DEFAULT_SUMMARY_PROMPT);

        let mut settings = Settings::default();
        settings.llm.summary_prompt = Some("One sentence only.".to_string());
        assert_eq!(settings.summary_instruction(), "One sentence only.");
    }

    #[test]
    fn settings_deserialize_from_partial_document() {
        let settings: Settings = serde_json::from_str(r#"{"llm":{"provider":"gemini"}}"#).unwrap();
        assert_eq!(settings.llm.provider, LlmProvider::Gemini);
        assert_eq!(settings.llm.ollama_url, DEFAULT_OLLAMA_URL);
        assert!(settings.transcription.server_url.is_none());
    }
}
