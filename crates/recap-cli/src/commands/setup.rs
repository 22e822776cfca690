//! Interactive configuration wizard.
//!
//! Flow:
//! 1. Select LLM provider (with [configured] markers for existing keys)
//! 2. Enter/confirm the API key with basic format validation
//! 3. Pick a model from the provider's catalog
//! 4. Optionally configure the whisper server and a custom summary prompt

use anyhow::{Result, anyhow};
use console::style;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};
use recap_core::{FileSecretStore, LlmProvider, SecretStore, Settings};

pub fn run() -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut settings = Settings::load();
    let secrets_path = FileSecretStore::default_path()
        .ok_or_else(|| anyhow!("could not determine config directory"))?;
    let secrets = FileSecretStore::new(secrets_path);

    println!();
    println!("{}", style("recap setup").bold().cyan());
    println!();

    // Provider selection with markers for already-configured keys
    let providers = LlmProvider::all();
    let items: Vec<String> = providers
        .iter()
        .map(|provider| {
            let configured = if !provider.requires_api_key() {
                " [no key needed]"
            } else if secrets.get(provider.as_str()).unwrap_or(None).is_some() {
                " [configured]"
            } else {
                ""
            };
            format!("{}{}", provider.display_name(), configured)
        })
        .collect();
    let default = providers
        .iter()
        .position(|p| *p == settings.llm.provider)
        .unwrap_or(0);
    let choice = Select::with_theme(&theme)
        .with_prompt("Which provider?")
        .items(&items)
        .default(default)
        .interact()?;
    let provider = providers[choice].clone();

    if provider.requires_api_key() {
        let existing = secrets.get(provider.as_str())?;
        let keep = existing.is_some()
            && Select::with_theme(&theme)
                .with_prompt("Keep current key?")
                .items(&["Yes", "No"])
                .default(0)
                .interact()?
                == 0;
        if !keep {
            if let Some(url) = api_key_url(&provider) {
                println!("{} Get your API key from: {url}", style("ℹ").blue());
            }
            let api_key = prompt_and_validate_key(&theme, &provider)?;
            secrets.put(provider.as_str(), &api_key)?;
        }
    } else {
        let ollama_url: String = Input::with_theme(&theme)
            .with_prompt("Ollama server URL")
            .default(settings.llm.ollama_url.clone())
            .interact_text()?;
        settings.llm.ollama_url = ollama_url;
    }

    // Model selection from the provider catalog
    let models = provider.available_models();
    let default_model = models
        .iter()
        .position(|m| settings.llm.model.as_deref() == Some(m))
        .unwrap_or(0);
    let model_choice = Select::with_theme(&theme)
        .with_prompt("Which model?")
        .items(models)
        .default(default_model)
        .interact()?;
    settings.llm.model = Some(models[model_choice].to_string());
    settings.llm.provider = provider;

    // Transcription server
    if Confirm::with_theme(&theme)
        .with_prompt("Configure the whisper transcription server?")
        .default(settings.transcription.server_url.is_none())
        .interact()?
    {
        let current = settings
            .transcription
            .server_url
            .clone()
            .unwrap_or_else(|| "http://localhost:8765".to_string());
        let url: String = Input::with_theme(&theme)
            .with_prompt("Whisper server URL")
            .default(current)
            .interact_text()?;
        settings.transcription.server_url = Some(url);
    }

    // Custom summary prompt
    if Confirm::with_theme(&theme)
        .with_prompt("Use a custom summary prompt?")
        .default(settings.llm.summary_prompt.is_some())
        .interact()?
    {
        let current = settings.summary_instruction();
        let prompt: String = Input::with_theme(&theme)
            .with_prompt("Summary prompt")
            .default(current)
            .interact_text()?;
        settings.llm.summary_prompt = Some(prompt);
    }

    settings.save()?;
    println!("{} Setup complete", style("✓").green().bold());
    Ok(())
}

/// Prompt for an API key, looping until the format looks plausible.
fn prompt_and_validate_key(theme: &ColorfulTheme, provider: &LlmProvider) -> Result<String> {
    loop {
        let api_key = Password::with_theme(theme)
            .with_prompt(format!("{} API key", provider.display_name()))
            .interact()?;

        let validation = match provider {
            LlmProvider::OpenAi if !api_key.starts_with("sk-") => {
                Err("Invalid OpenAI key format. Keys start with 'sk-'")
            }
            LlmProvider::Anthropic if !api_key.starts_with("sk-ant-") => {
                Err("Invalid Anthropic key format. Keys start with 'sk-ant-'")
            }
            _ if api_key.len() < 20 => Err("API key seems too short"),
            _ => Ok(()),
        };

        match validation {
            Ok(()) => return Ok(api_key),
            Err(message) => eprintln!("{} {message}", style("✗").red().bold()),
        }
    }
}

fn api_key_url(provider: &LlmProvider) -> Option<&'static str> {
    match provider {
        LlmProvider::OpenAi => Some("https://platform.openai.com/api-keys"),
        LlmProvider::Anthropic => Some("https://console.anthropic.com/settings/keys"),
        LlmProvider::Gemini => Some("https://aistudio.google.com/app/apikey"),
        LlmProvider::Mistral => Some("https://console.mistral.ai/api-keys"),
        LlmProvider::Ollama => None,
    }
}
