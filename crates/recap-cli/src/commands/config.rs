//! Non-interactive configuration.

use anyhow::{Result, anyhow};
use clap::Args;
use recap_core::{FileSecretStore, LlmProvider, SecretStore, Settings};

#[derive(Args)]
pub struct ConfigArgs {
    /// Default LLM provider (openai, anthropic, gemini, mistral, ollama)
    #[arg(long)]
    provider: Option<String>,

    /// Default model for the configured provider
    #[arg(long)]
    model: Option<String>,

    /// API key for the configured (or --provider) provider
    #[arg(long)]
    api_key: Option<String>,

    /// Custom summary prompt
    #[arg(long)]
    prompt: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    ollama_url: Option<String>,

    /// Whisper transcription server URL
    #[arg(long)]
    whisper_url: Option<String>,

    /// Whisper model name
    #[arg(long)]
    whisper_model: Option<String>,

    /// Transcription language hint (e.g. "en", "pl")
    #[arg(long)]
    language: Option<String>,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = Settings::load();
    let secrets_path = FileSecretStore::default_path()
        .ok_or_else(|| anyhow!("could not determine config directory"))?;
    let secrets = FileSecretStore::new(secrets_path);

    let mut changed = false;

    let provider: LlmProvider = match &args.provider {
        Some(name) => {
            let provider = name
                .parse()
                .map_err(|err: String| anyhow!(err))?;
            settings.llm.provider = provider;
            // A provider switch invalidates the previously pinned model
            if args.model.is_none() {
                settings.llm.model = None;
            }
            changed = true;
            settings.llm.provider.clone()
        }
        None => settings.llm.provider.clone(),
    };

    if let Some(model) = args.model {
        settings.llm.model = Some(model);
        changed = true;
    }
    let mut stored_key = false;
    if let Some(api_key) = args.api_key {
        if !provider.requires_api_key() {
            return Err(anyhow!("{} does not use an API key", provider.display_name()));
        }
        secrets.put(provider.as_str(), &api_key)?;
        println!("Stored API key for {}", provider.display_name());
        stored_key = true;
    }
    if let Some(prompt) = args.prompt {
        settings.llm.summary_prompt = if prompt.is_empty() { None } else { Some(prompt) };
        changed = true;
    }
    if let Some(url) = args.ollama_url {
        settings.llm.ollama_url = url;
        changed = true;
    }
    if let Some(url) = args.whisper_url {
        settings.transcription.server_url = Some(url);
        changed = true;
    }
    if let Some(model) = args.whisper_model {
        settings.transcription.model = Some(model);
        changed = true;
    }
    if let Some(language) = args.language {
        settings.transcription.language = if language.is_empty() {
            None
        } else {
            Some(language)
        };
        changed = true;
    }

    if changed {
        settings.save()?;
        println!("Settings saved");
    } else if !stored_key {
        print_settings(&settings, &secrets)?;
    }
    Ok(())
}

fn print_settings(settings: &Settings, secrets: &FileSecretStore) -> Result<()> {
    println!("LLM");
    println!("  provider:    {}", settings.llm.provider.display_name());
    println!(
        "  model:       {}",
        settings.resolve_model(&settings.llm.provider)
    );
    println!(
        "  prompt:      {}",
        if settings.llm.summary_prompt.is_some() {
            "custom"
        } else {
            "default"
        }
    );
    println!("  ollama url:  {}", settings.llm.ollama_url);
    for provider in LlmProvider::all() {
        if provider.requires_api_key() {
            let state = if secrets.get(provider.as_str())?.is_some() {
                "configured"
            } else if std::env::var(provider.api_key_env_var()).is_ok() {
                "from environment"
            } else {
                "not set"
            };
            println!("  {:<12} key {state}", provider.display_name());
        }
    }

    println!("Transcription");
    println!(
        "  server url:  {}",
        settings
            .transcription
            .server_url
            .as_deref()
            .unwrap_or("not set")
    );
    println!(
        "  model:       {}",
        settings
            .transcription
            .model
            .as_deref()
            .unwrap_or("default")
    );
    println!(
        "  language:    {}",
        settings
            .transcription
            .language
            .as_deref()
            .unwrap_or("auto")
    );
    Ok(())
}
