mod app;
mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "recap", version, about = "Record, transcribe and summarize audio")]
struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a new audio note from the default microphone
    Record {
        /// Title for the recording (defaults to a timestamp)
        #[arg(long)]
        title: Option<String>,
    },
    /// Import an existing audio file (mp3, m4a, wav, aac, aif, aiff)
    Import {
        /// Audio file to import
        file: PathBuf,
        /// Title for the recording (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
    },
    /// Transcribe a recording to text
    Transcribe {
        /// Recording id, id prefix, or list index
        id: String,
    },
    /// Generate an LLM summary for a transcribed recording
    Summarize {
        /// Recording id, id prefix, or list index
        id: String,
        /// LLM provider (openai, anthropic, gemini, mistral, ollama)
        #[arg(long)]
        provider: Option<String>,
        /// Model name (defaults to the configured or provider default)
        #[arg(long)]
        model: Option<String>,
    },
    /// List recordings
    List,
    /// Show a recording with its transcript and summary
    Show {
        /// Recording id, id prefix, or list index
        id: String,
    },
    /// Delete a recording and its audio file
    Delete {
        /// Recording id, id prefix, or list index
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Interactive configuration wizard
    Setup,
    /// Show or change configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    recap_core::set_verbose(cli.verbose);

    match cli.command {
        Command::Record { title } => commands::record::run(title).await,
        Command::Import { file, title } => commands::import::run(&file, title).await,
        Command::Transcribe { id } => commands::transcribe::run(&id).await,
        Command::Summarize {
            id,
            provider,
            model,
        } => commands::summarize::run(&id, provider, model).await,
        Command::List => commands::list::run(),
        Command::Show { id } => commands::show::run(&id),
        Command::Delete { id, yes } => commands::delete::run(&id, yes),
        Command::Setup => commands::setup::run(),
        Command::Config(args) => commands::config::run(args),
    }
}
