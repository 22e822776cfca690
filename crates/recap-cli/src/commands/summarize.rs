//! Generate an LLM summary for a transcribed recording.

use anyhow::{Context, Result, anyhow};
use recap_core::{LlmProvider, PipelineError};

use crate::app;

pub async fn run(id: &str, provider: Option<String>, model: Option<String>) -> Result<()> {
    let pipeline = app::build_pipeline()?;
    let recording = app::resolve_recording(&pipeline, id)?;

    let provider: LlmProvider = match provider {
        Some(name) => name.parse().map_err(|err: String| anyhow!(err))?,
        None => pipeline.settings().llm.provider.clone(),
    };
    let model = model.unwrap_or_else(|| pipeline.settings().resolve_model(&provider));

    // Caller-side readiness check: the transcript must be terminal and
    // non-empty before a summary job may consume it
    let transcript = match pipeline.summary_input(recording.id) {
        Ok(transcript) => transcript,
        Err(PipelineError::NotFound) => {
            return Err(anyhow!(
                "'{}' has no transcript yet. Run: recap transcribe {id}",
                recording.title
            ));
        }
        Err(PipelineError::TranscriptNotReady) => {
            return Err(anyhow!(
                "transcript for '{}' is still processing or empty. Retry transcription first",
                recording.title
            ));
        }
        Err(err) => return Err(err.into()),
    };

    println!(
        "Summarizing '{}' with {} ({model})",
        recording.title,
        provider.display_name()
    );
    let handle = pipeline.begin_summary(&transcript, provider, &model)?;
    let printer = tokio::spawn(app::watch_progress(handle.progress(), "summarizing"));

    let result = handle.wait().await;
    let _ = printer.await;
    result.context("summary generation failed")?;

    let summary = pipeline.load_summary(recording.id)?;
    println!("{}", summary.text);
    Ok(())
}
