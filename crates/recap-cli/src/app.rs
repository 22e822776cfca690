//! Shared CLI plumbing: pipeline construction, recording lookup, progress
//! display.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use recap_core::{
    FileSecretStore, LlmClient, Pipeline, Recording, SecretStore, Settings, Storage,
    WhisperApiEngine,
};
use uuid::Uuid;

/// Build the pipeline from persisted settings and load the recording index.
pub fn build_pipeline() -> Result<Arc<Pipeline>> {
    let settings = Settings::load();

    let base = settings
        .storage_dir
        .clone()
        .or_else(Storage::default_dir)
        .context("could not determine data directory")?;
    let storage = Storage::new(base).context("failed to open storage")?;

    let secrets_path =
        FileSecretStore::default_path().context("could not determine config directory")?;
    let secrets: Arc<dyn SecretStore> = Arc::new(FileSecretStore::new(secrets_path));

    let engine = Arc::new(WhisperApiEngine::from_settings(&settings.transcription));
    let client = Arc::new(LlmClient::new(
        Arc::clone(&secrets),
        settings.llm.ollama_url.clone(),
    ));

    let pipeline = Arc::new(Pipeline::new(storage, engine, client, settings));
    pipeline.load().context("failed to load recordings")?;
    Ok(pipeline)
}

/// Resolve a user-supplied recording reference: a 1-based index from
/// `recap list`, a full UUID, or a unique id prefix.
pub fn resolve_recording(pipeline: &Arc<Pipeline>, reference: &str) -> Result<Recording> {
    let recordings = pipeline.recordings();
    if recordings.is_empty() {
        return Err(anyhow!("no recordings yet, record or import one first"));
    }

    if let Ok(index) = reference.parse::<usize>() {
        return recordings
            .get(index.checked_sub(1).unwrap_or(usize::MAX))
            .cloned()
            .ok_or_else(|| anyhow!("no recording at index {index} (see: recap list)"));
    }

    if let Ok(id) = Uuid::parse_str(reference) {
        return recordings
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("no recording with id {id}"));
    }

    let matches: Vec<&Recording> = recordings
        .iter()
        .filter(|r| r.id.to_string().starts_with(&reference.to_lowercase()))
        .collect();
    match matches.as_slice() {
        [one] => Ok((*one).clone()),
        [] => Err(anyhow!("no recording matches '{reference}' (see: recap list)")),
        _ => Err(anyhow!("'{reference}' is ambiguous, use more characters")),
    }
}

/// Render a job's progress fraction as an in-place percentage line until the
/// job reaches a terminal state.
pub async fn watch_progress(mut rx: tokio::sync::watch::Receiver<f32>, label: &'static str) {
    loop {
        let percent = (*rx.borrow_and_update() * 100.0).round() as u32;
        eprint!("\r  {label} {percent:3}%");
        let _ = std::io::stderr().flush();
        if rx.changed().await.is_err() {
            break;
        }
    }
    eprintln!();
}

/// Format a duration in seconds as mm:ss or hh:mm:ss.
pub fn format_duration(duration_secs: f64) -> String {
    let total = duration_secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = total / 60 % 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats_with_and_without_hours() {
        assert_eq!(format_duration(0.0), "00:00");
        assert_eq!(format_duration(65.4), "01:05");
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(-3.0), "00:00");
    }
}
