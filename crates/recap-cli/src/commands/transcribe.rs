//! Transcribe a recording to text.

use anyhow::{Context, Result};

use crate::app;

pub async fn run(id: &str) -> Result<()> {
    let pipeline = app::build_pipeline()?;
    let recording = app::resolve_recording(&pipeline, id)?;

    println!("Transcribing '{}'", recording.title);
    let handle = pipeline.begin_transcription(recording.id)?;
    let printer = tokio::spawn(app::watch_progress(handle.progress(), "transcribing"));

    let result = handle.wait().await;
    let _ = printer.await;
    result.context("transcription failed")?;

    let transcript = pipeline.load_transcript(recording.id)?;
    println!("{}", transcript.text);
    Ok(())
}
