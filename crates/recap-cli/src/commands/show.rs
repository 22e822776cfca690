//! Show one recording with its transcript and summary.

use anyhow::Result;
use recap_core::{DocumentStatus, PipelineError};

use crate::app;

pub fn run(id: &str) -> Result<()> {
    let pipeline = app::build_pipeline()?;
    let recording = app::resolve_recording(&pipeline, id)?;

    println!("{}", recording.title);
    println!("  id:       {}", recording.id);
    println!(
        "  date:     {}",
        recording
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    );
    println!(
        "  duration: {}",
        app::format_duration(recording.duration_secs)
    );
    println!("  audio:    {}", recording.audio_path.display());

    println!();
    match pipeline.load_transcript(recording.id) {
        Ok(transcript) => match transcript.status {
            DocumentStatus::Pending => println!("Transcript: still processing"),
            DocumentStatus::Failed => println!("Transcript: failed. Retry with: recap transcribe {id}"),
            DocumentStatus::Ready => {
                println!("Transcript:");
                println!("{}", transcript.text);
            }
        },
        Err(PipelineError::NotFound) => {
            println!("Transcript: none. Create with: recap transcribe {id}")
        }
        Err(err) => return Err(err.into()),
    }

    println!();
    match pipeline.load_summary(recording.id) {
        Ok(summary) => match summary.status {
            DocumentStatus::Pending => println!("Summary ({}): still processing", summary.llm_label),
            DocumentStatus::Failed => {
                println!(
                    "Summary ({}): failed. Retry with: recap summarize {id}",
                    summary.llm_label
                )
            }
            DocumentStatus::Ready => {
                println!("Summary ({}):", summary.llm_label);
                println!("{}", summary.text);
            }
        },
        Err(PipelineError::NotFound) => {
            println!("Summary: none. Create with: recap summarize {id}")
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
