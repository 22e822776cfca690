//! Capture a new recording from the default microphone.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use recap_core::{AudioRecorder, RecordingState};

use crate::app;

pub async fn run(title: Option<String>) -> Result<()> {
    let pipeline = app::build_pipeline()?;
    let title =
        title.unwrap_or_else(|| chrono::Local::now().format("recording_%Y-%m-%d_%H%M").to_string());

    let mut recorder = AudioRecorder::new();
    recorder.start(&title)?;
    println!("Recording '{title}'");
    println!("  [space] pause/resume   [enter] stop");

    control_loop(&mut recorder)?;

    let recording = recorder.stop(&pipeline.audio_dir())?;
    println!(
        "Saved '{}' ({})",
        recording.title,
        app::format_duration(recording.duration_secs)
    );
    pipeline.add_recording(recording)?;
    Ok(())
}

/// Read keypresses until Enter stops the recording. Space toggles pause.
fn control_loop(recorder: &mut AudioRecorder) -> Result<()> {
    enable_raw_mode()?;

    let result = (|| -> Result<()> {
        loop {
            if let Event::Key(key_event) = event::read()? {
                match key_event.code {
                    KeyCode::Enter => break,
                    KeyCode::Char(' ') => {
                        if recorder.state() == RecordingState::Paused {
                            recorder.resume();
                            eprint!("\r  recording ({})", app::format_duration(recorder.elapsed_secs()));
                        } else {
                            recorder.pause();
                            eprint!("\r  paused    ({})", app::format_duration(recorder.elapsed_secs()));
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    })();

    // Restore normal mode even when the loop errored
    disable_raw_mode()?;
    eprintln!();
    result
}
