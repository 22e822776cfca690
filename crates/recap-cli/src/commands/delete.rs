//! Delete a recording and its backing audio file.

use anyhow::Result;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::app;

pub fn run(id: &str, yes: bool) -> Result<()> {
    let pipeline = app::build_pipeline()?;
    let recording = app::resolve_recording(&pipeline, id)?;

    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete '{}' and its audio file?",
                recording.title
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    pipeline.delete_recording(recording.id)?;
    println!("Deleted '{}'", recording.title);
    Ok(())
}
