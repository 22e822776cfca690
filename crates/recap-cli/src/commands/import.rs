//! Import an external audio file.

use std::path::Path;

use anyhow::Result;

use crate::app;

pub async fn run(file: &Path, title: Option<String>) -> Result<()> {
    let pipeline = app::build_pipeline()?;

    // Default title: file name without extension
    let title = title.unwrap_or_else(|| {
        file.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("import")
            .to_string()
    });

    let recording = pipeline.import(file, &title).await?;
    println!(
        "Imported '{}' ({})",
        recording.title,
        app::format_duration(recording.duration_secs)
    );
    println!("  id: {}", recording.id);
    Ok(())
}
