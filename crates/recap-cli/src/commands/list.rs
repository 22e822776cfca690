//! List recordings with their stage markers.

use anyhow::Result;

use crate::app;

pub fn run() -> Result<()> {
    let pipeline = app::build_pipeline()?;
    let recordings = pipeline.recordings();

    if recordings.is_empty() {
        println!("No recordings yet. Start with: recap record");
        return Ok(());
    }

    println!(
        "{:>3}  {:<30} {:<17} {:>9}  stages  id",
        "#", "title", "date", "duration"
    );
    for (index, recording) in recordings.iter().enumerate() {
        let date = recording
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M");
        let stages = format!(
            "{}{}",
            if recording.transcript_id.is_some() { "T" } else { "-" },
            if recording.summary_id.is_some() { "S" } else { "-" },
        );
        let mut title = recording.title.clone();
        if title.len() > 30 {
            title.truncate(27);
            title.push_str("...");
        }
        println!(
            "{:>3}  {:<30} {:<17} {:>9}  {:<6}  {}",
            index + 1,
            title,
            date,
            app::format_duration(recording.duration_secs),
            stages,
            recording.id,
        );
    }
    Ok(())
}
