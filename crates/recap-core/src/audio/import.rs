//! Importing external audio files.
//!
//! An import copies the source file into the storage audio dir, probes its
//! duration and produces a [`Recording`]. WAV durations come straight from
//! the header via `hound`; everything else shells out to `ffprobe`. A failed
//! duration probe removes the copied file again so imports are all-or-
//! nothing.

use std::path::Path;

use thiserror::Error;

use crate::model::Recording;

/// Importable audio formats, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "aac", "aif", "aiff"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported audio format: .{0}")]
    UnsupportedFormat(String),
    #[error("failed to copy audio file: {0}")]
    CopyFailed(#[source] std::io::Error),
    #[error("could not determine audio duration")]
    DurationUnavailable,
}

/// Whether the file's extension is on the import allow-list.
pub fn is_format_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Import an external audio file into `audio_dir` under the given title.
pub async fn import_audio(
    source: &Path,
    title: &str,
    audio_dir: &Path,
) -> Result<Recording, ImportError> {
    if !is_format_supported(source) {
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();
        return Err(ImportError::UnsupportedFormat(extension));
    }
    let extension = source
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let destination = audio_dir.join(format!(
        "{}_{}.{}",
        sanitize_title(title),
        chrono::Utc::now().timestamp(),
        extension
    ));

    tokio::fs::copy(source, &destination)
        .await
        .map_err(ImportError::CopyFailed)?;

    let probe_path = destination.clone();
    let duration = tokio::task::spawn_blocking(move || probe_duration(&probe_path))
        .await
        .ok()
        .flatten();

    match duration {
        Some(duration_secs) => Ok(Recording::new(title, duration_secs, destination)),
        None => {
            // Roll the copy back so a broken file doesn't linger
            let _ = tokio::fs::remove_file(&destination).await;
            Err(ImportError::DurationUnavailable)
        }
    }
}

/// Probe the duration of an audio file in seconds.
///
/// WAV files are read directly; other formats go through `ffprobe`.
pub fn probe_duration(path: &Path) -> Option<f64> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if extension.as_deref() == Some("wav") {
        let reader = hound::WavReader::open(path).ok()?;
        let spec = reader.spec();
        return Some(reader.duration() as f64 / spec.sample_rate as f64);
    }

    probe_duration_ffprobe(path)
}

fn probe_duration_ffprobe(path: &Path) -> Option<f64> {
    let output = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        crate::verbose!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|duration| *duration >= 0.0)
}

/// Reduce a user-supplied title to a filename-safe stem.
pub(crate) fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "recording".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, seconds: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(8000 * seconds) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn format_check_is_case_insensitive() {
        assert!(is_format_supported(Path::new("lecture.MP3")));
        assert!(is_format_supported(Path::new("lecture.aiff")));
        assert!(!is_format_supported(Path::new("lecture.ogg")));
        assert!(!is_format_supported(Path::new("lecture")));
    }

    #[tokio::test]
    async fn unsupported_format_is_rejected_before_copying() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "not audio").unwrap();

        let err = import_audio(&source, "notes", dir.path()).await.unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[tokio::test]
    async fn missing_source_is_a_copy_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_audio(Path::new("/nonexistent/talk.mp3"), "talk", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::CopyFailed(_)));
    }

    #[tokio::test]
    async fn wav_import_produces_recording_with_duration() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("talk.wav");
        write_wav(&source, 2);

        let audio_dir = dir.path().join("audio");
        std::fs::create_dir_all(&audio_dir).unwrap();

        let recording = import_audio(&source, "talk", &audio_dir).await.unwrap();
        assert_eq!(recording.title, "talk");
        assert!((recording.duration_secs - 2.0).abs() < 0.01);
        assert!(recording.audio_path.exists());
        assert!(recording.audio_path.starts_with(&audio_dir));
    }

    #[tokio::test]
    async fn failed_probe_removes_the_copied_file() {
        let dir = tempfile::tempdir().unwrap();
        // A .wav that is not actually a WAV file fails the hound probe
        let source = dir.path().join("fake.wav");
        std::fs::write(&source, "definitely not audio").unwrap();

        let audio_dir = dir.path().join("audio");
        std::fs::create_dir_all(&audio_dir).unwrap();

        let err = import_audio(&source, "fake", &audio_dir).await.unwrap_err();
        assert!(matches!(err, ImportError::DurationUnavailable));
        assert_eq!(std::fs::read_dir(&audio_dir).unwrap().count(), 0);
    }

    #[test]
    fn titles_are_made_filename_safe() {
        assert_eq!(sanitize_title("Weekly Sync 3/7"), "Weekly_Sync_3_7");
        assert_eq!(sanitize_title(""), "recording");
        assert_eq!(sanitize_title("ok-name_2"), "ok-name_2");
    }
}
